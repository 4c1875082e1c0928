//! Provider registration for component stores.
//!
//! [`provide_component_store`] returns the two providers that make an
//! injector run a store's lifecycle hooks:
//!
//! ```text
//! Token::unique("<T> (raw)")  ── class ──▶  T::inject(...)
//! Token::of::<T>()            ── factory ─▶ resolve raw
//!                                           mark DI-provided
//!                                           on_store_init()
//!                                           first(state) → on_state_init()
//! ```
//!
//! The private token keeps the raw construction separate from the public
//! one so the factory can intercept the instance before anyone else sees
//! it. A new private token is generated on every call, so registering the
//! same store in several injectors never collides.

use core::marker::PhantomData;
use std::sync::Arc;

use component_store_di::{Injectable, Module, Provider, Token};

use crate::hooks::{on_state_init_hook, on_store_init_hook};
use crate::store::Store;

/// Returns the providers that register `T` with lifecycle hooks enabled.
///
/// Resolving `T` from an injector holding these providers:
///
/// 1. constructs `T` through [`Injectable::inject`],
/// 2. marks its [`ComponentStore`](crate::ComponentStore) as DI-provided
///    (steps 3 and 4 only run for the resolution that sets the marker),
/// 3. calls [`OnStoreInit::on_store_init`](crate::OnStoreInit) if defined,
/// 4. if [`OnStateInit`](crate::OnStateInit) is defined, calls it on the
///    first state snapshot. For a store created with initial state this
///    happens before resolution returns; otherwise it happens when the
///    state is first set.
///
/// # Example
///
/// ```
/// use core::sync::atomic::{AtomicBool, Ordering};
/// use component_store_core::{
///     ComponentStore, OnStoreInit, Store, lifecycle_hooks, provide_component_store,
/// };
/// use component_store_di::{Injectable, Injector, InjectorError, Resolver};
///
/// struct TodoStore {
///     store: ComponentStore<Vec<String>>,
///     ready: AtomicBool,
/// }
///
/// impl Injectable for TodoStore {
///     fn inject(_resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
///         Ok(Self { store: ComponentStore::new(Vec::new()), ready: AtomicBool::new(false) })
///     }
/// }
///
/// impl OnStoreInit for TodoStore {
///     fn on_store_init(&self) {
///         self.ready.store(true, Ordering::SeqCst);
///     }
/// }
///
/// lifecycle_hooks!(TodoStore: OnStoreInit);
///
/// impl Store for TodoStore {
///     type State = Vec<String>;
///     fn component_store(&self) -> &ComponentStore<Vec<String>> { &self.store }
/// }
///
/// let injector = Injector::new(provide_component_store::<TodoStore>());
/// let todos = injector.get::<TodoStore>().unwrap();
///
/// assert!(todos.ready.load(Ordering::SeqCst));
/// assert!(todos.store.is_di_provided());
/// ```
#[must_use]
pub fn provide_component_store<T: Store + Injectable>() -> [Provider; 2] {
    let store_name = core::any::type_name::<T>();
    let raw = Token::unique(format!("{store_name} (raw)"));
    tracing::debug!(store = store_name, token = %raw, "providing component store");

    let raw_provider = Provider::class::<T>(raw.clone());
    let public_provider = Provider::factory(Token::of::<T>(), move |resolver| {
        let instance = resolver.get_token::<T>(&raw)?;
        // Concurrent resolutions can both reach this point with the same
        // cached instance; only the first runs the hooks.
        if !instance.component_store().mark_di_provided() {
            tracing::trace!(store = store_name, "lifecycle hooks already dispatched");
            return Ok(instance);
        }

        if let Some(hook) = on_store_init_hook(&*instance) {
            tracing::trace!(store = store_name, "running on_store_init");
            hook.on_store_init();
        }

        if on_state_init_hook(&*instance).is_some() {
            let weak = Arc::downgrade(&instance);
            instance.component_store().state_stream().first(
                move |_state| {
                    let Some(instance) = weak.upgrade() else {
                        return;
                    };
                    if let Some(hook) = on_state_init_hook(&*instance) {
                        tracing::trace!(store = store_name, "running on_state_init");
                        hook.on_state_init();
                    }
                },
                move |error| {
                    tracing::error!(
                        store = store_name,
                        %error,
                        "state stream failed before state was initialized"
                    );
                },
            );
        }

        Ok(instance)
    });

    [raw_provider, public_provider]
}

/// A [`Module`] registering a single component store.
///
/// Equivalent to `provide_all(provide_component_store::<T>())`.
pub struct ComponentStoreModule<T>(PhantomData<fn() -> T>);

impl<T> ComponentStoreModule<T> {
    /// Creates the module.
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ComponentStoreModule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Store + Injectable> Module for ComponentStoreModule<T> {
    fn providers(&self) -> Vec<Provider> {
        provide_component_store::<T>().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComponentStore;
    use component_store_di::{Injector, ProviderKind};

    #[test]
    fn returns_class_then_factory() {
        let [raw, public] = provide_component_store::<ComponentStore<u8>>();

        assert_eq!(raw.kind(), ProviderKind::Class);
        assert!(raw.token().is_unique());
        assert_eq!(public.kind(), ProviderKind::Factory);
        assert_eq!(public.token(), &Token::of::<ComponentStore<u8>>());
    }

    #[test]
    fn private_token_differs_per_call() {
        let [first, _] = provide_component_store::<ComponentStore<u8>>();
        let [second, _] = provide_component_store::<ComponentStore<u8>>();
        assert_ne!(first.token(), second.token());
    }

    #[test]
    fn public_and_raw_tokens_share_the_instance() {
        let providers = provide_component_store::<ComponentStore<u8>>();
        let raw = providers[0].token().clone();
        let injector = Injector::new(providers);

        let public = injector.get::<ComponentStore<u8>>().unwrap();
        let private = injector.get_token::<ComponentStore<u8>>(&raw).unwrap();

        assert!(Arc::ptr_eq(&public, &private));
        assert!(public.is_di_provided());
    }

    #[test]
    fn module_registers_both_providers() {
        let injector = Injector::builder()
            .add_module(ComponentStoreModule::<ComponentStore<u8>>::new())
            .build()
            .unwrap();

        assert_eq!(injector.provider_count(), 2);
        assert!(injector.get::<ComponentStore<u8>>().unwrap().is_di_provided());
    }
}
