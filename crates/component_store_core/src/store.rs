//! Component store state containers.
//!
//! [`ComponentStore`] holds a piece of state and exposes it as a
//! [`StateStream`]. Application stores embed one and implement [`Store`]
//! to hand it out, which is all
//! [`provide_component_store`](crate::provide_component_store) needs.
//!
//! State can be initialized at construction ([`ComponentStore::new`]) or
//! later ([`ComponentStore::uninitialized`] + [`ComponentStore::set_state`]).
//! The first snapshot is what triggers [`OnStateInit`](crate::OnStateInit).

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use component_store_di::{Injectable, InjectorError, Resolver};

use crate::hooks::{LifecycleHooks, is_on_state_init_defined, is_on_store_init_defined};
use crate::state::StateStream;

/// Initial state for [`ComponentStore`]s constructed by an injector.
///
/// Register it with `Provider::value(Token::of::<InitialState<S>>(), ...)`.
/// Without it, an injected `ComponentStore<S>` starts uninitialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState<S>(pub S);

/// A state container exposing a replaying stream of its state.
///
/// Dropping the store completes its state stream.
///
/// # Example
///
/// ```
/// use component_store_core::ComponentStore;
///
/// #[derive(Debug, PartialEq)]
/// struct Counter { value: u32 }
///
/// let store = ComponentStore::uninitialized();
/// assert!(!store.is_initialized());
///
/// store.set_state(Counter { value: 1 });
/// assert_eq!(store.state().as_deref(), Some(&Counter { value: 1 }));
/// ```
pub struct ComponentStore<S: Send + Sync + 'static> {
    state: StateStream<S>,
    /// Crate-private setter; outside this crate only the providers from
    /// `provide_component_store` can set it.
    di_provided: AtomicBool,
}

impl<S: Send + Sync + 'static> ComponentStore<S> {
    /// Creates a store whose state is initialized to `initial`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            state: StateStream::with_value(initial),
            di_provided: AtomicBool::new(false),
        }
    }

    /// Creates a store whose state will be initialized later.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            state: StateStream::new(),
            di_provided: AtomicBool::new(false),
        }
    }

    /// Replaces the state, initializing it if needed.
    pub fn set_state(&self, state: S) {
        self.state.emit(state);
    }

    /// Returns the current state snapshot, if initialized.
    #[must_use]
    pub fn state(&self) -> Option<Arc<S>> {
        self.state.latest()
    }

    /// Returns `true` once the state has been set.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.latest().is_some()
    }

    /// Returns the stream of state snapshots.
    #[must_use]
    pub fn state_stream(&self) -> &StateStream<S> {
        &self.state
    }

    /// Returns `true` if this store was resolved through
    /// [`provide_component_store`](crate::provide_component_store).
    #[must_use]
    pub fn is_di_provided(&self) -> bool {
        self.di_provided.load(Ordering::Acquire)
    }

    /// Sets the DI-provided marker, returning `false` if it was already set.
    pub(crate) fn mark_di_provided(&self) -> bool {
        !self.di_provided.swap(true, Ordering::AcqRel)
    }
}

impl<S: Send + Sync + 'static> Drop for ComponentStore<S> {
    fn drop(&mut self) {
        self.state.complete();
    }
}

impl<S: Send + Sync + 'static> core::fmt::Debug for ComponentStore<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("state", &core::any::type_name::<S>())
            .field("initialized", &self.is_initialized())
            .field("di_provided", &self.is_di_provided())
            .finish()
    }
}

impl<S: Send + Sync + 'static> LifecycleHooks for ComponentStore<S> {}

impl<S: Clone + Send + Sync + 'static> Injectable for ComponentStore<S> {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
        match resolver.get::<InitialState<S>>() {
            Ok(initial) => Ok(Self::new(initial.0.clone())),
            Err(InjectorError::NotProvided { .. }) => Ok(Self::uninitialized()),
            Err(err) => Err(err),
        }
    }
}

/// A type that owns a [`ComponentStore`] and may define lifecycle hooks.
pub trait Store: LifecycleHooks + Send + Sync + 'static {
    /// The state held by the store.
    type State: Send + Sync + 'static;

    /// Returns the underlying component store.
    fn component_store(&self) -> &ComponentStore<Self::State>;
}

impl<S: Send + Sync + 'static> Store for ComponentStore<S> {
    type State = S;

    fn component_store(&self) -> &ComponentStore<S> {
        self
    }
}

/// Warns when `store` defines lifecycle hooks but was not resolved through
/// [`provide_component_store`](crate::provide_component_store), in which
/// case the hooks never run.
///
/// Returns `true` if the warning was emitted.
pub fn check_provider_for_hooks<T: Store + ?Sized>(store: &T) -> bool {
    let has_hooks = is_on_store_init_defined(store) || is_on_state_init_defined(store);
    if !has_hooks || store.component_store().is_di_provided() {
        return false;
    }

    tracing::warn!(
        store = core::any::type_name::<T>(),
        "store defines lifecycle hooks but was not registered with provide_component_store; \
         hooks will not run"
    );
    true
}
