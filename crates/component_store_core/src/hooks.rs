//! Lifecycle hook capabilities.
//!
//! Stores opt into two independent hooks:
//!
//! | Hook | Runs |
//! |------|------|
//! | [`OnStoreInit`] | Once, right after the injector constructs the store |
//! | [`OnStateInit`] | Once, when the store's state stream produces its first snapshot |
//!
//! There is no base trait requiring both. Whether a value has a hook is
//! answered by [`LifecycleHooks`], a capability query that any type can
//! implement, usually through [`lifecycle_hooks!`](crate::lifecycle_hooks).
//!
//! # Example
//!
//! ```
//! use component_store_core::{
//!     OnStoreInit, is_on_state_init_defined, is_on_store_init_defined, lifecycle_hooks,
//! };
//!
//! struct Audit;
//!
//! impl OnStoreInit for Audit {
//!     fn on_store_init(&self) {}
//! }
//!
//! lifecycle_hooks!(Audit: OnStoreInit);
//!
//! assert!(is_on_store_init_defined(&Audit));
//! assert!(!is_on_state_init_defined(&Audit));
//! ```

/// Hook invoked once the injector has constructed the store.
pub trait OnStoreInit {
    /// Called synchronously during resolution, before the store is returned.
    fn on_store_init(&self);
}

/// Hook invoked once the store's state has been initialized.
pub trait OnStateInit {
    /// Called on the first snapshot the state stream produces.
    fn on_state_init(&self);
}

/// Capability query for the optional lifecycle hooks.
///
/// Both methods default to `None`. Override the ones whose hook trait the
/// type implements, or let [`lifecycle_hooks!`](crate::lifecycle_hooks)
/// do it.
pub trait LifecycleHooks {
    /// Returns `self` as an [`OnStoreInit`] if the type has that hook.
    fn as_on_store_init(&self) -> Option<&dyn OnStoreInit> {
        None
    }

    /// Returns `self` as an [`OnStateInit`] if the type has that hook.
    fn as_on_state_init(&self) -> Option<&dyn OnStateInit> {
        None
    }
}

/// Returns `true` if `candidate` exposes an [`OnStoreInit`] hook.
pub fn is_on_store_init_defined<T: LifecycleHooks + ?Sized>(candidate: &T) -> bool {
    candidate.as_on_store_init().is_some()
}

/// Returns `true` if `candidate` exposes an [`OnStateInit`] hook.
pub fn is_on_state_init_defined<T: LifecycleHooks + ?Sized>(candidate: &T) -> bool {
    candidate.as_on_state_init().is_some()
}

/// Returns `candidate` narrowed to its [`OnStoreInit`] hook, if it has one.
pub fn on_store_init_hook<T: LifecycleHooks + ?Sized>(candidate: &T) -> Option<&dyn OnStoreInit> {
    candidate.as_on_store_init()
}

/// Returns `candidate` narrowed to its [`OnStateInit`] hook, if it has one.
pub fn on_state_init_hook<T: LifecycleHooks + ?Sized>(candidate: &T) -> Option<&dyn OnStateInit> {
    candidate.as_on_state_init()
}

/// Implements [`LifecycleHooks`] for a type from the hook traits it implements.
///
/// ```
/// use component_store_core::{OnStateInit, OnStoreInit, lifecycle_hooks};
///
/// struct Plain;
/// lifecycle_hooks!(Plain);
///
/// struct Both;
/// impl OnStoreInit for Both { fn on_store_init(&self) {} }
/// impl OnStateInit for Both { fn on_state_init(&self) {} }
/// lifecycle_hooks!(Both: OnStoreInit, OnStateInit);
/// ```
///
/// Generic types need a hand-written impl.
#[macro_export]
macro_rules! lifecycle_hooks {
    ($ty:ty) => {
        impl $crate::LifecycleHooks for $ty {}
    };
    ($ty:ty: $($hook:ident),+ $(,)?) => {
        impl $crate::LifecycleHooks for $ty {
            $($crate::__lifecycle_hook_method!($hook);)+
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __lifecycle_hook_method {
    (OnStoreInit) => {
        fn as_on_store_init(&self) -> Option<&dyn $crate::OnStoreInit> {
            Some(self)
        }
    };
    (OnStateInit) => {
        fn as_on_state_init(&self) -> Option<&dyn $crate::OnStateInit> {
            Some(self)
        }
    };
}
