//! Component stores with dependency-injected lifecycle hooks.
//!
//! `component_store_core` provides:
//!
//! - [`StateStream`] - Replaying multicast stream of state snapshots
//! - [`ComponentStore`] - State container exposing a [`StateStream`]
//! - [`OnStoreInit`] / [`OnStateInit`] - Optional lifecycle hooks
//! - [`LifecycleHooks`] - Capability query for those hooks
//! - [`provide_component_store`] - Providers that run the hooks on resolution
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use component_store_core::{
//!     ComponentStore, OnStateInit, OnStoreInit, Store, lifecycle_hooks, provide_component_store,
//! };
//! use component_store_di::{Injectable, Injector, InjectorError, Resolver};
//!
//! struct SearchStore {
//!     store: ComponentStore<String>,
//!     log: Mutex<Vec<&'static str>>,
//! }
//!
//! impl Injectable for SearchStore {
//!     fn inject(_resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
//!         Ok(Self { store: ComponentStore::uninitialized(), log: Mutex::new(Vec::new()) })
//!     }
//! }
//!
//! impl OnStoreInit for SearchStore {
//!     fn on_store_init(&self) { self.log.lock().push("store"); }
//! }
//!
//! impl OnStateInit for SearchStore {
//!     fn on_state_init(&self) { self.log.lock().push("state"); }
//! }
//!
//! lifecycle_hooks!(SearchStore: OnStoreInit, OnStateInit);
//!
//! impl Store for SearchStore {
//!     type State = String;
//!     fn component_store(&self) -> &ComponentStore<String> { &self.store }
//! }
//!
//! let injector = Injector::new(provide_component_store::<SearchStore>());
//! let search = injector.get::<SearchStore>().unwrap();
//! assert_eq!(*search.log.lock(), vec!["store"]);
//!
//! search.store.set_state("rust".to_owned());
//! assert_eq!(*search.log.lock(), vec!["store", "state"]);
//! ```

mod hooks;
mod provide;
mod state;
mod store;

pub use hooks::{
    LifecycleHooks, OnStateInit, OnStoreInit, is_on_state_init_defined, is_on_store_init_defined,
    on_state_init_hook, on_store_init_hook,
};
pub use provide::{ComponentStoreModule, provide_component_store};
pub use state::{Listen, StateStream, StreamError, StreamEvent, Subscription};
pub use store::{ComponentStore, InitialState, Store, check_provider_for_hooks};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::{
        ComponentStore, ComponentStoreModule, InitialState, LifecycleHooks, OnStateInit,
        OnStoreInit, StateStream, Store, lifecycle_hooks, provide_component_store,
    };
}
