//! Component stores with lifecycle hooks wired through dependency injection.
//!
//! - [`di`] - Tokens, providers, modules and injectors
//! - [`store`] - State streams, component stores and lifecycle hooks

/// Token-keyed dependency injection.
pub use component_store_di as di;

/// Component stores and lifecycle hooks.
pub use component_store_core as store;

pub use component_store_core::{lifecycle_hooks, provide_component_store};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use component_store_core::prelude::*;
    pub use component_store_di::prelude::*;
}
