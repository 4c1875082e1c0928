//! Provider modules.
//!
//! A [`Module`] groups providers that belong together so they can be
//! registered at once via
//! [`InjectorBuilder::add_module`](crate::InjectorBuilder::add_module).
//!
//! # Example
//!
//! ```
//! use component_store_di::{Injector, Module, Provider, Token};
//!
//! struct Greeting(&'static str);
//!
//! struct GreetingModule;
//!
//! impl Module for GreetingModule {
//!     fn providers(&self) -> Vec<Provider> {
//!         vec![Provider::value(Token::of::<Greeting>(), Greeting("hello"))]
//!     }
//! }
//!
//! let injector = Injector::builder()
//!     .add_module(GreetingModule)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(injector.get::<Greeting>().unwrap().0, "hello");
//! ```

use core::any::TypeId;

use crate::provider::Provider;

/// Unique identifier for a module type.
///
/// Used for duplicate detection. Based on [`TypeId`], so each module type
/// has exactly one `ModuleId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ModuleId {
    /// Creates a `ModuleId` for the given module type.
    #[must_use]
    pub fn of<M: Module>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: core::any::type_name::<M>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A named group of providers.
pub trait Module: Send + Sync + 'static {
    /// Returns the providers this module registers, in order.
    fn providers(&self) -> Vec<Provider>;

    /// Returns the module's name for logging.
    ///
    /// Defaults to the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Whether adding this module twice to the same builder is an error.
    ///
    /// Defaults to `true`.
    fn is_unique(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Module for Empty {
        fn providers(&self) -> Vec<Provider> {
            Vec::new()
        }
    }

    #[test]
    fn module_id_uses_type_name() {
        let id = ModuleId::of::<Empty>();
        assert!(id.type_name().ends_with("Empty"));
        assert_eq!(id.type_id(), TypeId::of::<Empty>());
        assert!(Empty.name().ends_with("Empty"));
    }
}
