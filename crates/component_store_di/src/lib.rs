//! Token-keyed dependency injection for component stores.
//!
//! `component_store_di` provides the registration and resolution primitives
//! that component stores are wired through:
//!
//! - [`Token`] - Opaque registration keys (per-type or freshly generated)
//! - [`Provider`] - Directives binding a token to a construction strategy
//! - [`Injectable`] - Types the injector can construct on its own
//! - [`Module`] - Named groups of providers
//! - [`Injector`] - Hierarchical resolver with a per-injector instance cache
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use component_store_di::{Injectable, Injector, InjectorError, Provider, Resolver, Token};
//!
//! struct Database { url: String }
//!
//! struct Repository { db: Arc<Database> }
//!
//! impl Injectable for Repository {
//!     fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
//!         Ok(Self { db: resolver.get::<Database>()? })
//!     }
//! }
//!
//! let root = Arc::new(Injector::new([
//!     Provider::value(Token::of::<Database>(), Database { url: "postgres://localhost".into() }),
//! ]));
//!
//! let scope = root
//!     .child()
//!     .provide(Provider::class::<Repository>(Token::of::<Repository>()))
//!     .build()
//!     .unwrap();
//!
//! let repo = scope.get::<Repository>().unwrap();
//! assert_eq!(repo.db.url, "postgres://localhost");
//! ```

mod error;
mod injector;
mod module;
mod provider;
mod token;

pub use error::{BoxError, InjectorError};
pub use injector::{Injector, InjectorBuilder, Resolver};
pub use module::{Module, ModuleId};
pub use provider::{Injectable, Provider, ProviderKind};
pub use token::Token;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::{Injectable, Injector, InjectorError, Module, Provider, Resolver, Token};
}
