//! Provider directives.
//!
//! A [`Provider`] tells an [`Injector`](crate::Injector) how to supply the
//! value for one [`Token`]:
//!
//! - [`Provider::class`] - construct through [`Injectable::inject`]
//! - [`Provider::factory`] - call a closure with a [`Resolver`]
//! - [`Provider::value`] - hand out a pre-built shared instance
//! - [`Provider::existing`] - alias another token
//!
//! Class and factory results are cached per injector, so every token maps
//! to at most one instance within a given injector.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use crate::error::InjectorError;
use crate::injector::Resolver;
use crate::token::Token;

/// Type-erased shared instance.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased construction closure.
type ConstructFn = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance, InjectorError> + Send + Sync>;

/// A type the injector can construct on its own.
///
/// This is the "class provider" contract: dependencies are pulled from the
/// [`Resolver`], which resolves them recursively.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use component_store_di::{Injectable, Injector, InjectorError, Provider, Resolver, Token};
///
/// struct Endpoint(String);
///
/// struct Client {
///     endpoint: Arc<Endpoint>,
/// }
///
/// impl Injectable for Client {
///     fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError> {
///         Ok(Self { endpoint: resolver.get::<Endpoint>()? })
///     }
/// }
///
/// let injector = Injector::new([
///     Provider::value(Token::of::<Endpoint>(), Endpoint("https://example.test".into())),
///     Provider::class::<Client>(Token::of::<Client>()),
/// ]);
///
/// let client = injector.get::<Client>().unwrap();
/// assert_eq!(client.endpoint.0, "https://example.test");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Creates an instance, resolving dependencies through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency cannot be resolved or construction
    /// otherwise fails.
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectorError>;
}

/// The kind of strategy a provider uses, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Constructed through [`Injectable::inject`].
    Class,
    /// Produced by a factory closure.
    Factory,
    /// A pre-built value.
    Value,
    /// An alias for another token.
    Existing,
}

#[derive(Clone)]
pub(crate) enum Strategy {
    Construct(ConstructFn),
    Value(Instance),
    Existing(Token),
}

/// A registration entry binding a [`Token`] to a construction strategy.
#[derive(Clone)]
pub struct Provider {
    token: Token,
    kind: ProviderKind,
    type_name: &'static str,
    pub(crate) strategy: Strategy,
}

impl Provider {
    /// Binds `token` to "construct `T` via [`Injectable::inject`]".
    #[must_use]
    pub fn class<T: Injectable>(token: Token) -> Self {
        Self {
            token,
            kind: ProviderKind::Class,
            type_name: core::any::type_name::<T>(),
            strategy: Strategy::Construct(Arc::new(|resolver: &Resolver<'_>| {
                T::inject(resolver).map(|instance| Arc::new(instance) as Instance)
            })),
        }
    }

    /// Binds `token` to a factory closure.
    ///
    /// The closure receives a [`Resolver`] scoped to the injector that owns
    /// this provider.
    #[must_use]
    pub fn factory<T, F>(token: Token, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, InjectorError> + Send + Sync + 'static,
    {
        Self {
            token,
            kind: ProviderKind::Factory,
            type_name: core::any::type_name::<T>(),
            strategy: Strategy::Construct(Arc::new(move |resolver: &Resolver<'_>| {
                factory(resolver).map(|instance| instance as Instance)
            })),
        }
    }

    /// Binds `token` to an existing value.
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(token: Token, value: T) -> Self {
        Self::shared(token, Arc::new(value))
    }

    /// Binds `token` to an already shared value.
    #[must_use]
    pub fn shared<T: Send + Sync + 'static>(token: Token, value: Arc<T>) -> Self {
        Self {
            token,
            kind: ProviderKind::Value,
            type_name: core::any::type_name::<T>(),
            strategy: Strategy::Value(value),
        }
    }

    /// Binds `token` to whatever `target` resolves to.
    #[must_use]
    pub fn existing(token: Token, target: Token) -> Self {
        Self {
            token,
            kind: ProviderKind::Existing,
            type_name: "<alias>",
            strategy: Strategy::Existing(target),
        }
    }

    /// Returns the token this provider registers.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Returns the provider's strategy kind.
    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Returns the name of the type this provider produces.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Provider");
        s.field("token", &self.token).field("kind", &self.kind);
        if let Strategy::Existing(target) = &self.strategy {
            s.field("target", target);
        } else {
            s.field("type_name", &self.type_name);
        }
        s.finish()
    }
}
