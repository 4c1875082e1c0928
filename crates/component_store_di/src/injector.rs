//! Injector runtime.
//!
//! The [`Injector`] maps [`Token`]s to [`Provider`]s and caches the
//! instances they produce. Injectors form a hierarchy: a token that is not
//! provided locally is delegated to the parent, and the instance is built
//! and cached in the injector that owns the provider.
//!
//! ```text
//! root (Config, Http)
//!  └── child (TodoStore)      child.get::<Http>() -> root's Http
//!       └── grandchild (TodoStore)   separate TodoStore instance
//! ```
//!
//! # Lifecycle
//!
//! 1. **Registration** - collect providers and modules in an [`InjectorBuilder`]
//! 2. **Build** - freeze them into an [`Injector`] (last provider per token wins)
//! 3. **Resolution** - [`Injector::get`] constructs lazily and caches

use core::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::error::InjectorError;
use crate::module::{Module, ModuleId};
use crate::provider::{Instance, Provider, Strategy};
use crate::token::Token;

// ─────────────────────────────────────────────────────────────────────────────
// Injector
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves tokens to shared instances.
///
/// # Thread Safety
///
/// The instance cache is guarded by a `RwLock`, which is never held while a
/// provider runs. Two threads racing to construct the same token may both
/// run the provider; the first instance to be cached wins and is returned to
/// both.
///
/// # Example
///
/// ```
/// use component_store_di::{Injector, Provider, Token};
///
/// struct Config { retries: u32 }
///
/// let injector = Injector::new([
///     Provider::value(Token::of::<Config>(), Config { retries: 3 }),
/// ]);
///
/// assert_eq!(injector.get::<Config>().unwrap().retries, 3);
/// ```
pub struct Injector {
    /// Name used in log output.
    name: String,

    /// Injector that unresolved tokens are delegated to.
    parent: Option<Arc<Injector>>,

    /// Registered providers, one per token.
    providers: HashMap<Token, Provider>,

    /// Instances produced by class and factory providers.
    instances: RwLock<HashMap<Token, Instance>>,
}

impl Injector {
    /// Creates a root injector from a list of providers.
    ///
    /// Later providers for the same token replace earlier ones.
    #[must_use]
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        let name = "root".to_owned();
        let providers = index_providers(&name, providers);

        Self {
            name,
            parent: None,
            providers,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Starts configuring a new injector.
    #[must_use]
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::default()
    }

    /// Starts configuring a child injector whose parent is `self`.
    #[must_use]
    pub fn child(self: &Arc<Self>) -> InjectorBuilder {
        InjectorBuilder::default().parent(Arc::clone(self))
    }

    /// Returns the injector's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent injector, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Injector>> {
        self.parent.as_ref()
    }

    /// Returns the number of providers registered directly on this injector.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if `token` is provided by this injector (ignoring ancestors).
    #[must_use]
    pub fn provides(&self, token: &Token) -> bool {
        self.providers.contains_key(token)
    }

    /// Returns `true` if `token` is provided by this injector or an ancestor.
    #[must_use]
    pub fn contains(&self, token: &Token) -> bool {
        self.provides(token) || self.parent.as_ref().is_some_and(|p| p.contains(token))
    }

    /// Returns `true` if this injector has already cached an instance for `token`.
    #[must_use]
    pub fn is_instantiated(&self, token: &Token) -> bool {
        self.instances.read().contains_key(token)
    }

    /// Resolves the public token of `T`.
    ///
    /// # Errors
    ///
    /// - [`InjectorError::NotProvided`] if no injector in the chain provides `T`
    /// - [`InjectorError::Cycle`] if `T` depends on itself
    /// - [`InjectorError::TypeMismatch`] if the provider produces another type
    /// - any error returned by the provider itself
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectorError> {
        self.get_token(&Token::of::<T>())
    }

    /// Resolves an arbitrary token and downcasts the instance to `T`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_token<T: Send + Sync + 'static>(
        &self,
        token: &Token,
    ) -> Result<Arc<T>, InjectorError> {
        let instance = self.resolve(token, &[])?;
        downcast(token, instance)
    }

    /// Resolves `token` with `path` being the chain of tokens currently under
    /// construction.
    fn resolve(&self, token: &Token, path: &[Token]) -> Result<Instance, InjectorError> {
        if path.contains(token) {
            return Err(InjectorError::cycle(path, token));
        }

        let Some(provider) = self.providers.get(token) else {
            return match &self.parent {
                Some(parent) => parent.resolve(token, path),
                None => Err(InjectorError::not_provided(token, path)),
            };
        };

        match &provider.strategy {
            Strategy::Value(value) => Ok(Arc::clone(value)),
            Strategy::Existing(target) => self.resolve(target, &extend(path, token)),
            Strategy::Construct(construct) => {
                if let Some(instance) = self.instances.read().get(token) {
                    return Ok(Arc::clone(instance));
                }

                tracing::debug!(injector = %self.name, %token, "constructing");
                let resolver = Resolver {
                    injector: self,
                    path: extend(path, token),
                };
                let instance = construct(&resolver)?;

                let mut instances = self.instances.write();
                Ok(Arc::clone(instances.entry(token.clone()).or_insert(instance)))
            }
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("providers", &self.providers.len())
            .field("instances", &self.instances.read().len())
            .finish()
    }
}

/// Keys providers by token, keeping the last provider for each.
fn index_providers(
    injector: &str,
    providers: impl IntoIterator<Item = Provider>,
) -> HashMap<Token, Provider> {
    let providers = providers.into_iter();
    let mut map = HashMap::with_capacity(providers.size_hint().0);
    for provider in providers {
        let token = provider.token().clone();
        if map.insert(token.clone(), provider).is_some() {
            tracing::debug!(injector, %token, "provider replaced");
        }
    }
    map
}

fn extend(path: &[Token], token: &Token) -> Vec<Token> {
    let mut next = Vec::with_capacity(path.len() + 1);
    next.extend_from_slice(path);
    next.push(token.clone());
    next
}

fn downcast<T: Send + Sync + 'static>(
    token: &Token,
    instance: Instance,
) -> Result<Arc<T>, InjectorError> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectorError::TypeMismatch {
            token: token.to_string(),
            expected: core::any::type_name::<T>(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Per-resolution view of an injector, handed to providers.
///
/// Dependencies requested through a resolver are resolved from the injector
/// that owns the provider being constructed, and the resolver tracks the
/// chain of tokens under construction to detect cycles.
pub struct Resolver<'a> {
    injector: &'a Injector,
    path: Vec<Token>,
}

impl<'a> Resolver<'a> {
    /// Resolves the public token of `T`.
    ///
    /// # Errors
    ///
    /// See [`Injector::get`].
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectorError> {
        self.get_token(&Token::of::<T>())
    }

    /// Resolves an arbitrary token and downcasts the instance to `T`.
    ///
    /// # Errors
    ///
    /// See [`Injector::get`].
    pub fn get_token<T: Send + Sync + 'static>(
        &self,
        token: &Token,
    ) -> Result<Arc<T>, InjectorError> {
        let instance = self.injector.resolve(token, &self.path)?;
        downcast(token, instance)
    }

    /// Returns the injector this resolver belongs to.
    #[must_use]
    pub fn injector(&self) -> &'a Injector {
        self.injector
    }

    /// Returns the chain of tokens under construction, outermost first.
    #[must_use]
    pub fn path(&self) -> &[Token] {
        &self.path
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InjectorBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Configures and builds an [`Injector`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use component_store_di::{Injector, Provider, Token};
///
/// struct Theme(&'static str);
///
/// let root = Arc::new(
///     Injector::builder()
///         .name("app")
///         .provide(Provider::value(Token::of::<Theme>(), Theme("dark")))
///         .build()
///         .unwrap(),
/// );
///
/// let child = root.child().name("panel").build().unwrap();
/// assert_eq!(child.get::<Theme>().unwrap().0, "dark");
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    name: Option<String>,
    parent: Option<Arc<Injector>>,
    providers: Vec<Provider>,
    modules: HashSet<ModuleId>,
    duplicate_module: Option<&'static str>,
}

impl InjectorBuilder {
    /// Sets the name used in log output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the parent injector.
    #[must_use]
    pub fn parent(mut self, parent: Arc<Injector>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a single provider.
    #[must_use]
    pub fn provide(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Adds every provider from `providers`, in order.
    #[must_use]
    pub fn provide_all(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Adds a module's providers.
    ///
    /// Adding a unique module twice makes [`build`](Self::build) fail with
    /// [`InjectorError::DuplicateModule`].
    #[must_use]
    pub fn add_module<M: Module>(mut self, module: M) -> Self {
        let id = ModuleId::of::<M>();
        if !self.modules.insert(id) && module.is_unique() {
            self.duplicate_module.get_or_insert(id.type_name());
            return self;
        }

        tracing::debug!(module = module.name(), "adding module");
        self.providers.extend(module.providers());
        self
    }

    /// Builds the injector.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::DuplicateModule`] if a unique module was added
    /// more than once.
    pub fn build(self) -> Result<Injector, InjectorError> {
        if let Some(module) = self.duplicate_module {
            return Err(InjectorError::DuplicateModule(module));
        }

        let name = self.name.unwrap_or_else(|| {
            if self.parent.is_some() {
                "child".to_owned()
            } else {
                "root".to_owned()
            }
        });

        let providers = index_providers(&name, self.providers);

        Ok(Injector {
            name,
            parent: self.parent,
            providers,
            instances: RwLock::new(HashMap::new()),
        })
    }
}
