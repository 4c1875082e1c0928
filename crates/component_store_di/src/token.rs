//! Registration keys.
//!
//! A [`Token`] identifies what an [`Injector`](crate::Injector) should
//! construct or supply. There are two kinds:
//!
//! | Kind | Constructor | Equal to |
//! |------|-------------|----------|
//! | Type | [`Token::of`] | Every other type token for the same `T` |
//! | Unique | [`Token::unique`] | Only its own clones |
//!
//! Type tokens are what consumers ask for. Unique tokens are generated with
//! nanoid so that independent registrations never collide, which is what
//! lets a provider wrap a "raw" registration under a private key.

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

/// The identity part of a token. Only this takes part in equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TokenKey {
    Type(TypeId),
    Unique(Arc<str>),
}

/// Opaque key identifying a provider within an injector.
///
/// Internally uses `Arc<str>` for labels, so cloning is a reference count
/// bump only.
///
/// # Example
///
/// ```
/// use component_store_di::Token;
///
/// struct Settings;
///
/// assert_eq!(Token::of::<Settings>(), Token::of::<Settings>());
///
/// let a = Token::unique("raw");
/// let b = Token::unique("raw");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Clone)]
pub struct Token {
    key: TokenKey,
    label: Arc<str>,
}

impl Token {
    /// Returns the public token for type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: TokenKey::Type(TypeId::of::<T>()),
            label: core::any::type_name::<T>().into(),
        }
    }

    /// Creates a new token that is not equal to any other token.
    ///
    /// `label` is only used for display and debugging.
    #[must_use]
    pub fn unique(label: impl Into<Arc<str>>) -> Self {
        Self {
            key: TokenKey::Unique(nanoid::nanoid!().into()),
            label: label.into(),
        }
    }

    /// Returns the human-readable label.
    ///
    /// For type tokens this is the type name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if this token was created with [`Token::unique`].
    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self.key, TokenKey::Unique(_))
    }

    /// Returns the `TypeId` behind a type token.
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        match self.key {
            TokenKey::Type(id) => Some(id),
            TokenKey::Unique(_) => None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            TokenKey::Type(_) => f.debug_tuple("Token::Type").field(&self.label).finish(),
            TokenKey::Unique(id) => f
                .debug_struct("Token::Unique")
                .field("label", &self.label)
                .field("id", id)
                .finish(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            TokenKey::Type(_) => f.write_str(&self.label),
            TokenKey::Unique(id) => write!(f, "{}#{}", self.label, id),
        }
    }
}
