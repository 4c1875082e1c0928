//! Errors produced while building injectors and resolving tokens.

use crate::token::Token;

/// Boxed error type carried by [`InjectorError::Construction`].
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors that can occur during registration or resolution.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// No provider for the token exists in the injector or any ancestor.
    #[error("no provider for {token} (resolving {path})")]
    NotProvided {
        /// The token that was requested.
        token: String,
        /// The resolution path that led to the request.
        path: String,
    },

    /// A token depends on itself, directly or transitively.
    #[error("circular dependency: {path}")]
    Cycle {
        /// The resolution path, ending with the repeated token.
        path: String,
    },

    /// The instance stored under a token is not of the requested type.
    #[error("provider for {token} does not produce {expected}")]
    TypeMismatch {
        /// The token that was requested.
        token: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// The same module was added to a builder twice.
    #[error("module already added: {0}")]
    DuplicateModule(&'static str),

    /// A class or factory provider failed to construct its instance.
    #[error("failed to construct {token}: {source}")]
    Construction {
        /// The token being constructed.
        token: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl InjectorError {
    /// Wraps an arbitrary failure raised while constructing `token`.
    pub fn construction(token: &Token, source: impl Into<BoxError>) -> Self {
        Self::Construction {
            token: token.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn not_provided(token: &Token, path: &[Token]) -> Self {
        Self::NotProvided {
            token: token.to_string(),
            path: format_path(path, None),
        }
    }

    pub(crate) fn cycle(path: &[Token], repeated: &Token) -> Self {
        Self::Cycle {
            path: format_path(path, Some(repeated)),
        }
    }
}

/// Renders a resolution path as `A -> B -> C`.
fn format_path(path: &[Token], last: Option<&Token>) -> String {
    let mut parts: Vec<String> = path.iter().map(ToString::to_string).collect();
    if let Some(last) = last {
        parts.push(last.to_string());
    }
    if parts.is_empty() {
        "<root>".to_owned()
    } else {
        parts.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn cycle_message_lists_the_path() {
        let path = [Token::of::<A>(), Token::of::<B>()];
        let err = InjectorError::cycle(&path, &Token::of::<A>());
        let message = err.to_string();
        assert!(message.starts_with("circular dependency: "));
        assert_eq!(message.matches(" -> ").count(), 2);
    }

    #[test]
    fn not_provided_at_root() {
        let err = InjectorError::not_provided(&Token::of::<A>(), &[]);
        assert!(err.to_string().ends_with("(resolving <root>)"));
    }
}
