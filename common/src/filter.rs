//! [`Filter`]-related definitions.

use derive_more::{Display, Error};

/// Sentinel token meaning "apply no constraint on this dimension".
pub const WILDCARD: &str = "@";

/// Constraint over a single dimension of values.
///
/// Either a wildcard accepting everything, or a non-empty set of accepted
/// values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Filter<T> {
    /// Accepted values. Empty means the wildcard.
    only: Vec<T>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T> Filter<T> {
    /// Creates a wildcard [`Filter`] accepting every value.
    #[must_use]
    pub const fn any() -> Self {
        Self { only: Vec::new() }
    }

    /// Indicates whether this [`Filter`] is the wildcard.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.only.is_empty()
    }

    /// Returns the accepted values, or an empty slice for the wildcard.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.only
    }
}

impl<T: PartialEq> Filter<T> {
    /// Creates a [`Filter`] accepting only the provided values.
    ///
    /// No values at all is the wildcard.
    #[must_use]
    pub fn only(values: impl IntoIterator<Item = T>) -> Self {
        let mut only = Vec::new();
        for v in values {
            if !only.contains(&v) {
                only.push(v);
            }
        }
        Self { only }
    }

    /// Checks whether the provided `value` passes this [`Filter`].
    #[must_use]
    pub fn accepts(&self, value: &T) -> bool {
        self.only.is_empty() || self.only.contains(value)
    }

    /// Indicates whether this [`Filter`] accepts exactly the provided `value`
    /// and nothing else.
    #[must_use]
    pub fn is_exactly(&self, value: &T) -> bool {
        matches!(self.only.as_slice(), [v] if v == value)
    }
}

impl<T: PartialEq> FromIterator<Token<T>> for Filter<T> {
    fn from_iter<I: IntoIterator<Item = Token<T>>>(iter: I) -> Self {
        Self::only(iter.into_iter().filter_map(Token::into_value))
    }
}

/// Single caller-supplied filter token: either a literal value or the
/// [`WILDCARD`] sentinel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token<T> {
    /// [`WILDCARD`] sentinel.
    Any,

    /// Literal value.
    Value(T),
}

impl<T> Token<T> {
    /// Returns the literal value of this [`Token`], if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Any => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Parses the provided `token` expecting it to be either the [`WILDCARD`]
    /// or exactly the `literal` denoting the `value`.
    ///
    /// # Errors
    ///
    /// If the `token` is neither of them.
    pub fn expect(
        field: &'static str,
        token: &str,
        literal: &str,
        value: T,
    ) -> Result<Self, TokenError> {
        if token == WILDCARD {
            Ok(Self::Any)
        } else if token == literal {
            Ok(Self::Value(value))
        } else {
            Err(TokenError {
                field,
                token: token.to_owned(),
            })
        }
    }
}

/// Error of parsing a [`Token`] for a named field.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("invalid `{field}` filter token: \"{token}\"")]
pub struct TokenError {
    /// Name of the field the [`Token`] was provided for.
    #[error(not(source))]
    pub field: &'static str,

    /// Rejected raw token.
    #[error(not(source))]
    pub token: String,
}
