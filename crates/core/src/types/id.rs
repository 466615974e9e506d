//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a user ID where an idea ID is expected.

use thiserror::Error;

/// Error returned when an ID cannot be parsed from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid id {input:?}: expected a positive integer")]
pub struct ParseIdError {
    /// The rejected input.
    pub input: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` (the backend uses 64-bit identity
/// columns) with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `Display` and `FromStr` (for path segments and CLI arguments)
///
/// # Example
///
/// ```rust
/// # use upvote_core::define_id;
/// define_id!(BallotId);
///
/// let id: BallotId = "42".parse().unwrap();
/// assert_eq!(id.as_i64(), 42);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::ParseIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(id) if id > 0 => Ok(Self(id)),
                    _ => Err($crate::types::id::ParseIdError {
                        input: s.to_owned(),
                    }),
                }
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(IdeaId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id: IdeaId = "17".parse().unwrap();
        assert_eq!(id, IdeaId::new(17));
        assert_eq!(id.to_string(), "17");
    }

    #[test]
    fn test_parse_id_trims_whitespace() {
        let id: IdeaId = " 3 ".parse().unwrap();
        assert_eq!(id.as_i64(), 3);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!("abc".parse::<IdeaId>().is_err());
        assert!("0".parse::<IdeaId>().is_err());
        assert!("-5".parse::<IdeaId>().is_err());
    }

    #[test]
    fn test_id_is_transparent_in_json() {
        let json = serde_json::to_string(&IdeaId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: IdeaId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_i64(), 9);
    }
}
