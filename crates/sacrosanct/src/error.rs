//! Error types for guarded views
//!
//! Two failure families exist:
//! - Entry validation (`guard` called with a non-object value)
//! - Mutation rejection (a strict view refusing a write)
//!
//! Everything else is a caller-side misuse of a read (calling a plain object,
//! walking a path through a primitive).

use crate::path::PropertyPath;
use crate::value::ValueType;
use std::fmt::{self, Display, Formatter};

/// Kind of mutation attempted through a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Property assignment
    Set,
    /// Property deletion
    Delete,
    /// Property (re)definition with explicit flags
    DefineProperty,
    /// Prototype replacement
    SetPrototype,
}

impl Mutation {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Delete => "delete",
            Self::DefineProperty => "define property",
            Self::SetPrototype => "set prototype",
        }
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main guard error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuardError {
    /// Entry point was handed something that is not an object or function
    #[error("expected an object or function, got {actual}")]
    Type {
        /// Runtime type of the rejected value
        actual: ValueType,
    },

    /// A strict view refused a mutation
    #[error("cannot {mutation}{}: value is immutable", key_label(.key))]
    MutationRejected {
        /// What was attempted
        mutation: Mutation,
        /// Property key, if the mutation targets one
        key: Option<String>,
    },

    /// Call attempted on a non-callable target
    #[error("guarded value is not callable")]
    NotCallable,

    /// Path walk reached a primitive before its last segment
    #[error("cannot read '{segment}' of a primitive while resolving {path}")]
    NotTraversable {
        /// Full path being resolved
        path: PropertyPath,
        /// Segment that could not be read
        segment: String,
    },
}

fn key_label(key: &Option<String>) -> String {
    key.as_deref()
        .map(|k| format!(" property '{k}'"))
        .unwrap_or_default()
}

impl GuardError {
    /// Create mutation rejection for a keyed mutation
    #[inline]
    pub fn rejected(mutation: Mutation, key: impl Into<String>) -> Self {
        Self::MutationRejected {
            mutation,
            key: Some(key.into()),
        }
    }

    /// Check if error is a mutation rejection
    #[inline]
    #[must_use]
    pub fn is_mutation_rejected(&self) -> bool {
        matches!(self, Self::MutationRejected { .. })
    }

    /// Check if error is an entry type error
    #[inline]
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type { .. })
    }
}

/// Result type alias for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_error_names_actual_type() {
        let err = GuardError::Type {
            actual: ValueType::Number,
        };
        assert_eq!(err.to_string(), "expected an object or function, got number");
        assert!(err.is_type_error());
        assert!(!err.is_mutation_rejected());
    }

    #[test]
    fn mutation_rejected_display() {
        let err = GuardError::rejected(Mutation::Set, "foo");
        assert_eq!(err.to_string(), "cannot set property 'foo': value is immutable");
        assert!(err.is_mutation_rejected());

        let err = GuardError::MutationRejected {
            mutation: Mutation::SetPrototype,
            key: None,
        };
        assert_eq!(err.to_string(), "cannot set prototype: value is immutable");
    }

    #[test]
    fn not_traversable_display() {
        let err = GuardError::NotTraversable {
            path: "foo.bar.baz".parse().unwrap(),
            segment: "baz".to_string(),
        };
        assert!(err.to_string().contains("foo.bar.baz"));
    }
}
