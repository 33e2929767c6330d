//! Sacrosanct
//!
//! Deep, lazily wrapped read-only views over shared object graphs.
//!
//! # Overview
//!
//! - [`ObjectRef`]: shared object with identity, data properties and an
//!   optional prototype
//! - [`View`]: read-only wrapper around one object; nested objects are
//!   wrapped on demand as they are read
//! - [`StrictnessRegistry`]: identity-keyed, non-owning record of whether a
//!   target rejects mutations with an error or ignores them
//! - [`guard`]: validating entry point over the process-wide registry
//!
//! # Example
//!
//! ```rust
//! use sacrosanct::{guard, Value};
//! use serde_json::json;
//!
//! let config = Value::from_json(json!({
//!     "foo": { "bar": "baz", "bing": { "boom": true } },
//!     "bar": true,
//! }));
//!
//! // Lenient: mutations are silently ignored
//! let view = guard(&config, false).unwrap();
//! assert_eq!(view.set("bar", "bar"), Ok(true));
//! assert_eq!(view.get("bar").as_bool(), Some(true));
//!
//! // Strict: mutations fail
//! let view = guard(&config, true).unwrap();
//! let foo = view.get("foo").into_view().unwrap();
//! assert!(foo.set("bar", "blah").is_err());
//! assert_eq!(foo.get("bar").as_str(), Some("baz"));
//!
//! // Primitives cannot be guarded
//! assert!(guard(&Value::from(1), false).is_err());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod object;
pub mod path;
pub mod registry;
pub mod value;
pub mod view;

// Re-exports
pub use config::GuardConfig;
pub use error::{GuardError, GuardResult, Mutation};
pub use object::{NativeFn, ObjectId, ObjectRef, Property};
pub use path::{PathError, PropertyPath};
pub use registry::StrictnessRegistry;
pub use value::{Value, ValueType};
pub use view::{Guard, Guarded, View};

/// Guard `value` against mutation using the process-wide registry
///
/// With `strict` set, every mutation attempted through the view (or any view
/// reached through it) fails; otherwise mutations are silently ignored.
///
/// # Errors
/// Returns [`GuardError::Type`] if `value` is not an object or function.
/// Nothing is registered in that case.
#[inline]
pub fn guard(value: &Value, strict: bool) -> GuardResult<View> {
    Guard::global().guard_with(value, strict)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for guarded views
    pub use crate::{
        guard, Guard, GuardConfig, GuardError, GuardResult, Guarded, Mutation, ObjectRef,
        Property, PropertyPath, Value, View,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
