//! Guarded views
//!
//! A [`View`] wraps exactly one target object. Reads go through to the
//! target and wrap any object they return in a fresh nested view; writes,
//! deletes, redefinitions and prototype changes never reach the target.
//!
//! # Read rules
//! 1. Resolve the property along the prototype chain.
//! 2. Primitives (including `Undefined` for a missing key) come back as-is.
//! 3. An object held by an invariant property (non-configurable and
//!    non-writable) comes back unwrapped, so the reported value is always
//!    the one the descriptor fixes.
//! 4. Any other object is registered with the reading view's current
//!    strictness and returned as a new nested view.
//!
//! # Mutation rules
//! Strict views fail with [`GuardError::MutationRejected`]. Lenient views
//! return `Ok(true)`: the no-op is reported as a success, and the target is
//! left untouched.
//!
//! Strictness is not stored in the view: it is looked up in the registry on
//! every check, so re-guarding a target with a different flag changes the
//! behavior of views issued earlier.

use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult, Mutation};
use crate::object::{ObjectId, ObjectRef, Property};
use crate::path::PropertyPath;
use crate::registry::StrictnessRegistry;
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// View factory bound to a strictness registry
#[derive(Debug, Clone)]
pub struct Guard {
    registry: Arc<StrictnessRegistry>,
    config: GuardConfig,
}

impl Guard {
    /// Create factory over `registry`
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<StrictnessRegistry>, config: GuardConfig) -> Self {
        Self { registry, config }
    }

    /// Factory over the process-wide registry with default configuration
    #[inline]
    #[must_use]
    pub fn global() -> Self {
        Self::new(StrictnessRegistry::global(), GuardConfig::default())
    }

    /// Factory over a private registry built from `config`
    #[must_use]
    pub fn isolated(config: GuardConfig) -> Self {
        let registry = StrictnessRegistry::with_sweep_threshold(config.sweep_threshold);
        Self::new(Arc::new(registry), config)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Backing registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<StrictnessRegistry> {
        &self.registry
    }

    /// Guard `value` with the configured strictness
    ///
    /// # Errors
    /// Returns [`GuardError::Type`] if `value` is not an object or function.
    #[inline]
    pub fn guard(&self, value: &Value) -> GuardResult<View> {
        self.guard_with(value, self.config.strict)
    }

    /// Guard `value` with explicit strictness
    ///
    /// Validation happens before anything is registered.
    ///
    /// # Errors
    /// Returns [`GuardError::Type`] if `value` is not an object or function.
    pub fn guard_with(&self, value: &Value, strict: bool) -> GuardResult<View> {
        match value {
            Value::Object(target) => Ok(self.protect(target, strict)),
            other => Err(GuardError::Type {
                actual: other.value_type(),
            }),
        }
    }

    /// Guard an object handle; cannot fail
    #[inline]
    #[must_use]
    pub fn protect(&self, target: &ObjectRef, strict: bool) -> View {
        View::create(target.clone(), strict, Arc::clone(&self.registry))
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::global()
    }
}

/// Read-only view over one target object
#[derive(Clone)]
pub struct View {
    target: ObjectRef,
    registry: Arc<StrictnessRegistry>,
    created_strict: bool,
}

impl View {
    fn create(target: ObjectRef, strict: bool, registry: Arc<StrictnessRegistry>) -> Self {
        registry.register(&target, strict);
        tracing::trace!("Guarding {} (strict: {})", target.id(), strict);
        Self {
            target,
            registry,
            created_strict: strict,
        }
    }

    /// Identity of the underlying target
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.target.id()
    }

    /// Whether mutations through this view fail
    ///
    /// Read from the registry on every call. Falls back to the flag the view
    /// was created with if the entry has been swept.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.registry
            .strictness(self.target.id())
            .unwrap_or(self.created_strict)
    }

    /// Intercepted property read
    #[must_use]
    pub fn get(&self, key: &str) -> Guarded {
        let Some(property) = self.target.lookup(key) else {
            return Guarded::Value(Value::Undefined);
        };

        let invariant = property.is_invariant();
        match property.value {
            Value::Object(obj) if invariant => {
                tracing::debug!("Property '{}' of {} is invariant, returning it unwrapped", key, self.id());
                Guarded::Value(Value::Object(obj))
            }
            Value::Object(obj) => {
                Guarded::View(Self::create(obj, self.is_strict(), Arc::clone(&self.registry)))
            }
            primitive => Guarded::Value(primitive),
        }
    }

    /// Read a nested value in one call
    ///
    /// # Errors
    /// Returns [`GuardError::NotTraversable`] if a segment other than the
    /// last resolves to a primitive.
    pub fn get_path(&self, path: &PropertyPath) -> GuardResult<Guarded> {
        let mut current = Guarded::View(self.clone());
        for segment in path.iter() {
            current = current.get(segment).ok_or_else(|| GuardError::NotTraversable {
                path: path.clone(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Intercepted assignment; the target is never written
    ///
    /// # Errors
    /// Returns [`GuardError::MutationRejected`] if the view is strict.
    pub fn set(&self, key: &str, _value: impl Into<Value>) -> GuardResult<bool> {
        self.intercept(Mutation::Set, Some(key))
    }

    /// Intercepted deletion; the property stays on the target
    ///
    /// # Errors
    /// Returns [`GuardError::MutationRejected`] if the view is strict.
    pub fn delete(&self, key: &str) -> GuardResult<bool> {
        self.intercept(Mutation::Delete, Some(key))
    }

    /// Intercepted property definition
    ///
    /// # Errors
    /// Returns [`GuardError::MutationRejected`] if the view is strict.
    pub fn define_property(&self, key: &str, _property: Property) -> GuardResult<bool> {
        self.intercept(Mutation::DefineProperty, Some(key))
    }

    /// Intercepted prototype replacement
    ///
    /// # Errors
    /// Returns [`GuardError::MutationRejected`] if the view is strict.
    pub fn set_prototype(&self, _prototype: Option<ObjectRef>) -> GuardResult<bool> {
        self.intercept(Mutation::SetPrototype, None)
    }

    fn intercept(&self, mutation: Mutation, key: Option<&str>) -> GuardResult<bool> {
        let key = key.map(str::to_string);
        if self.is_strict() {
            tracing::warn!("Rejected {} of {:?} on strict view {}", mutation, key, self.id());
            return Err(GuardError::MutationRejected { mutation, key });
        }
        tracing::debug!("Ignored {} of {:?} on view {}", mutation, key, self.id());
        Ok(true)
    }

    /// Whether `key` resolves on the target or its prototype chain
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.target.has(key)
    }

    /// Own keys of the target in insertion order
    #[inline]
    #[must_use]
    pub fn own_keys(&self) -> Vec<String> {
        self.target.own_keys()
    }

    /// Prototype of the target, guarded with this view's strictness
    #[must_use]
    pub fn prototype(&self) -> Option<View> {
        self.target
            .prototype()
            .map(|proto| Self::create(proto, self.is_strict(), Arc::clone(&self.registry)))
    }

    /// Whether the target is a function
    #[inline]
    #[must_use]
    pub fn is_callable(&self) -> bool {
        self.target.is_callable()
    }

    /// Call the target function
    ///
    /// The return value is handed back as the function produced it.
    ///
    /// # Errors
    /// Returns [`GuardError::NotCallable`] for ordinary objects.
    pub fn call(&self, args: &[Value]) -> GuardResult<Value> {
        self.target.call(args).ok_or(GuardError::NotCallable)
    }
}

impl Debug for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("target", &self.target.id())
            .field("strict", &self.is_strict())
            .finish_non_exhaustive()
    }
}

/// Result of a read through a view
#[derive(Debug, Clone)]
pub enum Guarded {
    /// Primitive, or an object returned unwrapped because its property is
    /// invariant
    Value(Value),
    /// Nested view over an object
    View(View),
}

impl Guarded {
    /// Nested view, if the read produced one
    #[inline]
    #[must_use]
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Self::View(view) => Some(view),
            Self::Value(_) => None,
        }
    }

    /// Take the nested view
    #[inline]
    #[must_use]
    pub fn into_view(self) -> Option<View> {
        match self {
            Self::View(view) => Some(view),
            Self::Value(_) => None,
        }
    }

    /// Plain value, if the read was not wrapped
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::View(_) => None,
        }
    }

    /// Whether the read produced a nested view
    #[inline]
    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// Whether the read produced `Undefined`
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Value(Value::Undefined))
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Numeric payload
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_number)
    }

    /// String payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Identity of the object behind the result, wrapped or not
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::View(view) => Some(view.id()),
            Self::Value(value) => value.as_object().map(ObjectRef::id),
        }
    }

    /// Chained read
    ///
    /// Views read through their interception rules; an unwrapped object is
    /// read directly. Returns `None` for primitives.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Guarded> {
        match self {
            Self::View(view) => Some(view.get(key)),
            Self::Value(Value::Object(obj)) => Some(Self::Value(obj.get(key))),
            Self::Value(_) => None,
        }
    }
}

impl From<View> for Guarded {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

/// Primitives compare by value; views and objects by target identity
impl PartialEq<Value> for Guarded {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Self::Value(value) => value == other,
            Self::View(view) => other.as_object().is_some_and(|obj| obj.id() == view.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> Guard {
        Guard::isolated(GuardConfig::default())
    }

    fn sample() -> ObjectRef {
        let bing = ObjectRef::from_entries([("boom", true)]);
        let foo = ObjectRef::from_entries([("bar", Value::from("baz")), ("bing", bing.into())]);
        ObjectRef::from_entries([("foo", Value::from(foo)), ("bar", Value::from(true))])
    }

    #[test]
    fn rejects_primitives_before_registering() {
        let guard = isolated();
        for value in [
            Value::Undefined,
            Value::Null,
            Value::from(1),
            Value::from("foo"),
            Value::from(true),
        ] {
            let err = guard.guard_with(&value, true).unwrap_err();
            assert!(err.is_type_error());
            let err = guard.guard_with(&value, false).unwrap_err();
            assert!(err.is_type_error());
        }
        assert!(guard.registry().is_empty());
    }

    #[test]
    fn guard_applies_configured_strictness() {
        let guard = Guard::isolated(GuardConfig::strict().with_sweep_threshold(8));
        assert!(guard.config().strict);
        assert_eq!(guard.config().sweep_threshold, 8);

        let view = guard.guard(&Value::from(sample())).unwrap();
        assert!(view.is_strict());
        assert!(view.set("bar", false).is_err());
    }

    #[test]
    fn primitives_pass_through() {
        let view = isolated().protect(&sample(), false);
        assert_eq!(view.get("bar").as_bool(), Some(true));
        assert!(view.get("missing").is_undefined());
    }

    #[test]
    fn nested_objects_are_wrapped() {
        let root = sample();
        let view = isolated().protect(&root, false);

        let foo = view.get("foo");
        assert!(foo.is_view());
        assert_eq!(foo, root.get("foo"));
        assert_eq!(foo.get("bar").unwrap().as_str(), Some("baz"));
    }

    #[test]
    fn nested_views_inherit_strictness() {
        let guard = isolated();
        let root = sample();
        let foo = root.get("foo");
        let foo = foo.as_object().unwrap();

        guard.protect(foo, false);
        let view = guard.protect(&root, true);
        let nested = view.get("foo").into_view().unwrap();

        assert!(nested.is_strict());
        assert!(guard.registry().is_strict(foo));
    }

    #[test]
    fn lenient_mutations_are_ignored() {
        let root = sample();
        let view = isolated().protect(&root, false);

        assert_eq!(view.set("bar", "bar"), Ok(true));
        assert_eq!(view.delete("foo"), Ok(true));
        assert_eq!(view.define_property("bar", Property::data(1)), Ok(true));
        assert_eq!(view.set_prototype(Some(ObjectRef::new())), Ok(true));

        assert_eq!(root.get("bar"), Value::from(true));
        assert!(root.has("foo"));
        assert!(root.prototype().is_none());
    }

    #[test]
    fn strict_mutations_fail() {
        let root = sample();
        let view = isolated().protect(&root, true);

        assert_eq!(
            view.set("bar", "bar"),
            Err(GuardError::rejected(Mutation::Set, "bar"))
        );
        assert_eq!(
            view.delete("foo"),
            Err(GuardError::rejected(Mutation::Delete, "foo"))
        );
        assert!(view.define_property("x", Property::data(1)).unwrap_err().is_mutation_rejected());
        assert_eq!(
            view.set_prototype(None),
            Err(GuardError::MutationRejected {
                mutation: Mutation::SetPrototype,
                key: None,
            })
        );
        assert_eq!(root.get("bar"), Value::from(true));
    }

    #[test]
    fn strictness_is_live() {
        let guard = isolated();
        let root = sample();
        let lenient = guard.protect(&root, false);

        let strict = guard.protect(&root, true);
        assert!(lenient.is_strict());
        assert!(lenient.set("bar", 1).is_err());

        drop(strict);
        guard.protect(&root, false);
        assert_eq!(lenient.set("bar", 1), Ok(true));
    }

    #[test]
    fn invariant_property_is_unwrapped() {
        let inner = ObjectRef::from_entries([("x", 1)]);
        let root = ObjectRef::new();
        root.define_property("fixed", Property::frozen(inner.clone()));
        root.define_property("readonly", Property::data(inner.clone()).writable(false));

        let view = isolated().protect(&root, true);
        let fixed = view.get("fixed");
        assert!(!fixed.is_view());
        assert!(fixed.as_value().unwrap().as_object().unwrap().ptr_eq(&inner));

        // Non-writable but configurable is still wrapped
        assert!(view.get("readonly").is_view());
    }

    #[test]
    fn invariant_check_follows_prototype_chain() {
        let inner = ObjectRef::new();
        let proto = ObjectRef::new();
        proto.define_property("shared", Property::frozen(inner.clone()));
        let root = ObjectRef::with_prototype(proto);

        let view = isolated().protect(&root, false);
        let shared = view.get("shared");
        assert_eq!(shared.object_id(), Some(inner.id()));
        assert!(!shared.is_view());
    }

    #[test]
    fn get_path_walks_views() {
        let view = isolated().protect(&sample(), false);
        let boom = view.get_path(&"foo.bing.boom".parse().unwrap()).unwrap();
        assert_eq!(boom.as_bool(), Some(true));

        let root = view.get_path(&PropertyPath::root()).unwrap();
        assert_eq!(root.object_id(), Some(view.id()));

        let err = view.get_path(&"bar.x.y".parse().unwrap()).unwrap_err();
        assert!(matches!(err, GuardError::NotTraversable { ref segment, .. } if segment == "x"));
    }

    #[test]
    fn functions_are_guarded_and_callable() {
        let double = ObjectRef::function(|args| {
            Value::from(args.first().and_then(Value::as_number).unwrap_or(0.0) * 2.0)
        });
        double.set("label", "double");
        let root = ObjectRef::from_entries([("double", double)]);

        let view = isolated().protect(&root, true);
        let func = view.get("double").into_view().unwrap();
        assert!(func.is_callable());
        assert_eq!(func.call(&[Value::from(21)]), Ok(Value::from(42)));
        assert!(func.set("label", "other").is_err());
        assert_eq!(view.call(&[]), Err(GuardError::NotCallable));
    }

    #[test]
    fn prototype_is_guarded() {
        let proto = ObjectRef::from_entries([("inherited", 1)]);
        let root = ObjectRef::with_prototype(proto.clone());
        let view = isolated().protect(&root, true);

        let proto_view = view.prototype().unwrap();
        assert_eq!(proto_view.id(), proto.id());
        assert!(proto_view.is_strict());
        assert!(proto_view.set("inherited", 2).is_err());
        assert_eq!(view.get("inherited").as_number(), Some(1.0));
    }

    #[test]
    fn reflects_later_target_changes() {
        let root = sample();
        let view = isolated().protect(&root, false);
        root.set("added", 5);

        assert!(view.has("added"));
        assert_eq!(view.get("added").as_number(), Some(5.0));
        assert_eq!(view.own_keys(), vec!["foo", "bar", "added"]);
    }
}
