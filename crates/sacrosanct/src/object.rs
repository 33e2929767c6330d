//! Shared objects with identity
//!
//! Provides [`ObjectRef`], a cheap-to-clone handle to an object cell holding
//! ordered data properties and an optional prototype. The methods on
//! [`ObjectRef`] are the ordinary, unintercepted semantics: the owner of a
//! graph mutates through them, and views read through them.
//!
//! # Locking
//! Every cell has its own `RwLock`. A lock is released before following a
//! prototype link or invoking a native function, so no two cell locks are
//! ever held at once. Prototype changes additionally hold one process-wide
//! mutex across the cycle check and the write.

use crate::value::Value;
use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::{const_mutex, Mutex, RwLock};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Serializes prototype changes so a cycle check and its write are atomic
static PROTOTYPE_LINKS: Mutex<()> = const_mutex(());

/// Process-unique object identity
///
/// Assigned from a monotonic counter at allocation and never reused, so an
/// id outliving its object can never alias a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Native function body
///
/// Functions take positional arguments only; there is no receiver, so a
/// function reached through a view cannot use it to mutate its holder.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Data property descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Stored value
    pub value: Value,
    /// Whether ordinary assignment may change `value`
    pub writable: bool,
    /// Whether the key is listed by enumeration
    pub enumerable: bool,
    /// Whether the property may be deleted or redefined
    pub configurable: bool,
}

impl Property {
    /// Ordinary property: writable, enumerable, configurable
    #[inline]
    #[must_use]
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Enumerable property that can never change
    #[inline]
    #[must_use]
    pub fn frozen(value: impl Into<Value>) -> Self {
        Self::data(value).writable(false).configurable(false)
    }

    /// With writable flag
    #[inline]
    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// With enumerable flag
    #[inline]
    #[must_use]
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// With configurable flag
    #[inline]
    #[must_use]
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Non-configurable and non-writable: the value is fixed for the
    /// lifetime of the holder
    #[inline]
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        !self.configurable && !self.writable
    }
}

enum ObjectKind {
    Ordinary,
    Function(NativeFn),
}

struct ObjectData {
    properties: IndexMap<String, Property>,
    prototype: Option<ObjectRef>,
    extensible: bool,
}

pub(crate) struct ObjectCell {
    id: ObjectId,
    kind: ObjectKind,
    data: RwLock<ObjectData>,
}

/// Shared handle to an object
///
/// Cloning the handle shares the object; equality of handles is identity
/// (see [`ObjectRef::ptr_eq`]).
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

/// Non-owning handle used by side tables
#[derive(Clone)]
pub(crate) struct WeakObjectRef(Weak<ObjectCell>);

impl WeakObjectRef {
    /// Whether the object is still reachable
    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl ObjectRef {
    fn alloc(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self(Arc::new(ObjectCell {
            id: ObjectId::next(),
            kind,
            data: RwLock::new(ObjectData {
                properties: IndexMap::new(),
                prototype,
                extensible: true,
            }),
        }))
    }

    /// Create empty ordinary object without prototype
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::alloc(ObjectKind::Ordinary, None)
    }

    /// Create empty ordinary object inheriting from `prototype`
    #[inline]
    #[must_use]
    pub fn with_prototype(prototype: ObjectRef) -> Self {
        Self::alloc(ObjectKind::Ordinary, Some(prototype))
    }

    /// Create callable object
    #[must_use]
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::alloc(ObjectKind::Function(Arc::new(f)), None)
    }

    /// Create ordinary object from key/value pairs
    #[must_use]
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let obj = Self::new();
        {
            let mut data = obj.0.data.write();
            for (key, value) in entries {
                data.properties.insert(key.into(), Property::data(value));
            }
        }
        obj
    }

    /// Object identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    /// Whether this object is a function
    #[inline]
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Function(_))
    }

    /// Invoke the function body; `None` for ordinary objects
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Option<Value> {
        match &self.0.kind {
            ObjectKind::Function(f) => Some(f(args)),
            ObjectKind::Ordinary => None,
        }
    }

    /// Current prototype
    #[must_use]
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.data.read().prototype.clone()
    }

    /// Own property descriptor
    #[must_use]
    pub fn get_own_property(&self, key: &str) -> Option<Property> {
        self.0.data.read().properties.get(key).cloned()
    }

    /// First descriptor for `key` along the prototype chain
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Property> {
        let mut current = self.clone();
        loop {
            let next = {
                let data = current.0.data.read();
                if let Some(prop) = data.properties.get(key) {
                    return Some(prop.clone());
                }
                data.prototype.clone()
            };
            current = next?;
        }
    }

    /// Ordinary property read, `Undefined` when absent
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.lookup(key).map(|prop| prop.value).unwrap_or_default()
    }

    /// Whether `key` resolves anywhere along the chain
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Own keys in insertion order, enumerable or not
    #[must_use]
    pub fn own_keys(&self) -> Vec<String> {
        self.0.data.read().properties.keys().cloned().collect()
    }

    /// Number of own properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.data.read().properties.len()
    }

    /// Whether the object has no own properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordinary assignment
    ///
    /// Returns false when the own or inherited property is non-writable, or
    /// when a new property would be added to a non-extensible object.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();

        let prototype = {
            let mut data = self.0.data.write();
            if let Some(prop) = data.properties.get_mut(&key) {
                if !prop.writable {
                    return false;
                }
                prop.value = value;
                return true;
            }
            data.prototype.clone()
        };

        if let Some(inherited) = prototype.and_then(|proto| proto.lookup(&key)) {
            if !inherited.writable {
                return false;
            }
        }

        // The key may have been defined while the chain was walked unlocked
        let mut data = self.0.data.write();
        let extensible = data.extensible;
        match data.properties.entry(key) {
            Entry::Occupied(mut slot) => {
                if !slot.get().writable {
                    return false;
                }
                slot.get_mut().value = value;
                true
            }
            Entry::Vacant(slot) => {
                if !extensible {
                    return false;
                }
                slot.insert(Property::data(value));
                true
            }
        }
    }

    /// Remove own property
    ///
    /// Returns false only for non-configurable properties; deleting a
    /// missing key succeeds.
    pub fn delete(&self, key: &str) -> bool {
        let mut data = self.0.data.write();
        match data.properties.get(key) {
            None => true,
            Some(prop) if !prop.configurable => false,
            Some(_) => {
                data.properties.shift_remove(key);
                true
            }
        }
    }

    /// Define or redefine an own property
    ///
    /// A non-configurable existing property cannot become configurable,
    /// change enumerability, become writable again once non-writable, or
    /// change value while non-writable.
    pub fn define_property(&self, key: impl Into<String>, property: Property) -> bool {
        let key = key.into();
        let mut data = self.0.data.write();

        if let Some(existing) = data.properties.get(&key) {
            if !existing.configurable {
                if property.configurable || property.enumerable != existing.enumerable {
                    return false;
                }
                if !existing.writable
                    && (property.writable || !property.value.same_value(&existing.value))
                {
                    return false;
                }
            }
        } else if !data.extensible {
            return false;
        }

        data.properties.insert(key, property);
        true
    }

    /// Replace prototype
    ///
    /// Returns false if the object is non-extensible or the new chain would
    /// contain this object.
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) -> bool {
        let _linking = PROTOTYPE_LINKS.lock();

        let mut link = prototype.clone();
        while let Some(obj) = link {
            if obj.ptr_eq(self) {
                return false;
            }
            link = obj.prototype();
        }

        let mut data = self.0.data.write();
        let unchanged = match (&data.prototype, &prototype) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        if unchanged {
            return true;
        }
        if !data.extensible {
            return false;
        }
        data.prototype = prototype;
        true
    }

    /// Whether new properties may be added
    #[must_use]
    pub fn is_extensible(&self) -> bool {
        self.0.data.read().extensible
    }

    /// Forbid new properties and prototype changes
    pub fn prevent_extensions(&self) {
        self.0.data.write().extensible = false;
    }

    /// Make every own property invariant and forbid extension
    pub fn freeze(&self) {
        let mut data = self.0.data.write();
        for prop in data.properties.values_mut() {
            prop.writable = false;
            prop.configurable = false;
        }
        data.extensible = false;
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match self.0.kind {
            ObjectKind::Ordinary => "object",
            ObjectKind::Function(_) => "function",
        };
        f.debug_struct("ObjectRef")
            .field("id", &self.0.id)
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}
