//! Testing utilities for the sacrosanct workspace
//!
//! Shared fixtures and tracing setup.

#![allow(missing_docs)]

use sacrosanct::{ObjectRef, Property, Value};
use serde_json::json;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process, honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sacrosanct=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn sample_json() -> serde_json::Value {
    json!({
        "foo": {
            "bar": "baz",
            "bing": { "boom": true }
        },
        "bar": true
    })
}

/// `{ foo: { bar: 'baz', bing: { boom: true } }, bar: true }`
pub fn sample_object() -> ObjectRef {
    match Value::from_json(sample_json()) {
        Value::Object(obj) => obj,
        other => panic!("fixture produced {:?}", other.value_type()),
    }
}

pub fn sample_value() -> Value {
    Value::from(sample_object())
}

/// Chain `level0.next.next...` of `depth` objects; every link carries its
/// own `depth` number
pub fn deep_chain(depth: u32) -> ObjectRef {
    let mut current = ObjectRef::from_entries([("depth", Value::from(f64::from(depth)))]);
    for level in (0..depth).rev() {
        let parent = ObjectRef::from_entries([("depth", Value::from(f64::from(level)))]);
        parent.set("next", current);
        current = parent;
    }
    current
}

/// Object whose `settings` property is invariant and whose `cache` is an
/// ordinary property, both holding objects
pub fn frozen_config() -> (ObjectRef, ObjectRef) {
    let settings = ObjectRef::from_entries([("level", 3)]);
    let root = ObjectRef::from_entries([("cache", ObjectRef::new())]);
    root.define_property("settings", Property::frozen(settings.clone()));
    (root, settings)
}
