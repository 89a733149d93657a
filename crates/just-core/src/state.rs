//! Per-instance key/value cache.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::value::Value;

/// Values keyed by property name. A stored value, falsy or not, is never
/// recomputed by [`StateStore::get_or_insert_with`].
#[derive(Debug, Default)]
pub struct StateStore {
    values: RefCell<IndexMap<String, Value>>,
}

impl StateStore {
    pub fn new(initial: IndexMap<String, Value>) -> Self {
        Self {
            values: RefCell::new(initial),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    /// Returns the cached value, or computes, stores and returns `default`.
    /// `default` runs without the store borrowed and may read other keys.
    pub fn get_or_insert_with(&self, key: &str, default: impl FnOnce() -> Value) -> Value {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = default();
        self.values
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(value)
            .clone()
    }

    /// Stores `value` and returns the previous one.
    pub fn set(&self, key: &str, value: Value) -> Option<Value> {
        self.values.borrow_mut().insert(key.to_string(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.borrow_mut().shift_remove(key)
    }

    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.values.borrow().clone()
    }

    /// The whole store as a map value, handy as a render context.
    pub fn to_value(&self) -> Value {
        Value::Map(self.snapshot())
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}
