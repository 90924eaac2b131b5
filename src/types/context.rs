use serde_json::Value;
use std::collections::HashMap;

/// Request-scoped resolver for `#name` indirection in condition values and
/// field defaults.
pub trait Context: Send + Sync {
    fn value_for(&self, key: &str) -> Option<Value>;
}

/// A context backed by a plain map.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    values: HashMap<String, Value>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl Context for MapContext {
    fn value_for(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Resolve a `#name` string through the context. Anything else, including an
/// indirection the context doesn't know, is returned unchanged so the field's
/// own conversion can handle it (timestamps understand `#now`).
pub fn resolve_indirection(value: &Value, context: &dyn Context) -> Value {
    if let Some(name) = value.as_str().and_then(|s| s.strip_prefix('#')) {
        if !name.is_empty() {
            if let Some(resolved) = context.value_for(name) {
                return resolved;
            }
        }
    }
    value.clone()
}
