use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use opentelemetry::{Key, KeyValue, Value};

/// Process-wide attributes stamped on every span the SDK starts. Writes
/// merge by key, so later values replace earlier ones.
#[derive(Clone, Default)]
pub struct AttributeStore {
    inner: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        AttributeStore::default()
    }

    pub fn set_global_attributes<I>(&self, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        let mut store = self.inner.lock().unwrap();
        for attribute in attributes {
            store.insert(attribute.key.as_str().to_string(), attribute.value);
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    pub fn snapshot(&self) -> Vec<KeyValue> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|(key, value)| KeyValue::new(Key::from(key.clone()), value.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
