use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::app::Result;
use crate::store::{Notifier, Store};

/// Process-local store, used by tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
    notifier: Notifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        {
            let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
            values.insert(key.to_string(), value.clone());
        }
        self.notifier.notify(key, value);
        Ok(())
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Value> {
        self.notifier.subscribe(key)
    }
}
