pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::app::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Buffered notifications per key before slow subscribers start lagging.
const NOTIFY_CAPACITY: usize = 16;

/// Key-value persistence with per-key change notification.
///
/// Values are JSON documents. A successful `set_raw` notifies every
/// receiver obtained from `subscribe` for that key with the new value.
pub trait Store: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<Value>>;
    fn set_raw(&self, key: &str, value: Value) -> Result<()>;
    fn subscribe(&self, key: &str) -> broadcast::Receiver<Value>;
}

/// Typed access on top of [`Store`].
pub trait StoreExt: Store {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_raw(key, serde_json::to_value(value)?)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Fan-out of write notifications, shared by the store implementations.
#[derive(Default)]
pub struct Notifier {
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
}

impl Notifier {
    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<Value> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(NOTIFY_CAPACITY).0)
            .subscribe()
    }

    pub fn notify(&self, key: &str, value: Value) {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = channels.get(key) {
            // No live receivers is not an error
            let _ = tx.send(value);
        }
    }
}
