//! `KeyedStore` trait: durable string key → JSON value mapping with change
//! notification. Implementations are swappable so the repository can be
//! tested against memory and run against disk.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// Callback invoked with `(key, new_value)` after a successful write.
pub type Subscriber = Arc<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub trait KeyedStore: Send + Sync {
    /// Current value at `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `key`. Last write wins. Subscribers of `key` are
    /// notified only when the write succeeded.
    fn write(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn subscribe(&self, key: &str, callback: Subscriber) -> SubscriptionId;

    /// Returns `false` if `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl<T: KeyedStore + ?Sized> KeyedStore for &T {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn subscribe(&self, key: &str, callback: Subscriber) -> SubscriptionId {
        (**self).subscribe(key, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}

impl<T: KeyedStore + ?Sized> KeyedStore for Arc<T> {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn subscribe(&self, key: &str, callback: Subscriber) -> SubscriptionId {
        (**self).subscribe(key, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}

/// Typed access on top of the raw JSON values.
pub trait KeyedStoreExt: KeyedStore {
    fn read_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.read(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::serialization(key, e)),
            None => Ok(None),
        }
    }

    fn write_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::serialization(key, e))?;
        self.write(key, value)
    }
}

impl<S: KeyedStore + ?Sized> KeyedStoreExt for S {}

// ─── Shared helpers for implementations ──────────────────────────────

/// Subscriber registry shared by the store implementations.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, String, Subscriber)>>,
}

impl Subscribers {
    pub(crate) fn add(&self, key: &str, callback: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, key.to_string(), callback));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _, _)| *entry_id != id);
        entries.len() != before
    }

    /// Invoke every callback registered for `key`. Callbacks run outside the
    /// registry lock so they may subscribe or write themselves.
    pub(crate) fn notify(&self, key: &str, value: &Value) {
        let matching: Vec<Subscriber> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry_key, _)| entry_key == key)
            .map(|(_, _, callback)| Arc::clone(callback))
            .collect();
        for callback in matching {
            callback(key, value);
        }
    }
}

/// Serialize `value` for storage, enforcing an optional byte quota.
pub(crate) fn encode(key: &str, value: &Value, quota: Option<usize>) -> Result<String, StoreError> {
    let text = serde_json::to_string(value).map_err(|e| StoreError::serialization(key, e))?;
    match quota {
        Some(limit) if text.len() > limit => {
            tracing::warn!(key, size = text.len(), limit, "store write rejected: quota exceeded");
            Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                size: text.len(),
                limit,
            })
        }
        _ => Ok(text),
    }
}

pub(crate) fn decode(key: &str, text: &str) -> Result<Value, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::serialization(key, e))
}
