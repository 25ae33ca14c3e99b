//! In-memory `KeyedStore`. Values are kept in serialized form so quota and
//! serialization behave exactly as they do on disk.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::error::StoreError;
use crate::keyed::{KeyedStore, Subscriber, Subscribers, SubscriptionId, decode, encode};

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose serialized form exceeds `limit` bytes.
    #[must_use]
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }
}

impl KeyedStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).map(|text| decode(key, text)).transpose()
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let text = encode(key, &value, self.quota)?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), text);
        self.subscribers.notify(key, &value);
        Ok(())
    }

    fn subscribe(&self, key: &str, callback: Subscriber) -> SubscriptionId {
        self.subscribers.add(key, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}
