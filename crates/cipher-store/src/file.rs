//! On-disk `KeyedStore`: one `<key>.json` file per key under a directory.
//!
//! Writes go to a temp file in the same directory, are fsynced, then renamed
//! over the target, so a crash leaves either the old or the new value.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::StoreError;
use crate::keyed::{KeyedStore, Subscriber, Subscribers, SubscriptionId, decode, encode};

pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
    subscribers: Subscribers,
}

impl FileStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "file store opened");
        Ok(Self {
            dir,
            quota: None,
            subscribers: Subscribers::default(),
        })
    }

    #[must_use]
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys become file names, so they are limited to a portable character set.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let portable = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if portable {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "store path has no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

impl KeyedStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode(key, &text).map(Some).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "stored value is not valid JSON");
        })
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let text = encode(key, &value, self.quota)?;
        write_atomic(&path, &text)?;
        tracing::debug!(key, bytes = text.len(), "store write");
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
