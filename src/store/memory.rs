use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ObjectStore;
use crate::error::{Error, Result};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-memory store, useful for tests and for embedding the pipeline.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<Buckets>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object, creating the bucket if needed.
    pub fn put_object(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.into());
    }

    /// Create an empty bucket.
    pub fn create_bucket(&self, bucket: &str) {
        self.lock().entry(bucket.to_string()).or_default();
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStore {
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .ok_or_else(|| Error::store("list", bucket, "", "no such bucket"))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.lock()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| Error::store("get", bucket, key, "no such key"))
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let mut buckets = self.lock();
        let body = buckets
            .get(src_bucket)
            .and_then(|objects| objects.get(src_key))
            .cloned()
            .ok_or_else(|| Error::store("copy", src_bucket, src_key, "no such key"))?;
        let dst = buckets
            .get_mut(dst_bucket)
            .ok_or_else(|| Error::store("copy", dst_bucket, dst_key, "no such bucket"))?;
        dst.insert(dst_key.to_string(), body);
        Ok(())
    }
}
