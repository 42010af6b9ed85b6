//! In-process store used for dry runs and tests.

use super::{stamp_audit_fields, ConfigurationStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A [`ConfigurationStore`] backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryStore {
    values: DashMap<String, Value>,
    updated_by: String,
    configured: bool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            updated_by: "faqsync".to_string(),
            configured: true,
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// A store that behaves as if credentials were missing.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Make subsequent writes fail with a transport error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes and deletes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored value without audit checks or precondition.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.configured {
            Ok(())
        } else {
            Err(StoreError::NotConfigured("memory store has no credentials".to_string()))
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationStore for MemoryStore {
    async fn get(&self, key: &str, _force_refresh: bool) -> Result<Option<Value>, StoreError> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.check_write()?;
        self.values
            .insert(key.to_string(), stamp_audit_fields(value, &self.updated_by));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.values.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
