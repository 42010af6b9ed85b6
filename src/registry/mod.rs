//! Worker Registry module.
//!
//! Provides thread-safe in-memory storage and lookup of configured workers.

mod error;
mod worker;

pub use error::*;
pub use worker::*;

use dashmap::DashMap;

/// The Worker Registry stores every configured worker endpoint.
///
/// Backed by a concurrent map so probes and cascades can read it from
/// many tasks at once.
///
/// # Examples
///
/// ```
/// use faqsync::registry::{Registry, WorkerEndpoint};
///
/// let registry = Registry::new();
/// let worker = WorkerEndpoint::new(
///     "answer_generator",
///     "https://answers.example.workers.dev/",
///     true,
///     100,
/// );
///
/// registry.add_worker(worker).unwrap();
/// assert_eq!(registry.worker_count(), 1);
/// assert_eq!(
///     registry.base_url("answer_generator").as_deref(),
///     Some("https://answers.example.workers.dev")
/// );
/// ```
#[derive(Default)]
pub struct Registry {
    workers: DashMap<String, WorkerEndpoint>,
}

impl Registry {
    /// Create a new empty Registry.
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Build a registry from config file worker entries.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateWorker` if two entries share an id.
    pub fn from_configs(configs: &[crate::config::WorkerConfig]) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for config in configs {
            registry.add_worker(WorkerEndpoint::from(config))?;
            tracing::debug!(
                worker_id = %config.id,
                url = %config.url,
                enabled = config.enabled,
                "Loaded worker from config"
            );
        }
        Ok(registry)
    }

    /// Add a new worker to the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateWorker` if a worker with the same id already exists.
    pub fn add_worker(&self, worker: WorkerEndpoint) -> Result<(), RegistryError> {
        if self.workers.contains_key(&worker.id) {
            return Err(RegistryError::DuplicateWorker(worker.id));
        }
        self.workers.insert(worker.id.clone(), worker);
        Ok(())
    }

    /// Get a worker by id.
    pub fn get_worker(&self, id: &str) -> Option<WorkerEndpoint> {
        self.workers.get(id).map(|entry| entry.value().clone())
    }

    /// Get all workers, ordered by id.
    pub fn get_all_workers(&self) -> Vec<WorkerEndpoint> {
        let mut workers: Vec<_> = self
            .workers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        workers
    }

    /// Base URL of a worker, or `None` when unknown or unconfigured.
    pub fn base_url(&self, id: &str) -> Option<String> {
        self.workers
            .get(id)
            .filter(|entry| entry.has_url())
            .map(|entry| entry.base_url.clone())
    }

    /// Get the number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
