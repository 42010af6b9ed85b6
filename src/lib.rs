//! faqsync - Worker health and configuration synchronization
//!
//! This library probes a fleet of FAQ generation workers, resolves the AI
//! model each one reports, and keeps their shared configuration in a remote
//! key-value store with a local TTL cache. Saving a configuration change
//! fans out a cache-clear request to the affected workers.

pub mod cascade;
pub mod cli;
pub mod config;
pub mod health;
pub mod kv;
pub mod logging;
pub mod model;
pub mod registry;
pub mod sync;
