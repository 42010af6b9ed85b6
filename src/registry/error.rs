/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("worker already exists: {0}")]
    DuplicateWorker(String),

    #[error("unknown worker type: {0}")]
    UnknownWorkerType(String),
}
