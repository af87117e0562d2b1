/// Error taxonomy for the workflow registry
///
/// Load failures never escape the registry as errors (they are logged and
/// reported as `false`), but they are typed here so the cause can be logged
/// and tested precisely.

use thiserror::Error;

/// Why a workflow could not be loaded into memory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workflow directory does not exist: {0}")]
    DirectoryMissing(String),

    #[error("entry point file is missing: {0}")]
    EntryPointMissing(String),

    #[error("failed to read entry point: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry point failed to load: {0}")]
    Script(String),

    #[error("entry point does not define a `{0}` function")]
    EntryFunctionMissing(&'static str),
}

/// Domain errors surfaced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Invalid workflow id: {0}")]
    InvalidWorkflowId(String),

    #[error("Invalid code file name: {0}")]
    InvalidFileName(String),

    /// The entry function raised, or returned something that is not JSON
    #[error("{message}")]
    Execution { workflow_id: String, message: String },

    /// Files may already be on disk when this is returned; nothing is rolled back
    #[error("Failed to register workflow {workflow_id}: {reason}")]
    Registration { workflow_id: String, reason: String },
}
