/// Workflow Management Layer
///
/// This module handles workflow definitions, on-disk persistence, and the
/// in-memory registry of loaded plugins:
/// - Type definitions (WorkflowMetadata, WorkflowDefinition, WorkflowOutput)
/// - Directory-per-workflow storage with JSON metadata documents
/// - Hot-reload registry using ArcSwap

// Error taxonomy for load, execution and registration failures
pub mod error;

// Core workflow type definitions
pub mod types;

// Filesystem persistence layer for workflow storage
pub mod storage;

// Hot-reload registry of loaded workflow plugins
pub mod registry;

// Re-export commonly used types
pub use error::{LoadError, RegistryError};
pub use registry::WorkflowRegistry;
pub use storage::WorkflowStorage;
pub use types::{WorkflowDefinition, WorkflowMetadata, WorkflowOutput};
