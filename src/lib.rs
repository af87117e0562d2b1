/// Flowdock: HTTP host for pluggable Lua workflows
///
/// Clients upload a workflow's source files, list and fetch workflow metadata,
/// and execute a workflow by id with arbitrary JSON inputs. The workflow
/// registry treats a directory tree as its plugin store and loads each
/// workflow's entry point into an embedded Lua interpreter.

// Core configuration and setup
pub mod config;

// Workflow management layer - metadata, on-disk storage, and registry
pub mod workflow;

// Plugin runtime - embedded Lua host for workflow entry points
pub mod runtime;

// HTTP API layer - REST endpoints for workflow management and execution
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use workflow::{RegistryError, WorkflowMetadata, WorkflowRegistry, WorkflowStorage};
pub use server::{build_router, create_app, start_server};
