/// HTTP API Layer
///
/// This module provides the REST API endpoints for workflow management and
/// execution. It handles:
/// - Workflow registration, listing, lookup and deletion
/// - Synchronous workflow execution
/// - Mapping registry failures to HTTP status codes

// JSON error responses for registry failures
pub mod error;

// Workflow management and execution endpoints
pub mod workflows;

// Re-export router builders
pub use error::{ApiError, ApiResult};
pub use workflows::{create_workflow_routes, AppState};
