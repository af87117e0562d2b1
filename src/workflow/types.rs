/// Core workflow type definitions
///
/// `WorkflowMetadata` is the document persisted as `metadata.json` next to a
/// workflow's code. `WorkflowDefinition` is the shape served over HTTP, and
/// `WorkflowOutput` normalizes whatever a workflow's entry function returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted record for one workflow (`<root>/<workflow_id>/metadata.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Unique id; equal to the directory name
    pub workflow_id: String,
    /// Human-readable workflow name
    pub name: String,
    /// ISO-8601 creation timestamp, refreshed on every registration
    pub created_at: String,
}

impl WorkflowMetadata {
    /// Build a metadata record stamped with the current time
    pub fn new(workflow_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            name: name.into(),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        }
    }
}

/// Workflow description returned by the HTTP API
///
/// `input_schema` is part of the public shape but nothing populates it yet,
/// so it is always an empty object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<WorkflowMetadata> for WorkflowDefinition {
    fn from(metadata: WorkflowMetadata) -> Self {
        Self {
            workflow_id: metadata.workflow_id,
            name: metadata.name,
            description: None,
            input_schema: Map::new(),
            created_at: Some(metadata.created_at),
        }
    }
}

/// Canonical execution envelope
pub struct WorkflowOutput;

impl WorkflowOutput {
    pub const DEFAULT_STATUS: &'static str = "completed";

    /// Shape an entry function's return value into an output object
    ///
    /// Objects keep their keys, get `workflow_id` overwritten, and receive
    /// `node_results: []` and `status: "completed"` when those are missing.
    /// Anything else is wrapped as `result` inside a fresh envelope.
    pub fn normalize(workflow_id: &str, value: Value) -> Map<String, Value> {
        match value {
            Value::Object(mut output) => {
                output.insert("workflow_id".to_string(), Value::String(workflow_id.to_string()));

                // An empty Lua table arrives as `{}`; node results are always a list
                let needs_default = match output.get("node_results") {
                    None => true,
                    Some(Value::Object(map)) => map.is_empty(),
                    Some(_) => false,
                };
                if needs_default {
                    output.insert("node_results".to_string(), Value::Array(Vec::new()));
                }

                output
                    .entry("status")
                    .or_insert_with(|| Value::String(Self::DEFAULT_STATUS.to_string()));
                output
            }
            other => {
                let mut output = Map::new();
                output.insert("workflow_id".to_string(), Value::String(workflow_id.to_string()));
                output.insert("status".to_string(), Value::String(Self::DEFAULT_STATUS.to_string()));
                output.insert("node_results".to_string(), Value::Array(Vec::new()));
                output.insert("result".to_string(), other);
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_value_is_wrapped_in_envelope() {
        let out = WorkflowOutput::normalize("wf-1", json!(42));
        assert_eq!(
            Value::Object(out),
            json!({"workflow_id": "wf-1", "status": "completed", "node_results": [], "result": 42})
        );
    }

    #[test]
    fn null_is_wrapped_too() {
        let out = WorkflowOutput::normalize("wf-1", Value::Null);
        assert_eq!(out["result"], Value::Null);
        assert_eq!(out["status"], "completed");
    }

    #[test]
    fn object_gets_defaults_and_keeps_status() {
        let out = WorkflowOutput::normalize("wf-1", json!({"status": "done"}));
        assert_eq!(
            Value::Object(out),
            json!({"workflow_id": "wf-1", "status": "done", "node_results": []})
        );
    }

    #[test]
    fn object_workflow_id_is_overwritten() {
        let out = WorkflowOutput::normalize("wf-1", json!({"workflow_id": "other", "final_report": "ok"}));
        assert_eq!(out["workflow_id"], "wf-1");
        assert_eq!(out["final_report"], "ok");
    }

    #[test]
    fn existing_node_results_are_preserved() {
        let out = WorkflowOutput::normalize("wf-1", json!({"node_results": [{"node": "a"}]}));
        assert_eq!(out["node_results"], json!([{"node": "a"}]));
    }

    #[test]
    fn empty_table_node_results_become_a_list() {
        let out = WorkflowOutput::normalize("wf-1", json!({"node_results": {}}));
        assert_eq!(out["node_results"], json!([]));
    }

    #[test]
    fn definition_from_metadata_has_empty_schema() {
        let def = WorkflowDefinition::from(WorkflowMetadata {
            workflow_id: "wf-1".into(),
            name: "Demo".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        });
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(
            json,
            json!({
                "workflow_id": "wf-1",
                "name": "Demo",
                "input_schema": {},
                "created_at": "2024-01-01T00:00:00Z"
            })
        );
    }
}
