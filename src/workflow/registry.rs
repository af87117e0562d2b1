/// Hot-reload workflow registry using ArcSwap
///
/// Maps workflow ids to loaded Lua plugins. Loading, registering and deleting
/// swap in a fresh copy of the map, so an `execute` that already holds an
/// entry keeps running against the version it started with.
///
/// Writers go through `ArcSwap::rcu`, so concurrent updates to different ids
/// never drop each other. Two concurrent loads of the same id still race and
/// the last one wins.

use crate::{
    runtime::lua::LuaPlugin,
    workflow::{
        error::{LoadError, RegistryError},
        storage::{is_valid_file_name, is_valid_workflow_id, WorkflowStorage},
        types::{WorkflowMetadata, WorkflowOutput},
    },
};
use anyhow::Result;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// A workflow whose entry point is loaded and ready to execute
#[derive(Debug)]
pub struct LoadedWorkflow {
    pub workflow_id: String,
    plugin: LuaPlugin,
    pub loaded_at: DateTime<Utc>,
}

/// Workflow registry backed by a directory tree
#[derive(Debug)]
pub struct WorkflowRegistry {
    /// Key: workflow_id, Value: loaded plugin
    workflows: ArcSwap<HashMap<String, Arc<LoadedWorkflow>>>,

    storage: WorkflowStorage,
}

impl WorkflowRegistry {
    /// Create an empty registry over the given storage
    ///
    /// Nothing is loaded until [`init_from_storage`](Self::init_from_storage).
    pub fn new(storage: WorkflowStorage) -> Self {
        Self {
            workflows: ArcSwap::new(Arc::new(HashMap::new())),
            storage,
        }
    }

    /// Ensure the root exists and load every workflow found under it
    ///
    /// Individual load failures are logged and skipped. Only failing to
    /// create or read the root itself is an error. Returns the number of
    /// workflows loaded.
    pub fn init_from_storage(&self) -> Result<usize> {
        self.storage.ensure_root()?;

        let ids = self.storage.scan_workflow_ids()?;
        let loaded = ids.iter().filter(|id| self.load(id)).count();

        tracing::info!(
            "Initialized workflow registry with {} of {} workflows from {}",
            loaded,
            ids.len(),
            self.storage.root().display()
        );

        Ok(loaded)
    }

    /// Load (or reload) a workflow's entry point
    ///
    /// On failure the previous in-memory entry, if any, is left untouched.
    pub fn load(&self, workflow_id: &str) -> bool {
        match self.try_load(workflow_id) {
            Ok(loaded) => {
                let loaded = Arc::new(loaded);
                // rcu retries on contention, so concurrent loads of other ids survive
                self.workflows.rcu(|current| {
                    let mut next = (**current).clone();
                    next.insert(workflow_id.to_string(), Arc::clone(&loaded));
                    next
                });

                tracing::info!("Successfully loaded workflow: {}", workflow_id);
                true
            }
            Err(e) => {
                tracing::error!("Error loading workflow {}: {}", workflow_id, e);
                false
            }
        }
    }

    fn try_load(&self, workflow_id: &str) -> Result<LoadedWorkflow, LoadError> {
        if !self.storage.exists(workflow_id) {
            return Err(LoadError::DirectoryMissing(
                self.storage.workflow_dir(workflow_id).display().to_string(),
            ));
        }

        let plugin = LuaPlugin::load(&self.storage.workflow_dir(workflow_id))?;
        Ok(LoadedWorkflow {
            workflow_id: workflow_id.to_string(),
            plugin,
            loaded_at: Utc::now(),
        })
    }

    /// Write a workflow to disk and load it
    ///
    /// Generates a UUID v4 when `workflow_id` is `None`. Re-registering an
    /// existing id overwrites its files and reloads it. If the load fails the
    /// written files stay on disk so a corrected registration can replace them.
    pub fn register(
        &self,
        workflow_id: Option<String>,
        name: &str,
        code_files: &BTreeMap<String, String>,
    ) -> Result<WorkflowMetadata, RegistryError> {
        let workflow_id = workflow_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if !is_valid_workflow_id(&workflow_id) {
            return Err(RegistryError::InvalidWorkflowId(workflow_id));
        }
        if let Some(bad) = code_files.keys().find(|f| !is_valid_file_name(f)) {
            return Err(RegistryError::InvalidFileName(bad.clone()));
        }

        let registration_failed = |reason: String| {
            tracing::error!("Error registering workflow {}: {}", workflow_id, reason);
            RegistryError::Registration {
                workflow_id: workflow_id.clone(),
                reason,
            }
        };

        let metadata = WorkflowMetadata::new(&workflow_id, name);
        self.storage
            .write_code_files(&workflow_id, name, code_files)
            .and_then(|_| self.storage.save_metadata(&metadata))
            .map_err(|e| registration_failed(format!("{:#}", e)))?;

        if !self.load(&workflow_id) {
            return Err(registration_failed("workflow entry point failed to load".to_string()));
        }

        tracing::info!("Registered workflow: {} ({})", workflow_id, name);
        Ok(metadata)
    }

    /// Run a workflow's entry function with `inputs` on the calling thread
    ///
    /// Loads the workflow first if it is not in memory. The return value is
    /// normalized with [`WorkflowOutput::normalize`].
    pub fn execute(
        &self,
        workflow_id: &str,
        inputs: Map<String, Value>,
    ) -> Result<Map<String, Value>, RegistryError> {
        let workflow = match self.get_loaded(workflow_id) {
            Some(workflow) => workflow,
            None => {
                if !self.load(workflow_id) {
                    return Err(RegistryError::NotFound(workflow_id.to_string()));
                }
                self.get_loaded(workflow_id)
                    .ok_or_else(|| RegistryError::NotFound(workflow_id.to_string()))?
            }
        };

        tracing::debug!(
            "🚀 Executing workflow {} (loaded at {})",
            workflow.workflow_id,
            workflow.loaded_at
        );

        let value = workflow.plugin.call(&inputs).map_err(|message| {
            tracing::error!("Error executing workflow {}: {}", workflow_id, message);
            RegistryError::Execution {
                workflow_id: workflow_id.to_string(),
                message,
            }
        })?;

        Ok(WorkflowOutput::normalize(workflow_id, value))
    }

    /// Metadata of every workflow on disk, loaded or not
    ///
    /// Ordered by creation time, then id. Workflows with missing or
    /// unreadable metadata are skipped with a warning.
    pub fn list_all(&self) -> Vec<WorkflowMetadata> {
        let ids = match self.storage.scan_workflow_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Error scanning workflows: {:#}", e);
                return Vec::new();
            }
        };

        let mut workflows: Vec<WorkflowMetadata> = ids
            .iter()
            .filter_map(|id| match self.storage.get_metadata(id) {
                Ok(Some(metadata)) => Some(metadata),
                Ok(None) => {
                    tracing::warn!("Skipping workflow {} without metadata", id);
                    None
                }
                Err(e) => {
                    tracing::warn!("Error reading metadata for workflow {}: {:#}", id, e);
                    None
                }
            })
            .collect();

        workflows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.workflow_id.cmp(&b.workflow_id))
        });
        workflows
    }

    /// Metadata read straight from disk, regardless of load state
    pub fn get_metadata(&self, workflow_id: &str) -> Option<WorkflowMetadata> {
        match self.storage.get_metadata(workflow_id) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!("Error reading metadata for workflow {}: {:#}", workflow_id, e);
                None
            }
        }
    }

    /// Remove a workflow from memory and delete its directory
    ///
    /// Returns `false` if the directory does not exist or cannot be removed.
    /// The two removals are not atomic; a restart rescans disk either way.
    pub fn delete(&self, workflow_id: &str) -> bool {
        if !self.storage.exists(workflow_id) {
            tracing::warn!("Workflow directory does not exist: {}", workflow_id);
            return false;
        }

        self.workflows.rcu(|current| {
            let mut next = (**current).clone();
            next.remove(workflow_id);
            next
        });

        match self.storage.delete_workflow(workflow_id) {
            Ok(deleted) => {
                if deleted {
                    tracing::info!("Successfully deleted workflow: {}", workflow_id);
                }
                deleted
            }
            Err(e) => {
                tracing::error!("Error deleting workflow {}: {:#}", workflow_id, e);
                false
            }
        }
    }

    /// Whether a workflow is currently loaded and executable
    pub fn is_loaded(&self, workflow_id: &str) -> bool {
        self.workflows.load().contains_key(workflow_id)
    }

    /// Ids of all loaded workflows, sorted
    pub fn loaded_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workflows.load().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get_loaded(&self, workflow_id: &str) -> Option<Arc<LoadedWorkflow>> {
        self.workflows.load().get(workflow_id).cloned()
    }
}
