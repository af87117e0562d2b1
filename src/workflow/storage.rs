/// Filesystem persistence layer for workflow storage
///
/// Every workflow lives in `<root>/<workflow_id>/` next to its
/// `metadata.json`. The directory tree is the single source of truth; the
/// registry's in-memory map is only an index of what loaded successfully.

use crate::workflow::types::WorkflowMetadata;
use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Package marker written into the root and into each workflow directory
pub const PACKAGE_MARKER_FILE: &str = "init.lua";

/// Metadata document stored alongside each workflow's code
pub const METADATA_FILE: &str = "metadata.json";

/// Directory names starting with one of these are never scanned
const RESERVED_PREFIXES: [&str; 2] = ["__", "."];

const MAX_WORKFLOW_ID_LEN: usize = 128;

/// Directory-per-workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    root: PathBuf,
}

impl WorkflowStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory and its package marker if absent
    ///
    /// Safe to call multiple times.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create workflows directory {}", self.root.display()))?;

        let marker = self.root.join(PACKAGE_MARKER_FILE);
        if !marker.exists() {
            fs::write(&marker, "-- Automatically generated\n")
                .with_context(|| format!("Failed to write {}", marker.display()))?;
        }
        Ok(())
    }

    pub fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        self.root.join(workflow_id)
    }

    /// Whether a directory exists for this id (invalid ids never exist)
    pub fn exists(&self, workflow_id: &str) -> bool {
        is_valid_workflow_id(workflow_id) && self.workflow_dir(workflow_id).is_dir()
    }

    /// Names of all non-reserved workflow directories, sorted
    pub fn scan_workflow_ids(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read workflows directory {}", self.root.display()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };
            // Follows symlinks, matching `exists`
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping workflow directory with non UTF-8 name: {:?}", entry.file_name());
                continue;
            };
            if RESERVED_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
                continue;
            }
            ids.push(name);
        }

        ids.sort();
        Ok(ids)
    }

    /// Write code files plus the package marker, overwriting same-named files
    pub fn write_code_files(
        &self,
        workflow_id: &str,
        name: &str,
        code_files: &BTreeMap<String, String>,
    ) -> Result<()> {
        let dir = self.workflow_dir(workflow_id);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        for (filename, content) in code_files {
            let path = dir.join(filename);
            fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let marker = dir.join(PACKAGE_MARKER_FILE);
        fs::write(&marker, format!("-- Workflow: {}\n", name))
            .with_context(|| format!("Failed to write {}", marker.display()))?;

        Ok(())
    }

    /// Store the metadata document for a workflow (pretty-printed JSON)
    pub fn save_metadata(&self, metadata: &WorkflowMetadata) -> Result<()> {
        let path = self.workflow_dir(&metadata.workflow_id).join(METADATA_FILE);
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Read the metadata document for a workflow
    ///
    /// `Ok(None)` when the document does not exist; an error when it exists
    /// but cannot be read or parsed.
    pub fn get_metadata(&self, workflow_id: &str) -> Result<Option<WorkflowMetadata>> {
        if !is_valid_workflow_id(workflow_id) {
            return Ok(None);
        }

        let path = self.workflow_dir(workflow_id).join(METADATA_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let metadata: WorkflowMetadata =
            serde_json::from_str(&raw).with_context(|| format!("Malformed {}", path.display()))?;

        if metadata.workflow_id != workflow_id {
            tracing::warn!(
                "Metadata id {} does not match directory {}",
                metadata.workflow_id,
                workflow_id
            );
        }

        Ok(Some(metadata))
    }

    /// Recursively delete a workflow directory
    ///
    /// Returns `false` when there was nothing to delete.
    pub fn delete_workflow(&self, workflow_id: &str) -> Result<bool> {
        if !self.exists(workflow_id) {
            return Ok(false);
        }

        let dir = self.workflow_dir(workflow_id);
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to delete {}", dir.display()))?;
        Ok(true)
    }
}

/// Ids double as directory names, so they are restricted to a safe alphabet
pub fn is_valid_workflow_id(workflow_id: &str) -> bool {
    !workflow_id.is_empty()
        && workflow_id.len() <= MAX_WORKFLOW_ID_LEN
        && !RESERVED_PREFIXES.iter().any(|prefix| workflow_id.starts_with(prefix))
        && workflow_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Code file names must stay inside the workflow directory
pub fn is_valid_file_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && filename != METADATA_FILE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, WorkflowStorage) {
        let tmp = TempDir::new().unwrap();
        let storage = WorkflowStorage::new(tmp.path().join("workflows"));
        storage.ensure_root().unwrap();
        (tmp, storage)
    }

    #[test]
    fn ensure_root_creates_marker_once() {
        let (_tmp, storage) = storage();
        let marker = storage.root().join(PACKAGE_MARKER_FILE);
        assert!(marker.is_file());

        fs::write(&marker, "-- edited\n").unwrap();
        storage.ensure_root().unwrap();
        assert_eq!(fs::read_to_string(marker).unwrap(), "-- edited\n");
    }

    #[test]
    fn scan_skips_reserved_and_plain_files() {
        let (_tmp, storage) = storage();
        for dir in ["beta", "alpha", "__pycache__", ".git"] {
            fs::create_dir(storage.root().join(dir)).unwrap();
        }
        fs::write(storage.root().join("stray.lua"), "").unwrap();

        assert_eq!(storage.scan_workflow_ids().unwrap(), vec!["alpha", "beta"]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_symlinked_workflow_directories() {
        let (tmp, storage) = storage();
        let target = tmp.path().join("elsewhere");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, storage.root().join("linked")).unwrap();

        assert!(storage.exists("linked"));
        assert_eq!(storage.scan_workflow_ids().unwrap(), vec!["linked"]);
    }

    #[test]
    fn metadata_is_persisted_as_pretty_json() {
        let (_tmp, storage) = storage();
        storage.write_code_files("wf", "Demo", &BTreeMap::new()).unwrap();
        let metadata = WorkflowMetadata::new("wf", "Demo");
        storage.save_metadata(&metadata).unwrap();

        let raw = fs::read_to_string(storage.workflow_dir("wf").join(METADATA_FILE)).unwrap();
        assert!(raw.contains("\n  \"workflow_id\": \"wf\""));
        assert_eq!(storage.get_metadata("wf").unwrap(), Some(metadata));
    }

    #[test]
    fn missing_metadata_is_none_and_malformed_is_error() {
        let (_tmp, storage) = storage();
        assert!(storage.get_metadata("ghost").unwrap().is_none());

        fs::create_dir(storage.workflow_dir("broken")).unwrap();
        fs::write(storage.workflow_dir("broken").join(METADATA_FILE), "{not json").unwrap();
        assert!(storage.get_metadata("broken").is_err());
    }

    #[test]
    fn write_code_files_adds_marker_and_overwrites() {
        let (_tmp, storage) = storage();
        let mut files = BTreeMap::new();
        files.insert("main.lua".to_string(), "-- v1".to_string());
        storage.write_code_files("wf", "Demo", &files).unwrap();

        files.insert("main.lua".to_string(), "-- v2".to_string());
        storage.write_code_files("wf", "Demo", &files).unwrap();

        let dir = storage.workflow_dir("wf");
        assert_eq!(fs::read_to_string(dir.join("main.lua")).unwrap(), "-- v2");
        assert_eq!(fs::read_to_string(dir.join(PACKAGE_MARKER_FILE)).unwrap(), "-- Workflow: Demo\n");
    }

    #[test]
    fn delete_reports_absence() {
        let (_tmp, storage) = storage();
        storage.write_code_files("wf", "Demo", &BTreeMap::new()).unwrap();

        assert!(storage.delete_workflow("wf").unwrap());
        assert!(!storage.workflow_dir("wf").exists());
        assert!(!storage.delete_workflow("wf").unwrap());
    }

    #[test]
    fn workflow_id_rules() {
        assert!(is_valid_workflow_id("3f2b6a1e-9c1d-4b7e-8a2f-0d1c2b3a4f5e"));
        assert!(is_valid_workflow_id("report_v2"));
        assert!(!is_valid_workflow_id(""));
        assert!(!is_valid_workflow_id("../etc"));
        assert!(!is_valid_workflow_id("a/b"));
        assert!(!is_valid_workflow_id("__init__"));
        assert!(!is_valid_workflow_id(&"x".repeat(129)));
    }

    #[test]
    fn file_name_rules() {
        assert!(is_valid_file_name("main.lua"));
        assert!(is_valid_file_name("helpers.lua"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("../main.lua"));
        assert!(!is_valid_file_name("sub/main.lua"));
        assert!(!is_valid_file_name(".hidden"));
        assert!(!is_valid_file_name(METADATA_FILE));
    }
}
