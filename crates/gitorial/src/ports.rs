//! Collaborators the core talks to: version control and saved position.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::types::RawCommit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            FileChangeKind::Added => "A",
            FileChangeKind::Modified => "M",
            FileChangeKind::Deleted => "D",
            FileChangeKind::Renamed => "R",
        };
        f.write_str(marker)
    }
}

/// A file that differs between two refs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub kind: FileChangeKind,
}

/// Access to the repository a tutorial lives in.
pub trait VersionControl {
    /// Commits reachable from `branch`, newest first.
    fn list_commits(&self, branch: &str) -> Result<Vec<RawCommit>>;

    /// Make the working tree match `reference`.
    fn checkout(&self, reference: &str) -> Result<()>;

    /// Files that differ between `from` and `to`.
    fn diff(&self, from: &str, to: &str) -> Result<Vec<FileChange>>;
}

/// The last position reached in a tutorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub step_id: String,
    /// Whether the active template's solution was revealed.
    #[serde(default)]
    pub showing_solution: bool,
}

impl SavedPosition {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            showing_solution: false,
        }
    }

    pub fn with_solution(mut self, showing_solution: bool) -> Self {
        self.showing_solution = showing_solution;
        self
    }
}

/// Where the last position of each tutorial is kept.
pub trait StateStore {
    fn get(&self, tutorial_id: &str) -> Result<Option<SavedPosition>>;

    fn set(&mut self, tutorial_id: &str, position: &SavedPosition) -> Result<()>;

    fn clear(&mut self, tutorial_id: &str) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for &mut T {
    fn get(&self, tutorial_id: &str) -> Result<Option<SavedPosition>> {
        (**self).get(tutorial_id)
    }

    fn set(&mut self, tutorial_id: &str, position: &SavedPosition) -> Result<()> {
        (**self).set(tutorial_id, position)
    }

    fn clear(&mut self, tutorial_id: &str) -> Result<()> {
        (**self).clear(tutorial_id)
    }
}

/// In-process [`StateStore`]; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    entries: HashMap<String, SavedPosition>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, tutorial_id: impl Into<String>, position: SavedPosition) -> Self {
        self.entries.insert(tutorial_id.into(), position);
        self
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, tutorial_id: &str) -> Result<Option<SavedPosition>> {
        Ok(self.entries.get(tutorial_id).cloned())
    }

    fn set(&mut self, tutorial_id: &str, position: &SavedPosition) -> Result<()> {
        self.entries.insert(tutorial_id.to_string(), position.clone());
        Ok(())
    }

    fn clear(&mut self, tutorial_id: &str) -> Result<()> {
        self.entries.remove(tutorial_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStateStore::new();
        assert_eq!(store.get("t").unwrap(), None);

        store.set("t", &SavedPosition::new("s2")).unwrap();
        assert_eq!(store.get("t").unwrap(), Some(SavedPosition::new("s2")));

        let revealed = SavedPosition::new("s3").with_solution(true);
        store.set("t", &revealed).unwrap();
        assert_eq!(store.get("t").unwrap(), Some(revealed));

        store.clear("t").unwrap();
        assert_eq!(store.get("t").unwrap(), None);
    }

    #[test]
    fn test_memory_store_keys_are_independent() {
        let mut store = MemoryStateStore::new().with_entry("a", SavedPosition::new("s1"));
        store.set("b", &SavedPosition::new("s9")).unwrap();
        store.clear("b").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(SavedPosition::new("s1")));
    }

    fn remember<S: StateStore>(mut store: S) {
        store.set("t", &SavedPosition::new("s1")).unwrap();
    }

    #[test]
    fn test_store_through_mut_ref() {
        let mut store = MemoryStateStore::new();
        remember(&mut store);
        assert_eq!(store.get("t").unwrap().map(|p| p.step_id).as_deref(), Some("s1"));
    }

    #[test]
    fn test_saved_position_without_flag_deserializes() {
        let position: SavedPosition = serde_json::from_str(r#"{"step_id":"s1"}"#).unwrap();
        assert_eq!(position, SavedPosition::new("s1"));
    }

    #[test]
    fn test_file_change_kind_display() {
        assert_eq!(FileChangeKind::Added.to_string(), "A");
        assert_eq!(FileChangeKind::Modified.to_string(), "M");
        assert_eq!(FileChangeKind::Deleted.to_string(), "D");
        assert_eq!(FileChangeKind::Renamed.to_string(), "R");
    }
}
