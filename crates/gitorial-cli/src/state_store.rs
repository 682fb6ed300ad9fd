//! Saved tutorial positions, kept in a JSON file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gitorial::{GitorialError, SavedPosition, StateStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One tutorial's entry in the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub step_id: String,
    #[serde(default)]
    pub showing_solution: bool,
    pub updated_at: DateTime<Utc>,
}

/// [`StateStore`] backed by a JSON object mapping tutorial id to [`StateRecord`].
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/gitorial/state.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("gitorial").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, StateRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file {}", self.path.display()))?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data)
            .with_context(|| format!("invalid state data in {}", self.path.display()))
    }

    fn write(&self, records: &BTreeMap<String, StateRecord>) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create state directory {}", dir.display()))?;
        }
        let data =
            serde_json::to_string_pretty(records).context("failed to serialize tutorial state")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write state file {}", self.path.display()))
    }
}

fn store_error(err: anyhow::Error) -> GitorialError {
    GitorialError::Store(format!("{:#}", err))
}

impl StateStore for JsonStateStore {
    fn get(&self, tutorial_id: &str) -> gitorial::Result<Option<SavedPosition>> {
        let records = self.read().map_err(store_error)?;
        Ok(records.get(tutorial_id).map(|r| {
            SavedPosition::new(r.step_id.clone()).with_solution(r.showing_solution)
        }))
    }

    fn set(&mut self, tutorial_id: &str, position: &SavedPosition) -> gitorial::Result<()> {
        let mut records = self.read().map_err(store_error)?;
        records.insert(
            tutorial_id.to_string(),
            StateRecord {
                step_id: position.step_id.clone(),
                showing_solution: position.showing_solution,
                updated_at: Utc::now(),
            },
        );
        self.write(&records).map_err(store_error)
    }

    fn clear(&mut self, tutorial_id: &str) -> gitorial::Result<()> {
        let mut records = self.read().map_err(store_error)?;
        if records.remove(tutorial_id).is_some() {
            self.write(&records).map_err(store_error)?;
        }
        Ok(())
    }
}
