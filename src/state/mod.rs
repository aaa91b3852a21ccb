//! Printer state snapshot and active-flag store
//!
//! The state snapshot is written by an external poller; the gateway only
//! reads it. The active-flag store is read-modify-written by the finish
//! action. All writers go through one async mutex and replace the file
//! atomically.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::farm::DeviceState;
use crate::{Error, Result};

/// Last-known state of every printer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    states: HashMap<String, DeviceState>,
}

impl StateSnapshot {
    /// Build a snapshot from explicit states
    #[must_use]
    pub fn from_states<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = (S, DeviceState)>,
        S: Into<String>,
    {
        Self {
            states: states.into_iter().map(|(id, s)| (id.into(), s)).collect(),
        }
    }

    /// Parse the snapshot file format
    ///
    /// Expects `{"printers": {"<id>": {"state": ...}}}` where `state` is
    /// either the state text or an object with a `text` field. Entries
    /// without a readable state are recorded as `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        let Some(printers) = root.get("printers").and_then(Value::as_object) else {
            tracing::warn!("state snapshot has no printers object");
            return Ok(Self::default());
        };

        let states = printers
            .iter()
            .map(|(id, entry)| {
                let text = match entry.get("state") {
                    Some(Value::String(text)) => Some(text.as_str()),
                    Some(Value::Object(state)) => state.get("text").and_then(Value::as_str),
                    _ => None,
                };
                let state = text.map_or(DeviceState::Unknown, DeviceState::from_text);
                (id.clone(), state)
            })
            .collect();

        Ok(Self { states })
    }

    /// State of a printer; `Unknown` if it is not in the snapshot
    #[must_use]
    pub fn state_of(&self, id: &str) -> DeviceState {
        self.states.get(id).copied().unwrap_or(DeviceState::Unknown)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// File-backed access to the state snapshot and active flags
#[derive(Debug)]
pub struct StateStore {
    snapshot_path: PathBuf,
    active_path: PathBuf,
    writer: Mutex<()>,
}

impl StateStore {
    #[must_use]
    pub fn new(snapshot_path: impl Into<PathBuf>, active_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            active_path: active_path.into(),
            writer: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Raw snapshot file contents
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub async fn raw_snapshot(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.snapshot_path)
            .await
            .map_err(|e| {
                Error::State(format!(
                    "failed to read {}: {e}",
                    self.snapshot_path.display()
                ))
            })
    }

    /// Read and parse the state snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON
    pub async fn snapshot(&self) -> Result<StateSnapshot> {
        let text = self.raw_snapshot().await?;
        let snapshot = StateSnapshot::from_json(&text)?;
        tracing::debug!(printers = snapshot.len(), "loaded state snapshot");
        Ok(snapshot)
    }

    /// Current active flags; empty if the store does not exist yet
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub async fn active_flags(&self) -> Result<BTreeMap<String, bool>> {
        match tokio::fs::read_to_string(&self.active_path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(Error::State(format!(
                "failed to read {}: {e}",
                self.active_path.display()
            ))),
        }
    }

    /// Clear the active flag of each listed printer
    ///
    /// Printers missing from the store are not added and all other entries
    /// are left untouched. The file is only rewritten when a flag changes.
    /// Returns how many flags changed.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or written
    pub async fn clear_active(&self, ids: &[&str]) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let mut flags = self.active_flags().await?;
        let mut cleared = 0;
        for id in ids {
            if let Some(flag) = flags.get_mut(*id) {
                if *flag {
                    cleared += 1;
                }
                *flag = false;
            }
        }

        if cleared > 0 {
            write_atomic(&self.active_path, &serde_json::to_string_pretty(&flags)?).await?;
        }
        Ok(cleared)
    }
}

/// Replace a file by writing a sibling temp file and renaming it
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
