use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::Question;

use super::state::{Phase, SessionState};

/// The durable record that lets a live interview survive an app restart.
/// One JSON object under one well-known file in the app data dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySnapshot {
    pub candidate_id: String,
    pub queue: Vec<Question>,
    pub current_index: usize,
    pub remaining_secs: u64,
    pub phase: Phase,
    pub total_score: i64,
}

impl RecoverySnapshot {
    /// Only a live run is worth recovering; any other phase yields nothing.
    pub fn capture(state: &SessionState) -> Option<Self> {
        if !matches!(state.phase, Phase::Running | Phase::Paused) {
            return None;
        }
        let candidate_id = state.active_candidate_id.clone()?;
        Some(Self {
            candidate_id,
            queue: state.queue.clone(),
            current_index: state.current_index,
            remaining_secs: state.remaining_secs,
            phase: state.phase,
            total_score: state.total_score,
        })
    }
}

#[derive(Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A snapshot that cannot be read or parsed is treated as absent.
    pub fn load(&self) -> Option<RecoverySnapshot> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("Ignoring unreadable recovery snapshot: {err}");
                None
            }
        }
    }

    pub fn save(&self, snapshot: &RecoverySnapshot) -> Result<()> {
        let serialized = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write snapshot to {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove snapshot {}", self.path.display()))?;
        }
        Ok(())
    }
}
