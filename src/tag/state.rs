//! JSON file record of tags selected by previous runs

use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::tag::error::StateError;
use crate::tag::types::{Category, Emission};

/// Tags already emitted per category.
///
/// Serialized as `{ "arm64": [...], "amd64": [...], "multi": [...] }`. The
/// `tags` key is only written by the plain mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorState {
    pub arm64: BTreeSet<String>,
    pub amd64: BTreeSet<String>,
    pub multi: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl PriorState {
    pub fn tags_for(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Arm64 => &self.arm64,
            Category::Amd64 => &self.amd64,
            Category::Multi => &self.multi,
            Category::Tags => &self.tags,
        }
    }

    fn tags_for_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Arm64 => &mut self.arm64,
            Category::Amd64 => &mut self.amd64,
            Category::Multi => &mut self.multi,
            Category::Tags => &mut self.tags,
        }
    }

    /// Union this run's selection into the record. Never removes tags.
    pub fn record(&mut self, emission: &Emission) {
        for (category, tags) in emission.entries() {
            self.tags_for_mut(category).extend(tags.iter().cloned());
        }
    }
}

/// State file on disk
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file strictly
    pub fn read(&self) -> Result<PriorState, StateError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the state file, treating a missing or malformed file as empty state
    pub fn load(&self) -> PriorState {
        match self.read() {
            Ok(state) => state,
            Err(StateError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!("No state file at {:?}, starting empty", self.path);
                PriorState::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable state file {:?}: {}", self.path, e);
                PriorState::default()
            }
        }
    }

    /// Write the state as pretty-printed JSON
    pub fn save(&self, state: &PriorState) -> Result<(), StateError> {
        self.stage(state)?.commit()
    }

    /// Write the state to a temporary file next to the state file.
    ///
    /// The state file itself is untouched until [`StagedState::commit`].
    pub fn stage(&self, state: &PriorState) -> Result<StagedState, StateError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut content = serde_json::to_string_pretty(state)?;
        content.push('\n');

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;

        Ok(StagedState {
            file,
            target: self.path.clone(),
        })
    }
}

/// Serialized state waiting to replace the state file
#[derive(Debug)]
pub struct StagedState {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedState {
    /// Rename the staged file over the state file
    pub fn commit(self) -> Result<(), StateError> {
        self.file
            .persist(&self.target)
            .map_err(|e| StateError::Io(e.error))?;
        Ok(())
    }
}
