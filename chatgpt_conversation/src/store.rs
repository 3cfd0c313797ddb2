//! Persisted conversation history.
//!
//! The file is a pretty-printed JSON array of `{role, content}` objects.
//! Writes go to a sibling temp file that is flushed, synced and renamed over
//! the destination, so a crash mid-write leaves the previous file intact.

use chatgpt_core::Turn;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::history::TrimPolicy;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {action} history file {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HistoryError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    policy: TrimPolicy,
}

impl HistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, policy: TrimPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn policy(&self) -> &TrimPolicy {
        &self.policy
    }

    /// Load history, falling back to an empty one when the file is missing
    /// or unreadable.
    #[must_use]
    pub fn load(&self) -> Vec<Turn> {
        match self.load_strict() {
            Ok(turns) => turns,
            Err(e) => {
                warn!("{e}; starting with empty history");
                self.policy.empty_history()
            }
        }
    }

    /// Load history, reporting unreadable or corrupt files.
    pub fn load_strict(&self) -> Result<Vec<Turn>, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No history at {}, starting fresh", self.path.display());
                return Ok(self.policy.empty_history());
            }
            Err(e) => return Err(HistoryError::io("read", &self.path, e)),
        };

        let turns: Vec<Turn> =
            serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        info!("Loaded {} turns from {}", turns.len(), self.path.display());
        Ok(self.policy.normalize(turns))
    }

    /// Replace the stored history with `turns`.
    pub fn save(&self, turns: &[Turn]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| HistoryError::io("create directory for", &self.path, e))?;
        }

        let temp_path = self.temp_path();
        let written = Self::write_temp(&temp_path, turns).and_then(|()| {
            fs::rename(&temp_path, &self.path)
                .map_err(|e| HistoryError::io("replace", &self.path, e))
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        info!("Saved {} turns to {}", turns.len(), self.path.display());
        Ok(())
    }

    /// Overwrite the stored history with an empty (or system-only) one.
    pub fn reset(&self) -> Result<Vec<Turn>, HistoryError> {
        let turns = self.policy.empty_history();
        self.save(&turns)?;
        info!("History reset at {}", self.path.display());
        Ok(turns)
    }

    fn write_temp(temp_path: &Path, turns: &[Turn]) -> Result<(), HistoryError> {
        let file =
            File::create(temp_path).map_err(|e| HistoryError::io("create", temp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, turns).map_err(|e| {
            if e.is_io() {
                HistoryError::io("write", temp_path, e.into())
            } else {
                HistoryError::Encode(e)
            }
        })?;
        writer
            .write_all(b"\n")
            .map_err(|e| HistoryError::io("write", temp_path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| HistoryError::io("flush", temp_path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| HistoryError::io("sync", temp_path, e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("history.json"), TrimPolicy::new(60))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.load_strict().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let turns = vec![Turn::user("hi"), Turn::assistant("hello!")];

        store.save(&turns).unwrap();

        assert_eq!(store.load(), turns);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_uses_role_content_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .save(&[Turn::user("hi"), Turn::assistant("hello!")])
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello!" }
            ])
        );
    }

    #[test]
    fn corrupt_file_is_reported_strictly_and_ignored_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ this is not a list").unwrap();

        assert!(matches!(
            store.load_strict(),
            Err(HistoryError::Corrupt { .. })
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn reset_writes_system_only_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(
            dir.path().join("history.json"),
            TrimPolicy::new(60).with_system_prompt(Some("Be brief.".to_string())),
        );
        store
            .save(&[Turn::system("Be brief."), Turn::user("q"), Turn::assistant("a")])
            .unwrap();

        let after = store.reset().unwrap();

        assert_eq!(after, vec![Turn::system("Be brief.")]);
        assert_eq!(store.load(), vec![Turn::system("Be brief.")]);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(
            dir.path().join("nested").join("history.json"),
            TrimPolicy::default(),
        );

        store.save(&[Turn::user("q"), Turn::assistant("a")]).unwrap();

        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        // A non-empty directory at the destination cannot be renamed over.
        fs::create_dir(store.path()).unwrap();
        fs::write(store.path().join("keep"), "x").unwrap();

        let err = store.save(&[Turn::user("q"), Turn::assistant("a")]).unwrap_err();

        assert!(matches!(err, HistoryError::Io { action: "replace", .. }));
        assert!(!store.temp_path().exists());
        assert!(store.path().join("keep").exists());
    }
}
