//! Score storage: two integers under fixed keys.
//! The file store writes a small JSON object; the memory store backs tests
//! and embedders that persist elsewhere.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rpshand_core::error::{Result, RpsError};
use rpshand_core::traits::ScoreStore;
use rpshand_core::types::ScoreLedger;

pub const PLAYER_SCORE_KEY: &str = "rps_player_score";
pub const ROBOT_SCORE_KEY: &str = "rps_robot_score";

/// File-based score store.
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    /// Store at the given file path. Parent directories are created on save.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Result<Option<ScoreLedger>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| RpsError::Storage(format!("Read error: {e}")))?;
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| RpsError::Storage(format!("Parse error: {e}")))?;
        Ok(Some(ScoreLedger {
            player_score: read_score(&map, PLAYER_SCORE_KEY),
            robot_score: read_score(&map, ROBOT_SCORE_KEY),
        }))
    }

    fn save(&self, ledger: &ScoreLedger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&serde_json::json!({
            PLAYER_SCORE_KEY: ledger.player_score,
            ROBOT_SCORE_KEY: ledger.robot_score,
        }))?;
        std::fs::write(&self.path, json).map_err(|e| RpsError::Storage(format!("Write error: {e}")))?;
        tracing::debug!("💾 Saved scores ({ledger}) to {}", self.path.display());
        Ok(())
    }
}

/// Missing or malformed values read as zero; strings holding numbers are accepted.
fn read_score(map: &serde_json::Map<String, serde_json::Value>, key: &str) -> u32 {
    match map.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|v| v.min(u32::MAX as u64) as u32).unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    slot: Arc<Mutex<Option<ScoreLedger>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: ScoreLedger) -> Self {
        let store = Self::default();
        if let Ok(mut slot) = store.slot.lock() {
            *slot = Some(ledger);
        }
        store
    }

    /// Last saved ledger.
    pub fn stored(&self) -> Option<ScoreLedger> {
        self.slot.lock().ok().and_then(|s| *s)
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<Option<ScoreLedger>> {
        Ok(self.stored())
    }

    fn save(&self, ledger: &ScoreLedger) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| RpsError::Storage("score slot poisoned".into()))?;
        *slot = Some(*ledger);
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rpshand-test-{name}-{}", std::process::id())).join("scores.json")
    }

    #[test]
    fn test_file_save_and_load() {
        let path = temp_file("roundtrip");
        let store = FileScoreStore::new(&path);
        assert_eq!(store.load().unwrap(), None);

        let ledger = ScoreLedger { player_score: 4, robot_score: 7 };
        store.save(&ledger).unwrap();
        assert_eq!(store.load().unwrap(), Some(ledger));

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[PLAYER_SCORE_KEY], 4);
        assert_eq!(raw[ROBOT_SCORE_KEY], 7);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_lenient_values() {
        let path = temp_file("lenient");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"rps_player_score":"3","rps_robot_score":-2}"#).unwrap();
        let ledger = FileScoreStore::new(&path).load().unwrap().unwrap();
        assert_eq!(ledger, ScoreLedger { player_score: 3, robot_score: 0 });
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_corrupt_is_error() {
        let path = temp_file("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{{{ not json").unwrap();
        let err = FileScoreStore::new(&path).load().unwrap_err();
        assert!(matches!(err, RpsError::Storage(_)));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_memory_store_shares_slot() {
        let store = MemoryScoreStore::new();
        let view = store.clone();
        store.save(&ScoreLedger { player_score: 1, robot_score: 0 }).unwrap();
        assert_eq!(view.stored().unwrap().player_score, 1);
        assert_eq!(view.save_count(), 1);
    }
}
