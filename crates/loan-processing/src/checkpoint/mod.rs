//! Checkpoint store for the transformed column groups.
//!
//! Each group is persisted as a Parquet file named after its checkpoint,
//! header included. A checkpoint is written to a temporary file first and
//! renamed into place, so a crashed run never leaves a truncated checkpoint
//! that a later `--resume` would trust.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Checkpoint of the encoded categorical group.
pub const CATEGORICAL_CHECKPOINT: &str = "checkpoint-categorical";

/// Checkpoint of the imputed and converted numeric group.
pub const NUMERIC_CHECKPOINT: &str = "checkpoint-numeric";

const EXTENSION: &str = "parquet";
const NOTES_EXTENSION: &str = "json";

/// Directory-backed store of named table snapshots.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing checkpoint `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, EXTENSION))
    }

    /// Sidecar file holding the run notes of checkpoint `name`.
    pub fn notes_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, NOTES_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Persist `df` under `name`, replacing any previous snapshot.
    pub fn save(&self, name: &str, df: &DataFrame) -> Result<PathBuf> {
        let failed = |reason: String| PreprocessingError::Checkpoint {
            name: name.to_string(),
            reason,
        };

        fs::create_dir_all(&self.dir)
            .map_err(|e| failed(format!("cannot create {}: {}", self.dir.display(), e)))?;

        let final_path = self.path(name);
        let tmp_path = final_path.with_extension(format!("{}.tmp", EXTENSION));

        let file = File::create(&tmp_path)
            .map_err(|e| failed(format!("cannot create {}: {}", tmp_path.display(), e)))?;
        let mut snapshot = df.clone();
        if let Err(e) = ParquetWriter::new(file).finish(&mut snapshot) {
            discard(&tmp_path);
            return Err(failed(format!("cannot write {}: {}", tmp_path.display(), e)));
        }

        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            discard(&tmp_path);
            return Err(failed(format!(
                "cannot finalize {}: {}",
                final_path.display(),
                e
            )));
        }

        info!(
            "Checkpoint '{}' written: {} rows x {} columns -> {}",
            name,
            df.height(),
            df.width(),
            final_path.display()
        );
        Ok(final_path)
    }

    /// Persist the run notes of checkpoint `name` as JSON beside its table.
    pub fn save_notes<T: Serialize>(&self, name: &str, notes: &T) -> Result<PathBuf> {
        let failed = |reason: String| PreprocessingError::Checkpoint {
            name: name.to_string(),
            reason,
        };

        fs::create_dir_all(&self.dir)
            .map_err(|e| failed(format!("cannot create {}: {}", self.dir.display(), e)))?;

        let final_path = self.notes_path(name);
        let tmp_path = final_path.with_extension(format!("{}.tmp", NOTES_EXTENSION));
        let json = serde_json::to_string_pretty(notes)?;

        let written = File::create(&tmp_path)
            .and_then(|mut file| file.write_all(json.as_bytes()))
            .and_then(|_| fs::rename(&tmp_path, &final_path));
        if let Err(e) = written {
            discard(&tmp_path);
            return Err(failed(format!("cannot write {}: {}", final_path.display(), e)));
        }

        debug!("Checkpoint notes '{}' written: {} bytes", name, json.len());
        Ok(final_path)
    }

    /// Load the run notes saved beside checkpoint `name`.
    pub fn load_notes<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.notes_path(name);
        let failed = |reason: String| PreprocessingError::Checkpoint {
            name: name.to_string(),
            reason,
        };

        let json = fs::read_to_string(&path)
            .map_err(|e| failed(format!("cannot open {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| failed(format!("cannot read {}: {}", path.display(), e)))
    }

    /// Load the snapshot stored under `name`.
    pub fn load(&self, name: &str) -> Result<DataFrame> {
        let path = self.path(name);
        let failed = |reason: String| PreprocessingError::Checkpoint {
            name: name.to_string(),
            reason,
        };

        let file = File::open(&path)
            .map_err(|e| failed(format!("cannot open {}: {}", path.display(), e)))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| failed(format!("cannot read {}: {}", path.display(), e)))?;

        debug!(
            "Checkpoint '{}' loaded: {} rows x {} columns",
            name,
            df.height(),
            df.width()
        );
        Ok(df)
    }

    /// Save `df` and continue from the reloaded copy.
    ///
    /// What the pipeline assembles afterwards is exactly what was persisted.
    pub fn checkpoint(&self, name: &str, df: &DataFrame) -> Result<DataFrame> {
        self.save(name, df)?;
        let reloaded = self.load(name)?;
        if reloaded.shape() != df.shape() {
            return Err(PreprocessingError::Checkpoint {
                name: name.to_string(),
                reason: format!(
                    "read back {:?} instead of {:?}",
                    reloaded.shape(),
                    df.shape()
                ),
            });
        }
        Ok(reloaded)
    }

    /// Load `name` and check that its header is exactly `expected`.
    pub fn load_with_header(&self, name: &str, expected: &[String]) -> Result<DataFrame> {
        let df = self.load(name)?;
        let header = crate::utils::column_names(&df);
        if header != expected {
            return Err(PreprocessingError::Checkpoint {
                name: name.to_string(),
                reason: format!("header {:?} does not match {:?}", header, expected),
            });
        }
        Ok(df)
    }
}

/// Remove a partially written file, keeping the original error.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> DataFrame {
        df!(
            "issue_date" => &[1i64, 0, 12],
            "sub_grade" => &[1i64, 36, 5],
        )
        .unwrap()
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("ckpt"));

        assert!(!store.exists(CATEGORICAL_CHECKPOINT));
        let reloaded = store.checkpoint(CATEGORICAL_CHECKPOINT, &group()).unwrap();

        assert!(store.exists(CATEGORICAL_CHECKPOINT));
        assert!(reloaded.equals(&group()));
        assert!(!store.path(CATEGORICAL_CHECKPOINT).with_extension("parquet.tmp").exists());
    }

    #[test]
    fn test_load_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save(NUMERIC_CHECKPOINT, &group()).unwrap();

        let expected = vec!["issue_date".to_string(), "sub_grade".to_string()];
        assert!(store.load_with_header(NUMERIC_CHECKPOINT, &expected).is_ok());

        let err = store
            .load_with_header(NUMERIC_CHECKPOINT, &expected[..1])
            .unwrap_err();
        assert_eq!(err.error_code(), "CHECKPOINT_FAILED");
    }

    #[test]
    fn test_notes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("ckpt"));
        let notes = vec!["first".to_string(), "second".to_string()];

        store.save_notes(CATEGORICAL_CHECKPOINT, &notes).unwrap();

        let loaded: Vec<String> = store.load_notes(CATEGORICAL_CHECKPOINT).unwrap();
        assert_eq!(loaded, notes);
        assert!(!store.notes_path(CATEGORICAL_CHECKPOINT).with_extension("json.tmp").exists());

        let err = store.load_notes::<Vec<String>>(NUMERIC_CHECKPOINT).unwrap_err();
        assert_eq!(err.error_code(), "CHECKPOINT_FAILED");
    }

    #[test]
    fn test_failed_write_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        // a directory in the way of the final name makes the rename fail
        fs::create_dir_all(store.path(NUMERIC_CHECKPOINT).join("occupied")).unwrap();

        assert!(store.save(NUMERIC_CHECKPOINT, &group()).is_err());
        assert!(!store.path(NUMERIC_CHECKPOINT).with_extension("parquet.tmp").exists());
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let err = store.load("absent").unwrap_err();
        assert!(matches!(err, PreprocessingError::Checkpoint { .. }));
    }
}
