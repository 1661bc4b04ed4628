use crate::error::CheckpointError;
use crate::model::Checkpoint;
use std::path::{Path, PathBuf};

const CHECKPOINT_FILE_NAME: &str = "pause.json";

/// Directory-tree checkpoint store: one `pause.json` per session under
/// `{checkpoint_dir}/{session_name_or_id}/`. Writes are atomic
/// (write-then-rename), matching the teacher's `weave.lock` save.
pub struct CheckpointStore {
    checkpoint_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    fn session_dir(&self, session_name_or_id: &str) -> PathBuf {
        self.checkpoint_dir.join(session_name_or_id)
    }

    fn checkpoint_path(&self, session_name_or_id: &str) -> PathBuf {
        self.session_dir(session_name_or_id).join(CHECKPOINT_FILE_NAME)
    }

    /// Write `checkpoint` atomically: serialize to a sibling `.tmp` file,
    /// then rename over the final path.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let dir = self.session_dir(&checkpoint.session_name_or_id);
        std::fs::create_dir_all(&dir).map_err(|e| CheckpointError::CreateDirFailed {
            path: dir.clone(),
            source: e,
        })?;

        let path = self.checkpoint_path(&checkpoint.session_name_or_id);
        let tmp_path = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(checkpoint).expect("Checkpoint always serializes");

        std::fs::write(&tmp_path, content.as_bytes()).map_err(|e| CheckpointError::WriteFailed {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| CheckpointError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        tracing::info!(
            session = %checkpoint.session_name_or_id,
            status = ?checkpoint.status,
            "checkpoint written"
        );
        Ok(())
    }

    /// Load the checkpoint for `session_name_or_id`, if one exists.
    pub fn load(&self, session_name_or_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.checkpoint_path(session_name_or_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CheckpointError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;
        let checkpoint = serde_json::from_str(&content)
            .map_err(|e| CheckpointError::ParseFailed { path, source: e })?;
        Ok(checkpoint)
    }

    /// Load and validate a checkpoint for resume: errors if missing, or
    /// if it is a stale, expired consultation.
    pub fn load_for_resume(&self, session_name_or_id: &str) -> Result<Checkpoint, CheckpointError> {
        let checkpoint = self
            .load(session_name_or_id)?
            .ok_or_else(|| CheckpointError::NotFound(session_name_or_id.to_string()))?;

        let now = chrono::Utc::now();
        if checkpoint.is_consult_expired(now) {
            return Err(CheckpointError::ConsultExpired {
                session: session_name_or_id.to_string(),
                expired_at: checkpoint.consult_expires_at.expect("checked by is_consult_expired"),
            });
        }
        Ok(checkpoint)
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }
}
