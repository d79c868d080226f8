//! Transient per-request artifact storage.
//!
//! Every request gets its own directory under the store root, named by the
//! request's UUID. Artifact names inside it are keyed by draft index, so two
//! requests working on the same draft index never touch the same file.

use crate::assembly::{read_audio_file, read_track_file};
use crate::error::PipelineError;
use avatar_types::VisemeTrack;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Hands out request-scoped workspaces under a common root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    keep: bool,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`. When `keep` is set, workspaces are
    /// left on disk after the request finishes.
    pub fn new(root: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            root: root.into(),
            keep,
        }
    }

    /// Creates the workspace directory for `request_id`.
    pub async fn open_workspace(&self, request_id: Uuid) -> Result<RequestWorkspace, PipelineError> {
        let dir = self.root.join(request_id.to_string());
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PipelineError::Workspace(format!("failed to create workspace {dir:?}: {e}"))
        })?;
        debug!(dir = %dir.display(), "opened request workspace");
        Ok(RequestWorkspace {
            dir,
            keep: self.keep,
        })
    }
}

/// The artifact directory owned by one in-flight request.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: PathBuf,
    keep: bool,
}

impl RequestWorkspace {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn audio_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("message_{index}.mp3"))
    }

    pub fn waveform_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("message_{index}.wav"))
    }

    pub fn track_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("message_{index}.json"))
    }

    /// Persists the audio artifact for `index`, replacing any previous one.
    ///
    /// The bytes are written to a sibling file and renamed into place so a
    /// reader never observes a partially written clip.
    pub async fn write_audio(&self, index: usize, audio: &[u8]) -> Result<PathBuf, PipelineError> {
        let path = self.audio_path(index);
        let partial = self.dir.join(format!("message_{index}.mp3.part"));
        tokio::fs::write(&partial, audio).await.map_err(|e| {
            PipelineError::Workspace(format!("failed to write {partial:?}: {e}"))
        })?;
        tokio::fs::rename(&partial, &path).await.map_err(|e| {
            PipelineError::Workspace(format!("failed to move audio into {path:?}: {e}"))
        })?;
        Ok(path)
    }

    pub async fn read_audio(&self, index: usize) -> Result<Vec<u8>, PipelineError> {
        read_audio_file(&self.audio_path(index)).await
    }

    pub async fn read_track(&self, index: usize) -> Result<VisemeTrack, PipelineError> {
        read_track_file(&self.track_path(index)).await
    }

    /// Removes the waveform for `index` once alignment no longer needs it.
    pub async fn discard_waveform(&self, index: usize) {
        let path = self.waveform_path(index);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(index, path = %path.display(), "failed to discard waveform: {}", e);
        }
    }

    /// Ends the request, deleting its directory unless artifacts are kept.
    pub async fn close(self) {
        if self.keep {
            debug!(dir = %self.dir.display(), "keeping request artifacts");
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), "failed to remove request workspace: {}", e);
        }
    }
}
