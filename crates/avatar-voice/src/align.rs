use crate::config::ToolConfig;
use crate::error::VoiceError;
use crate::process::run_tool;
use async_trait::async_trait;
use avatar_types::VisemeTrack;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Produces a viseme track for a waveform.
///
/// Implementations write the track as JSON to `output` and also return it
/// parsed.
#[async_trait]
pub trait Aligner: Send + Sync {
    async fn align(&self, waveform: &Path, output: &Path) -> Result<VisemeTrack, VoiceError>;
}

/// Reads a viseme track JSON file.
pub async fn read_track(path: &Path) -> Result<VisemeTrack, VoiceError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| VoiceError::Lipsync(format!("failed to read track {path:?}: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| VoiceError::Lipsync(format!("unparseable track {path:?}: {e}")))
}

/// [`Aligner`] that runs Rhubarb Lip Sync with its phonetic recognizer.
#[derive(Debug, Clone)]
pub struct RhubarbAligner {
    binary: PathBuf,
    timeout: Duration,
}

impl RhubarbAligner {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(
            &config.rhubarb_path,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl Aligner for RhubarbAligner {
    async fn align(&self, waveform: &Path, output: &Path) -> Result<VisemeTrack, VoiceError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-f")
            .arg("json")
            .arg("-o")
            .arg(output)
            .arg(waveform)
            .arg("-r")
            .arg("phonetic");

        run_tool("rhubarb", command, self.timeout)
            .await
            .map_err(VoiceError::Lipsync)?;

        read_track(output).await
    }
}
