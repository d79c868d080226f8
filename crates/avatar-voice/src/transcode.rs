use crate::config::ToolConfig;
use crate::error::VoiceError;
use crate::process::run_tool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// An uncompressed waveform on disk, ready for alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub path: PathBuf,
    /// Length of the audio in seconds.
    pub duration: f64,
}

/// Converts a compressed audio clip into the waveform format the aligner reads.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<Waveform, VoiceError>;
}

/// Reads the duration of a WAV file from its header.
pub fn wav_duration(path: &Path) -> Result<f64, VoiceError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| VoiceError::Transcode(format!("unreadable waveform {path:?}: {e}")))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(VoiceError::Transcode(format!(
            "waveform {path:?} declares a zero sample rate"
        )));
    }
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Measures a waveform written by a tool and wraps it as a [`Waveform`].
pub async fn probe_waveform(path: &Path) -> Result<Waveform, VoiceError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(VoiceError::Transcode(format!(
            "expected waveform {path:?} was not written"
        )));
    }
    let owned = path.to_path_buf();
    let duration = tokio::task::spawn_blocking(move || wav_duration(&owned))
        .await
        .map_err(|e| VoiceError::Transcode(format!("waveform probe task failed: {e}")))??;
    Ok(Waveform {
        path: path.to_path_buf(),
        duration,
    })
}

/// [`Transcoder`] that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(
            &config.ffmpeg_path,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<Waveform, VoiceError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg(output);

        run_tool("ffmpeg", command, self.timeout)
            .await
            .map_err(VoiceError::Transcode)?;

        probe_waveform(output).await
    }
}
