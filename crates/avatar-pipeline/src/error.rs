use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stages, used to label failures and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fallback,
    Completion,
    Synthesis,
    Transcode,
    Alignment,
    Assembly,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Completion => "completion",
            Self::Synthesis => "synthesis",
            Self::Transcode => "transcode",
            Self::Alignment => "alignment",
            Self::Assembly => "assembly",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failures of a pipeline run.
///
/// Every variant aborts the whole request; no partial response is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("completion call failed: {0}")]
    CompletionFailure(String),

    #[error("completion output rejected: {0}")]
    CompletionParseError(String),

    #[error("synthesis failed for draft {index}: {reason}")]
    SynthesisFailure { index: usize, reason: String },

    #[error("transcode failed for draft {index}: {reason}")]
    TranscodeFailure { index: usize, reason: String },

    #[error("lipsync tool failed for draft {index}: {reason}")]
    LipsyncToolFailure { index: usize, reason: String },

    #[error("artifact {path:?} could not be read: {reason}")]
    ArtifactReadFailure { path: PathBuf, reason: String },

    #[error("request workspace error: {0}")]
    Workspace(String),

    /// Never surfaced to callers: the entry point serves the credentials
    /// fallback instead.
    #[error("upstream credential missing: {0}")]
    UpstreamCredentialMissing(&'static str),
}

impl PipelineError {
    /// The stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::CompletionFailure(_) | Self::CompletionParseError(_) => Stage::Completion,
            Self::SynthesisFailure { .. } | Self::Workspace(_) => Stage::Synthesis,
            Self::TranscodeFailure { .. } => Stage::Transcode,
            Self::LipsyncToolFailure { .. } => Stage::Alignment,
            Self::ArtifactReadFailure { .. } => Stage::Assembly,
            Self::UpstreamCredentialMissing(_) => Stage::Fallback,
        }
    }

    /// Draft index the failure belongs to, for per-draft stages.
    pub fn draft_index(&self) -> Option<usize> {
        match self {
            Self::SynthesisFailure { index, .. }
            | Self::TranscodeFailure { index, .. }
            | Self::LipsyncToolFailure { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub(crate) fn artifact_read(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::ArtifactReadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
