//! Viseme tracks.
//!
//! A `VisemeTrack` mirrors the JSON document written by Rhubarb Lip Sync
//! (`-f json`): an optional `metadata` block and an ordered `mouthCues`
//! array. The playback layer consumes it verbatim, so field names follow the
//! tool's camelCase layout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed slack, in seconds, when comparing cue boundaries. Rhubarb rounds
/// timestamps to hundredths of a second.
pub const TIME_TOLERANCE_SECS: f64 = 0.01;

/// Mouth shapes in the Rhubarb vocabulary.
///
/// `A` through `F` are the basic shapes, `G`, `H` the extended ones and `X`
/// the idle/rest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouthShape {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    X,
}

/// One interval of a viseme track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    pub value: MouthShape,
}

/// Source information recorded by the alignment tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    #[serde(default)]
    pub sound_file: String,
    /// Duration of the aligned audio in seconds.
    pub duration: f64,
}

/// Time-ordered phoneme-to-mouth-shape intervals for one audio clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisemeTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrackMetadata>,
    pub mouth_cues: Vec<MouthCue>,
}

/// Ways a viseme track can fail its post-conditions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("track has no mouth cues")]
    Empty,

    #[error("cue {index} has non-positive length ({start}..{end})")]
    EmptyCue { index: usize, start: f64, end: f64 },

    #[error("track starts at {start}s instead of 0")]
    LateStart { start: f64 },

    #[error("cue {index} starts at {start}s but the previous cue ends at {previous_end}s")]
    Discontinuous {
        index: usize,
        start: f64,
        previous_end: f64,
    },

    #[error("track ends at {end}s, before the audio ends at {duration}s")]
    ShortCoverage { end: f64, duration: f64 },
}

impl VisemeTrack {
    /// End time of the last cue, or 0 for an empty track.
    pub fn end_time(&self) -> f64 {
        self.mouth_cues.last().map_or(0.0, |cue| cue.end)
    }

    /// Checks that the track is non-empty, monotonic and gap-free, and that
    /// it covers `duration` seconds of audio.
    pub fn validate(&self, duration: f64) -> Result<(), TrackError> {
        let first = self.mouth_cues.first().ok_or(TrackError::Empty)?;
        if first.start.abs() > TIME_TOLERANCE_SECS {
            return Err(TrackError::LateStart { start: first.start });
        }

        let mut previous_end: Option<f64> = None;
        for (index, cue) in self.mouth_cues.iter().enumerate() {
            if cue.end <= cue.start {
                return Err(TrackError::EmptyCue {
                    index,
                    start: cue.start,
                    end: cue.end,
                });
            }
            if let Some(previous_end) = previous_end {
                if (cue.start - previous_end).abs() > TIME_TOLERANCE_SECS {
                    return Err(TrackError::Discontinuous {
                        index,
                        start: cue.start,
                        previous_end,
                    });
                }
            }
            previous_end = Some(cue.end);
        }

        let end = self.end_time();
        if end + TIME_TOLERANCE_SECS < duration {
            return Err(TrackError::ShortCoverage { end, duration });
        }
        Ok(())
    }
}
