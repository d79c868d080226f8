//! Shared types for the avatar response pipeline.
//!
//! This crate defines the vocabulary exchanged between the pipeline stages
//! and the playback client: message drafts produced by the completion
//! service, the closed facial-expression and animation tag sets, viseme
//! tracks produced by the alignment tool, and the packets returned on the
//! wire.
//!
//! Nothing here performs I/O. Every other crate in the workspace depends on
//! `avatar-types` for these definitions so the wire shape lives in exactly
//! one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod lipsync;

pub use lipsync::{MouthCue, MouthShape, TrackError, TrackMetadata, VisemeTrack};

/// Facial expressions understood by the avatar renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FacialExpression {
    #[serde(rename = "smile")]
    Smile,
    #[serde(rename = "sad")]
    Sad,
    #[serde(rename = "angry")]
    Angry,
    #[serde(rename = "surprised")]
    Surprised,
    #[serde(rename = "funnyFace")]
    FunnyFace,
    #[default]
    #[serde(rename = "default")]
    Default,
}

impl FacialExpression {
    /// All expressions, in the order they are advertised to the completion service.
    pub const ALL: [FacialExpression; 6] = [
        Self::Smile,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::FunnyFace,
        Self::Default,
    ];

    /// Returns the wire tag for this expression.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smile => "smile",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::FunnyFace => "funnyFace",
            Self::Default => "default",
        }
    }

    /// Parses a wire tag, mapping anything unrecognised to [`FacialExpression::Default`].
    pub fn from_tag_or_default(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for FacialExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacialExpression {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Body animations understood by the avatar renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Animation {
    #[serde(rename = "Talking_0")]
    Talking0,
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    Crying,
    Laughing,
    Rumba,
    #[default]
    Idle,
    Terrified,
    Angry,
}

impl Animation {
    /// All animations, in the order they are advertised to the completion service.
    pub const ALL: [Animation; 9] = [
        Self::Talking0,
        Self::Talking1,
        Self::Talking2,
        Self::Crying,
        Self::Laughing,
        Self::Rumba,
        Self::Idle,
        Self::Terrified,
        Self::Angry,
    ];

    /// Returns the wire tag for this animation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Talking0 => "Talking_0",
            Self::Talking1 => "Talking_1",
            Self::Talking2 => "Talking_2",
            Self::Crying => "Crying",
            Self::Laughing => "Laughing",
            Self::Rumba => "Rumba",
            Self::Idle => "Idle",
            Self::Terrified => "Terrified",
            Self::Angry => "Angry",
        }
    }

    /// Parses a wire tag, mapping anything unrecognised to [`Animation::Idle`].
    pub fn from_tag_or_default(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Animation {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// A tag outside the closed expression/animation vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tag: {0:?}")]
pub struct UnknownTag(pub String);

/// One message unit produced by the completion stage.
///
/// `index` is the draft's 0-based position in the completion output. It names
/// the draft's intermediate artifacts and fixes its position in the final
/// response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub index: usize,
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// Inbound chat request: `{ "message": string | absent }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Returns the user text, or `None` when it is absent, empty or blank.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// One synchronized avatar output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePacket {
    /// Spoken text.
    pub text: String,
    /// Base64 of the audio clip.
    pub audio: String,
    /// Mouth-shape timeline for `audio`.
    pub lipsync: VisemeTrack,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// Successful chat response body: `{ "messages": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<ResponsePacket>,
}
