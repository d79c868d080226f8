//! Pre-baked responses served without running any stage.

use crate::assembly::{packet, read_audio_file, read_track_file};
use crate::error::PipelineError;
use avatar_types::{Animation, FacialExpression, ResponsePacket};
use std::path::PathBuf;

/// Which canned response to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// The request carried no user text.
    Intro,
    /// A completion or synthesis credential is not configured.
    MissingCredentials,
}

struct FallbackLine {
    /// Asset stem; `<clip>.wav` and `<clip>.json` live in the assets directory.
    clip: &'static str,
    text: &'static str,
    facial_expression: FacialExpression,
    animation: Animation,
}

static INTRO: [FallbackLine; 2] = [
    FallbackLine {
        clip: "intro_0",
        text: "Hey dear... How was your day?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking1,
    },
    FallbackLine {
        clip: "intro_1",
        text: "I missed you so much... Please don't go for so long!",
        facial_expression: FacialExpression::Sad,
        animation: Animation::Crying,
    },
];

static MISSING_CREDENTIALS: [FallbackLine; 2] = [
    FallbackLine {
        clip: "api_0",
        text: "Please my dear, don't forget to add your API keys!",
        facial_expression: FacialExpression::Angry,
        animation: Animation::Angry,
    },
    FallbackLine {
        clip: "api_1",
        text: "You don't want to ruin Wawa Sensei with a crazy ChatGPT and ElevenLabs bill, right?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Laughing,
    },
];

impl FallbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::MissingCredentials => "missing_credentials",
        }
    }

    fn lines(self) -> &'static [FallbackLine] {
        match self {
            Self::Intro => &INTRO,
            Self::MissingCredentials => &MISSING_CREDENTIALS,
        }
    }

    /// Names of the static files this response needs.
    pub fn asset_files(self) -> Vec<String> {
        self.lines()
            .iter()
            .flat_map(|line| [format!("{}.wav", line.clip), format!("{}.json", line.clip)])
            .collect()
    }
}

/// Serves canned packets backed by static audio and pre-computed tracks.
#[derive(Debug, Clone)]
pub struct FallbackProvider {
    assets_dir: PathBuf,
}

impl FallbackProvider {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    /// Returns the two packets for `kind`, reading their assets verbatim.
    pub async fn serve(&self, kind: FallbackKind) -> Result<Vec<ResponsePacket>, PipelineError> {
        let mut packets = Vec::with_capacity(kind.lines().len());
        for line in kind.lines() {
            let audio = read_audio_file(&self.assets_dir.join(format!("{}.wav", line.clip))).await?;
            let track = read_track_file(&self.assets_dir.join(format!("{}.json", line.clip))).await?;
            packets.push(packet(
                line.text,
                &audio,
                track,
                line.facial_expression,
                line.animation,
            ));
        }
        Ok(packets)
    }
}
