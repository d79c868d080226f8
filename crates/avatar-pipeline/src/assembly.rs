//! Assembly stage: merges draft metadata, audio and viseme tracks into
//! response packets.

use crate::artifacts::RequestWorkspace;
use crate::error::PipelineError;
use avatar_types::{Animation, Draft, FacialExpression, ResponsePacket, VisemeTrack};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

pub(crate) async fn read_audio_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::artifact_read(path, e))
}

pub(crate) async fn read_track_file(path: &Path) -> Result<VisemeTrack, PipelineError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::artifact_read(path, e))?;
    serde_json::from_slice(&raw).map_err(|e| PipelineError::artifact_read(path, e))
}

/// Builds one packet from its parts, base64-encoding the audio.
pub fn packet(
    text: impl Into<String>,
    audio: &[u8],
    lipsync: VisemeTrack,
    facial_expression: FacialExpression,
    animation: Animation,
) -> ResponsePacket {
    ResponsePacket {
        text: text.into(),
        audio: STANDARD.encode(audio),
        lipsync,
        facial_expression,
        animation,
    }
}

/// Re-reads every draft's audio and track from `workspace` and returns the
/// packets in draft order.
///
/// A missing artifact means a per-draft stage did not complete for that
/// index, which is an ordering bug upstream.
pub async fn assemble(
    workspace: &RequestWorkspace,
    drafts: &[Draft],
) -> Result<Vec<ResponsePacket>, PipelineError> {
    let mut packets = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let audio = workspace.read_audio(draft.index).await?;
        let track = workspace.read_track(draft.index).await?;
        packets.push(packet(
            draft.text.clone(),
            &audio,
            track,
            draft.facial_expression,
            draft.animation,
        ));
    }
    Ok(packets)
}
