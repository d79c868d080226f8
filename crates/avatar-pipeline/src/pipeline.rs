//! Request orchestration.
//!
//! A request moves through
//! `RECEIVED -> (FALLBACK | COMPLETION) -> per draft: SYNTHESIZED -> TRANSCODED -> ALIGNED -> ASSEMBLED`.
//! Drafts are processed strictly one after another, in draft order. The first
//! failure aborts the request and no packet is returned.

use crate::artifacts::{ArtifactStore, RequestWorkspace};
use crate::assembly::assemble;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Stage};
use crate::fallback::{FallbackKind, FallbackProvider};
use avatar_types::{ChatRequest, Draft, ResponsePacket};
use avatar_voice::{
    Aligner, CompletionClient, CompletionConfig, SpeechSynthesizer, SynthesisConfig, Transcoder,
    VoiceError,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// The four external stages a pipeline drives.
#[derive(Clone)]
pub struct Stages {
    pub completion: Arc<dyn CompletionClient>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcoder: Arc<dyn Transcoder>,
    pub aligner: Arc<dyn Aligner>,
}

/// Which upstream credentials are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub completion: bool,
    pub synthesis: bool,
}

impl UpstreamCredentials {
    pub fn from_configs(completion: &CompletionConfig, synthesis: &SynthesisConfig) -> Self {
        Self {
            completion: completion.api_key().is_some(),
            synthesis: synthesis.api_key().is_some(),
        }
    }

    pub fn check(&self) -> Result<(), PipelineError> {
        if !self.completion {
            return Err(PipelineError::UpstreamCredentialMissing("completion"));
        }
        if !self.synthesis {
            return Err(PipelineError::UpstreamCredentialMissing("synthesis"));
        }
        Ok(())
    }
}

/// Turns one chat message into an ordered list of response packets.
pub struct Pipeline {
    max_drafts: usize,
    credentials: UpstreamCredentials,
    stages: Stages,
    artifacts: ArtifactStore,
    fallback: FallbackProvider,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl Pipeline {
    pub fn new(config: PipelineConfig, credentials: UpstreamCredentials, stages: Stages) -> Self {
        Self {
            max_drafts: config.max_drafts.max(1),
            credentials,
            stages,
            artifacts: ArtifactStore::new(config.work_dir, config.keep_artifacts),
            fallback: FallbackProvider::new(config.assets_dir),
        }
    }

    /// Runs the full pipeline for `request`.
    ///
    /// Empty input and missing credentials are answered by the fallback
    /// provider before any stage runs.
    pub async fn respond(&self, request: &ChatRequest) -> Result<Vec<ResponsePacket>, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("chat", request_id = %request_id);
        self.run(request_id, request).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        request: &ChatRequest,
    ) -> Result<Vec<ResponsePacket>, PipelineError> {
        let Some(message) = request.text() else {
            info!(stage = %Stage::Fallback, kind = FallbackKind::Intro.as_str(), "no user message");
            return self.fallback.serve(FallbackKind::Intro).await;
        };

        if let Err(err) = self.credentials.check() {
            warn!(
                stage = %Stage::Fallback,
                kind = FallbackKind::MissingCredentials.as_str(),
                "{}",
                err
            );
            return self.fallback.serve(FallbackKind::MissingCredentials).await;
        }

        let drafts = self.complete(message).await?;

        let workspace = self.artifacts.open_workspace(request_id).await?;
        let result = self.render(&workspace, &drafts).await;
        workspace.close().await;

        match &result {
            Ok(packets) => info!(messages = packets.len(), "response assembled"),
            Err(err) => warn!(
                stage = %err.stage(),
                index = err.draft_index(),
                "pipeline aborted: {}",
                err
            ),
        }
        result
    }

    async fn complete(&self, message: &str) -> Result<Vec<Draft>, PipelineError> {
        let started = Instant::now();
        let mut drafts = self
            .stages
            .completion
            .complete(message)
            .await
            .map_err(|e| match e {
                VoiceError::CompletionParse(reason) => PipelineError::CompletionParseError(reason),
                other => PipelineError::CompletionFailure(other.to_string()),
            })?;

        if drafts.len() > self.max_drafts {
            warn!(
                returned = drafts.len(),
                kept = self.max_drafts,
                "completion exceeded draft cap, truncating"
            );
            drafts.truncate(self.max_drafts);
        }

        info!(
            stage = %Stage::Completion,
            drafts = drafts.len(),
            elapsed_ms = elapsed_ms(started),
            "completion done"
        );
        Ok(drafts)
    }

    async fn render(
        &self,
        workspace: &RequestWorkspace,
        drafts: &[Draft],
    ) -> Result<Vec<ResponsePacket>, PipelineError> {
        for draft in drafts {
            self.process_draft(workspace, draft).await?;
        }
        assemble(workspace, drafts).await
    }

    /// Synthesis, transcode and alignment for a single draft.
    async fn process_draft(
        &self,
        workspace: &RequestWorkspace,
        draft: &Draft,
    ) -> Result<(), PipelineError> {
        let index = draft.index;
        let started = Instant::now();

        let audio = self
            .stages
            .synthesizer
            .synthesize(&draft.text)
            .await
            .map_err(|e| PipelineError::SynthesisFailure {
                index,
                reason: e.to_string(),
            })?;
        if audio.is_empty() {
            return Err(PipelineError::SynthesisFailure {
                index,
                reason: "synthesizer returned no audio".to_string(),
            });
        }
        let audio_path = workspace.write_audio(index, &audio).await?;
        info!(index, stage = %Stage::Synthesis, bytes = audio.len(), elapsed_ms = elapsed_ms(started), "audio generated");

        let waveform = self
            .stages
            .transcoder
            .transcode(&audio_path, &workspace.waveform_path(index))
            .await
            .map_err(|e| PipelineError::TranscodeFailure {
                index,
                reason: e.to_string(),
            })?;
        info!(index, stage = %Stage::Transcode, duration = waveform.duration, elapsed_ms = elapsed_ms(started), "conversion done");

        let track = self
            .stages
            .aligner
            .align(&waveform.path, &workspace.track_path(index))
            .await
            .map_err(|e| PipelineError::LipsyncToolFailure {
                index,
                reason: e.to_string(),
            })?;
        track
            .validate(waveform.duration)
            .map_err(|e| PipelineError::LipsyncToolFailure {
                index,
                reason: e.to_string(),
            })?;
        info!(index, stage = %Stage::Alignment, cues = track.mouth_cues.len(), elapsed_ms = elapsed_ms(started), "lip sync done");

        workspace.discard_waveform(index).await;
        Ok(())
    }
}
