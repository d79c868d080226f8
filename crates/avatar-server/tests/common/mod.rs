#![allow(dead_code)]

use async_trait::async_trait;
use avatar_pipeline::{FallbackKind, Pipeline, PipelineConfig, Stages, UpstreamCredentials};
use avatar_server::AppState;
use avatar_types::{MouthCue, MouthShape, TrackMetadata, VisemeTrack};
use avatar_voice::transcode::{probe_waveform, wav_duration};
use avatar_voice::{
    Aligner, CompletionConfig, ElevenLabsSynthesizer, OpenAiCompletion, SynthesisConfig,
    Transcoder, VoiceError, Waveform,
};
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

pub const SAMPLE_RATE: u32 = 8_000;

pub fn write_silence(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(seconds * f64::from(SAMPLE_RATE)) as u32 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

pub fn single_cue_track(duration: f64) -> VisemeTrack {
    VisemeTrack {
        metadata: Some(TrackMetadata {
            sound_file: String::new(),
            duration,
        }),
        mouth_cues: vec![MouthCue {
            start: 0.0,
            end: duration,
            value: MouthShape::X,
        }],
    }
}

/// Stands in for ffmpeg: every clip becomes a quarter second of silence.
pub struct SilentTranscoder;

#[async_trait]
impl Transcoder for SilentTranscoder {
    async fn transcode(&self, _input: &Path, output: &Path) -> Result<Waveform, VoiceError> {
        write_silence(output, 0.25);
        probe_waveform(output).await
    }
}

/// Stands in for rhubarb: one rest cue covering the whole waveform.
pub struct RestAligner;

#[async_trait]
impl Aligner for RestAligner {
    async fn align(&self, waveform: &Path, output: &Path) -> Result<VisemeTrack, VoiceError> {
        let track = single_cue_track(wav_duration(waveform)?);
        std::fs::write(output, serde_json::to_vec(&track).unwrap())
            .map_err(|e| VoiceError::Lipsync(e.to_string()))?;
        Ok(track)
    }
}

pub struct TestServer {
    pub app: Router,
    pub work_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestServer {
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}

/// Builds the router against HTTP upstreams at `upstream_uri`.
///
/// `None` keys leave the corresponding credential unset.
pub fn test_server(
    upstream_uri: &str,
    openai_key: Option<&str>,
    elevenlabs_key: Option<&str>,
) -> TestServer {
    let work_dir = tempfile::tempdir().unwrap();
    let assets_dir = tempfile::tempdir().unwrap();
    for kind in [FallbackKind::Intro, FallbackKind::MissingCredentials] {
        for name in kind.asset_files() {
            let path = assets_dir.path().join(&name);
            if name.ends_with(".wav") {
                write_silence(&path, 0.5);
            } else {
                std::fs::write(&path, serde_json::to_vec(&single_cue_track(0.5)).unwrap())
                    .unwrap();
            }
        }
    }

    let mut completion = CompletionConfig::default().with_base_url(format!("{upstream_uri}/v1"));
    completion.api_key = openai_key.map(str::to_string);
    let mut synthesis = SynthesisConfig::default().with_base_url(format!("{upstream_uri}/v1"));
    synthesis.api_key = elevenlabs_key.map(str::to_string);

    let synthesizer = Arc::new(ElevenLabsSynthesizer::new(synthesis.clone()).unwrap());
    let stages = Stages {
        completion: Arc::new(OpenAiCompletion::new(completion.clone()).unwrap()),
        synthesizer: synthesizer.clone(),
        transcoder: Arc::new(SilentTranscoder),
        aligner: Arc::new(RestAligner),
    };
    let config = PipelineConfig {
        work_dir: work_dir.path().to_path_buf(),
        assets_dir: assets_dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let credentials = UpstreamCredentials::from_configs(&completion, &synthesis);

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(config, credentials, stages)),
        synthesizer,
    };

    TestServer {
        app: avatar_server::app(state),
        work_dir,
        assets_dir,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn post_chat(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
