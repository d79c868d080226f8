#![allow(dead_code)]

use async_trait::async_trait;
use avatar_pipeline::{FallbackKind, Pipeline, PipelineConfig, Stages, UpstreamCredentials};
use avatar_types::{Animation, Draft, FacialExpression, MouthCue, MouthShape, TrackMetadata, VisemeTrack};
use avatar_voice::transcode::{probe_waveform, wav_duration};
use avatar_voice::{Aligner, CompletionClient, SpeechSynthesizer, Transcoder, VoiceError, Waveform};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Sample rate of the waveforms produced by [`FakeTranscoder`].
pub const FAKE_SAMPLE_RATE: u32 = 8_000;
/// Waveform samples produced per byte of compressed audio.
pub const SAMPLES_PER_BYTE: u32 = 400;
/// Seconds of waveform produced per byte of compressed audio.
pub const SECONDS_PER_BYTE: f64 = SAMPLES_PER_BYTE as f64 / FAKE_SAMPLE_RATE as f64;

/// Ordered record of stage invocations across all fakes.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

pub fn draft(index: usize, text: &str) -> Draft {
    Draft {
        index,
        text: text.to_string(),
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking0,
    }
}

pub enum CompletionReply {
    Drafts(Vec<Draft>),
    /// `n` drafts whose text is derived from the user message.
    Echo(usize),
    ParseError(String),
    Unavailable(String),
}

pub struct FakeCompletion {
    reply: CompletionReply,
    calls: AtomicUsize,
}

impl FakeCompletion {
    pub fn new(reply: CompletionReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, message: &str) -> Result<Vec<Draft>, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            CompletionReply::Drafts(drafts) => Ok(drafts.clone()),
            CompletionReply::Echo(n) => Ok((0..*n)
                .map(|i| draft(i, &format!("{message} #{i}")))
                .collect()),
            CompletionReply::ParseError(reason) => Err(VoiceError::CompletionParse(reason.clone())),
            CompletionReply::Unavailable(reason) => Err(VoiceError::Completion(reason.clone())),
        }
    }
}

/// Returns `MP3:<text>` as the "compressed" clip, after an optional delay.
pub struct FakeSynthesizer {
    events: EventLog,
    delay: Duration,
}

impl FakeSynthesizer {
    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("MP3:{text}").into_bytes()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        self.events.push(format!("synthesize:{text}"));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Self::audio_for(text))
    }
}

/// Writes a silent WAV whose length is proportional to the input size.
pub struct FakeTranscoder {
    events: EventLog,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    delay: Duration,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<Waveform, VoiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.events.push(format!("transcode:{}", file_name(input)));
        if self.fail_on_call == Some(call) {
            return Err(VoiceError::Transcode("ffmpeg exited with 1".to_string()));
        }
        let bytes = tokio::fs::read(input)
            .await
            .map_err(|e| VoiceError::Transcode(e.to_string()))?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        write_silence(output, bytes.len() as u32 * SAMPLES_PER_BYTE);
        probe_waveform(output).await
    }
}

/// Writes a two-cue track spanning the waveform, optionally cut short.
pub struct FakeAligner {
    events: EventLog,
    shortfall: f64,
}

#[async_trait]
impl Aligner for FakeAligner {
    async fn align(&self, waveform: &Path, output: &Path) -> Result<VisemeTrack, VoiceError> {
        self.events.push(format!("align:{}", file_name(waveform)));
        let duration = wav_duration(waveform).map_err(|e| VoiceError::Lipsync(e.to_string()))?;
        let end = (duration - self.shortfall).max(0.02);
        let track = track_spanning(end, &waveform.to_string_lossy());
        let json = serde_json::to_vec(&track).unwrap();
        tokio::fs::write(output, json)
            .await
            .map_err(|e| VoiceError::Lipsync(e.to_string()))?;
        Ok(track)
    }
}

pub fn track_spanning(duration: f64, sound_file: &str) -> VisemeTrack {
    VisemeTrack {
        metadata: Some(TrackMetadata {
            sound_file: sound_file.to_string(),
            duration,
        }),
        mouth_cues: vec![
            MouthCue {
                start: 0.0,
                end: duration / 2.0,
                value: MouthShape::X,
            },
            MouthCue {
                start: duration / 2.0,
                end: duration,
                value: MouthShape::B,
            },
        ],
    }
}

pub fn write_silence(path: &Path, samples: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: FAKE_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..samples {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Populates `dir` with the static clips and tracks both fallbacks need.
pub fn write_fallback_assets(dir: &Path) {
    for kind in [FallbackKind::Intro, FallbackKind::MissingCredentials] {
        for name in kind.asset_files() {
            let path = dir.join(&name);
            if name.ends_with(".wav") {
                write_silence(&path, FAKE_SAMPLE_RATE / 2);
            } else {
                let track = track_spanning(0.5, &name);
                std::fs::write(&path, serde_json::to_vec(&track).unwrap()).unwrap();
            }
        }
    }
}

pub struct HarnessBuilder {
    reply: CompletionReply,
    credentials: UpstreamCredentials,
    transcode_fail_on_call: Option<usize>,
    track_shortfall: f64,
    delay: Duration,
    max_drafts: usize,
    with_assets: bool,
}

impl HarnessBuilder {
    pub fn new(reply: CompletionReply) -> Self {
        Self {
            reply,
            credentials: UpstreamCredentials {
                completion: true,
                synthesis: true,
            },
            transcode_fail_on_call: None,
            track_shortfall: 0.0,
            delay: Duration::ZERO,
            max_drafts: 3,
            with_assets: true,
        }
    }

    pub fn credentials(mut self, completion: bool, synthesis: bool) -> Self {
        self.credentials = UpstreamCredentials {
            completion,
            synthesis,
        };
        self
    }

    pub fn fail_transcode_on_call(mut self, call: usize) -> Self {
        self.transcode_fail_on_call = Some(call);
        self
    }

    pub fn short_tracks(mut self, shortfall: f64) -> Self {
        self.track_shortfall = shortfall;
        self
    }

    pub fn stage_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_drafts(mut self, max_drafts: usize) -> Self {
        self.max_drafts = max_drafts;
        self
    }

    pub fn without_assets(mut self) -> Self {
        self.with_assets = false;
        self
    }

    pub fn build(self) -> Harness {
        let work_dir = tempfile::tempdir().unwrap();
        let assets_dir = tempfile::tempdir().unwrap();
        if self.with_assets {
            write_fallback_assets(assets_dir.path());
        }

        let events = EventLog::default();
        let completion = Arc::new(FakeCompletion::new(self.reply));
        let stages = Stages {
            completion: completion.clone(),
            synthesizer: Arc::new(FakeSynthesizer {
                events: events.clone(),
                delay: self.delay,
            }),
            transcoder: Arc::new(FakeTranscoder {
                events: events.clone(),
                calls: AtomicUsize::new(0),
                fail_on_call: self.transcode_fail_on_call,
                delay: self.delay,
            }),
            aligner: Arc::new(FakeAligner {
                events: events.clone(),
                shortfall: self.track_shortfall,
            }),
        };

        let config = PipelineConfig {
            max_drafts: self.max_drafts,
            work_dir: work_dir.path().to_path_buf(),
            assets_dir: assets_dir.path().to_path_buf(),
            keep_artifacts: false,
        };

        Harness {
            pipeline: Pipeline::new(config, self.credentials, stages),
            events,
            completion,
            work_dir,
            assets_dir,
        }
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub events: EventLog,
    pub completion: Arc<FakeCompletion>,
    pub work_dir: TempDir,
    pub assets_dir: TempDir,
}

impl Harness {
    /// Number of request workspaces still present under the work directory.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}
