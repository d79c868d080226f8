//! External collaborators of the avatar response pipeline.
//!
//! Each collaborator sits behind a narrow async trait so the pipeline can be
//! driven by real services in production and by in-process fakes in tests:
//!
//! - [`CompletionClient`]: language completion ([`OpenAiCompletion`])
//! - [`SpeechSynthesizer`]: text-to-speech ([`ElevenLabsSynthesizer`])
//! - [`Transcoder`]: compressed audio to waveform ([`FfmpegTranscoder`])
//! - [`Aligner`]: waveform to viseme track ([`RhubarbAligner`])
//!
//! The codec and alignment work is delegated to external executables run
//! through `tokio::process`.

pub mod align;
pub mod completion;
pub mod config;
pub mod error;
mod process;
pub mod synthesis;
pub mod transcode;

pub use align::{Aligner, RhubarbAligner};
pub use completion::{CompletionClient, OpenAiCompletion};
pub use config::{CompletionConfig, SynthesisConfig, ToolConfig};
pub use error::VoiceError;
pub use synthesis::{ElevenLabsSynthesizer, SpeechSynthesizer};
pub use transcode::{FfmpegTranscoder, Transcoder, Waveform};
