use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Completion output is not a valid draft list: {0}")]
    CompletionParse(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Lipsync error: {0}")]
    Lipsync(String),
}
