//! Avatar server library logic.
//!
//! Exposes the HTTP surface of the response pipeline: a welcome banner, a
//! health probe, the synthesis provider's voice list and the chat endpoint.

pub mod api;
pub mod config;

use avatar_pipeline::{Pipeline, Stages, UpstreamCredentials};
use avatar_voice::{
    ElevenLabsSynthesizer, FfmpegTranscoder, OpenAiCompletion, RhubarbAligner, SpeechSynthesizer,
    VoiceError,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response pipeline driving `/chat`.
    pub pipeline: Arc<Pipeline>,
    /// Synthesis provider, also queried directly by `/voices`.
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Wires the production stages from `config`.
    ///
    /// Missing API keys are not an error here; the pipeline answers with its
    /// canned warning until they are configured.
    pub fn from_config(config: &Config) -> Result<Self, VoiceError> {
        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(ElevenLabsSynthesizer::new(config.synthesis.clone())?);
        let stages = Stages {
            completion: Arc::new(OpenAiCompletion::new(config.completion.clone())?),
            synthesizer: synthesizer.clone(),
            transcoder: Arc::new(FfmpegTranscoder::from_config(&config.tools)),
            aligner: Arc::new(RhubarbAligner::from_config(&config.tools)),
        };
        let credentials = UpstreamCredentials::from_configs(&config.completion, &config.synthesis);

        if !credentials.completion {
            tracing::warn!("OPENAI_API_KEY is not set, chat will answer with the credentials notice");
        }
        if !credentials.synthesis {
            tracing::warn!(
                "ELEVEN_LABS_API_KEY is not set, chat will answer with the credentials notice"
            );
        }

        Ok(Self {
            pipeline: Arc::new(Pipeline::new(config.pipeline.clone(), credentials, stages)),
            synthesizer,
        })
    }
}

/// Maximum request body size (64 KiB). Chat messages are short.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

const WELCOME_BANNER: &str = "Welcome to Your Virtual Interview with IAcine ! 🤖";

async fn welcome() -> &'static str {
    WELCOME_BANNER
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/voices", get(api::voices_handler))
        .route("/chat", post(api::chat_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
