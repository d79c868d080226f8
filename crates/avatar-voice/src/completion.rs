//! Language-completion stage.
//!
//! Sends the user's message together with the avatar persona to an
//! OpenAI-compatible chat completions endpoint and turns the reply into an
//! ordered list of [`Draft`]s.

use crate::config::CompletionConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use avatar_types::{Animation, Draft, FacialExpression};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Message sent upstream when the caller supplies no text.
pub const DEFAULT_GREETING: &str = "Hello";

/// Upper bound on the number of drafts the persona is asked to produce.
pub const MAX_DRAFTS: usize = 3;

/// Longest slice of an upstream error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Produces message drafts for a user message.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, message: &str) -> Result<Vec<Draft>, VoiceError>;
}

/// Builds the system instruction pinning persona, output format and tag vocabularies.
pub fn persona_instruction() -> String {
    let expressions: Vec<&str> = FacialExpression::ALL.iter().map(|e| e.as_str()).collect();
    let animations: Vec<&str> = Animation::ALL.iter().map(|a| a.as_str()).collect();

    let mut prompt = String::new();
    prompt.push_str(
        "Your name is Yacine, you're an expert in Artificial Intelligence and Data. \
         Your mission is to help businesses grow by integrating intelligent, tailored AI and Data solutions. \
         You are professional, friendly, and confident. \
         You speak with clarity and enthusiasm, always showing your willingness to help companies \
         unlock the full potential of AI and Data.\n",
    );
    let _ = writeln!(
        prompt,
        "You will always reply with a JSON array of messages. With a maximum of {MAX_DRAFTS} messages."
    );
    prompt.push_str("Each message has a text, facialExpression, and animation property.\n");
    let _ = writeln!(
        prompt,
        "The different facial expressions are: {}.",
        expressions.join(", ")
    );
    let _ = writeln!(
        prompt,
        "The different animations are: {}.",
        animations.join(", ")
    );
    prompt.push_str(
        "If someone asks how to contact you, always say: \
         \"You can visit my website at iacine.tech and follow me on LinkedIn.\"\n",
    );
    prompt
}

/// Removes markdown code-fence markers and surrounding whitespace.
///
/// Applying it twice yields the same text as applying it once.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftPayload {
    text: String,
    #[serde(default)]
    facial_expression: Option<String>,
    #[serde(default)]
    animation: Option<String>,
}

/// Parses completion output into drafts, indexed by position.
///
/// The text must be a JSON array of objects, each carrying a non-empty
/// `text`. Unknown expression or animation tags are replaced by the neutral
/// ones rather than rejected.
pub fn parse_drafts(raw: &str) -> Result<Vec<Draft>, VoiceError> {
    let cleaned = strip_code_fences(raw);
    let payloads: Vec<DraftPayload> = serde_json::from_str(&cleaned)
        .map_err(|e| VoiceError::CompletionParse(format!("{e}")))?;

    if payloads.is_empty() {
        return Err(VoiceError::CompletionParse(
            "completion returned an empty message list".to_string(),
        ));
    }

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            let text = payload.text.trim();
            if text.is_empty() {
                return Err(VoiceError::CompletionParse(format!(
                    "message {index} has no text"
                )));
            }
            Ok(Draft {
                index,
                text: text.to_string(),
                facial_expression: resolve_expression(index, payload.facial_expression),
                animation: resolve_animation(index, payload.animation),
            })
        })
        .collect()
}

fn resolve_expression(index: usize, tag: Option<String>) -> FacialExpression {
    match tag {
        None => FacialExpression::default(),
        Some(tag) => tag.parse().unwrap_or_else(|_| {
            warn!(index, tag = %tag, "unknown facial expression, using default");
            FacialExpression::default()
        }),
    }
}

fn resolve_animation(index: usize, tag: Option<String>) -> Animation {
    match tag {
        None => Animation::default(),
        Some(tag) => tag.parse().unwrap_or_else(|_| {
            warn!(index, tag = %tag, "unknown animation, using Idle");
            Animation::default()
        }),
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// [`CompletionClient`] backed by the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    config: CompletionConfig,
    client: Client,
    instruction: String,
}

impl OpenAiCompletion {
    pub fn new(config: CompletionConfig) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            instruction: persona_instruction(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, message: &str) -> Result<Vec<Draft>, VoiceError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| VoiceError::Config("completion API key is not configured".to_string()))?;

        let user_message = match message.trim() {
            "" => DEFAULT_GREETING,
            trimmed => trimmed,
        };

        let body = ChatCompletionRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VoiceError::Completion(format!(
                "upstream returned {status}: {}",
                truncate_body(&text)
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::CompletionParse(format!("malformed response body: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                VoiceError::CompletionParse("response carried no message content".to_string())
            })?;

        debug!(chars = content.len(), "received completion content");
        parse_drafts(&content)
    }
}
