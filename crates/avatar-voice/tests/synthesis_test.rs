use avatar_voice::config::DEFAULT_VOICE_ID;
use avatar_voice::{ElevenLabsSynthesizer, SpeechSynthesizer, SynthesisConfig, VoiceError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn synthesizer_for(server: &MockServer) -> ElevenLabsSynthesizer {
    let config = SynthesisConfig::new("xi-test").with_base_url(format!("{}/v1", server.uri()));
    ElevenLabsSynthesizer::new(config).unwrap()
}

#[tokio::test]
async fn test_synthesize_posts_fixed_voice_settings() {
    let server = MockServer::start().await;
    let mp3 = vec![0xFF, 0xFB, 0x90, 0x64, 0x00, 0x01];

    Mock::given(method("POST"))
        .and(path(format!("/v1/text-to-speech/{DEFAULT_VOICE_ID}")))
        .and(header("xi-api-key", "xi-test"))
        .and(body_partial_json(json!({
            "text": "Nice to meet you!",
            "voice_settings": {"stability": 0.5, "similarity_boost": 0.75}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(mp3.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let audio = synthesizer_for(&server)
        .synthesize("Nice to meet you!")
        .await
        .unwrap();
    assert_eq!(audio, mp3);
}

#[tokio::test]
async fn test_model_id_omitted_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    synthesizer_for(&server).synthesize("Hi").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("model_id").is_none());
}

#[tokio::test]
async fn test_empty_audio_is_a_synthesis_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    match synthesizer_for(&server).synthesize("Hi").await {
        Err(VoiceError::Synthesis(msg)) => assert!(msg.contains("no audio"), "got: {msg}"),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_error_is_a_synthesis_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": {"status": "invalid_api_key"}})),
        )
        .mount(&server)
        .await;

    match synthesizer_for(&server).synthesize("Hi").await {
        Err(VoiceError::Synthesis(msg)) => assert!(msg.contains("401"), "got: {msg}"),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_text_is_rejected_locally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
        .expect(0)
        .mount(&server)
        .await;

    let text = "a".repeat(64 * 1024 + 1);
    assert!(matches!(
        synthesizer_for(&server).synthesize(&text).await,
        Err(VoiceError::Synthesis(_))
    ));
}

#[tokio::test]
async fn test_list_voices_passes_provider_json_through() {
    let server = MockServer::start().await;
    let listing = json!({
        "voices": [{"voice_id": DEFAULT_VOICE_ID, "name": "George", "labels": {"accent": "british"}}]
    });

    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("xi-api-key", "xi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let voices = synthesizer_for(&server).list_voices().await.unwrap();
    assert_eq!(voices, listing);
}
