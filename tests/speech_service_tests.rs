//! Speech service requests against a local stub of the audio API

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use parley::config::SpeechServiceConfig;
use parley::speech::{samples_to_wav, SpeechService};
use parley::ParleyError;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<Bytes>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn serve(router: Router) -> SpeechServiceConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    SpeechServiceConfig {
        base_url: format!("http://{}/v1/", addr),
        ..SpeechServiceConfig::default()
    }
}

async fn audio_stub(seen: Seen) -> SpeechServiceConfig {
    async fn transcriptions(
        State(seen): State<Seen>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Json<Value> {
        if let Some(auth) = headers.get("authorization") {
            seen.auth.lock().push(auth.to_str().unwrap().to_string());
        }
        seen.bodies.lock().push(body);
        Json(json!({"text": " ราคาสินค้าเท่าไร \n"}))
    }

    async fn speech(State(seen): State<Seen>, body: Bytes) -> Vec<u8> {
        seen.bodies.lock().push(body);
        b"RIFF-audio".to_vec()
    }

    serve(
        Router::new()
            .route("/v1/audio/transcriptions", post(transcriptions))
            .route("/v1/audio/speech", post(speech))
            .with_state(seen),
    )
    .await
}

#[tokio::test]
async fn test_transcription_uploads_wav_with_language() {
    let seen = Seen::default();
    let config = audio_stub(seen.clone()).await;
    let service = SpeechService::new(&config, Some("sk-test".to_string()));

    let wav = samples_to_wav(&[0.1, -0.1, 0.2], 16_000).unwrap();
    let text = service.transcribe(wav, "th-TH").await.unwrap();

    assert_eq!(text, "ราคาสินค้าเท่าไร");
    assert_eq!(seen.auth.lock().clone(), vec!["Bearer sk-test".to_string()]);

    let body = String::from_utf8_lossy(&seen.bodies.lock()[0]).to_string();
    assert!(body.contains("filename=\"audio.wav\""));
    assert!(body.contains("RIFF"));
    assert!(body.contains("whisper-1"));
    assert!(body.contains("name=\"language\""));
    assert!(body.contains("\r\n\r\nth\r\n"));
}

#[tokio::test]
async fn test_synthesis_posts_voice_and_clamped_speed() {
    let seen = Seen::default();
    let config = audio_stub(seen.clone()).await;
    let service = SpeechService::new(&config, None);

    let audio = service.synthesize("สวัสดีครับ", "nova", 10.0).await.unwrap();

    assert_eq!(audio, b"RIFF-audio".to_vec());
    let request: Value = serde_json::from_slice(&seen.bodies.lock()[0]).unwrap();
    assert_eq!(
        request,
        json!({
            "model": "tts-1",
            "input": "สวัสดีครับ",
            "voice": "nova",
            "speed": 4.0,
            "response_format": "wav"
        })
    );
}

#[tokio::test]
async fn test_service_errors_map_to_speech_errors() {
    async fn refuse() -> (StatusCode, &'static str) {
        (StatusCode::UNAUTHORIZED, "bad key")
    }
    let config = serve(
        Router::new()
            .route("/v1/audio/transcriptions", post(refuse))
            .route("/v1/audio/speech", post(refuse)),
    )
    .await;
    let service = SpeechService::new(&config, None);

    let wav = samples_to_wav(&[0.0], 16_000).unwrap();
    assert!(matches!(
        service.transcribe(wav, "th-TH").await,
        Err(ParleyError::Capture(_))
    ));
    assert!(matches!(
        service.synthesize("hi", "nova", 1.0).await,
        Err(ParleyError::Synthesis(_))
    ));
}
