//! OpenAI-compatible audio API used by the device engines
//!
//! Transcription uploads a WAV clip to `{base_url}/audio/transcriptions`;
//! synthesis posts text to `{base_url}/audio/speech` and returns WAV bytes.

use crate::config::SpeechServiceConfig;
use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

/// Client for the speech endpoints
pub struct SpeechService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    stt_model: String,
    tts_model: String,
}

impl SpeechService {
    pub fn new(config: &SpeechServiceConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            stt_model: config.stt_model.clone(),
            tts_model: config.tts_model.clone(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Transcribe a WAV clip spoken in `language` (a BCP-47 tag)
    pub async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String> {
        debug!("Uploading {} bytes for transcription", wav.len());

        let file = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| ParleyError::Capture(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.stt_model.clone())
            .text("language", primary_subtag(language));

        let response = self
            .authorize(
                self.client
                    .post(format!("{}/audio/transcriptions", self.base_url)),
            )
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Transcription failed with {}: {}", status, body);
            return Err(ParleyError::Capture(format!("service returned {}", status)));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::Capture(e.to_string()))?;
        info!("Transcribed: {:?}", result.text);
        Ok(result.text.trim().to_string())
    }

    /// Synthesize `text` with the named voice; returns WAV bytes
    pub async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>> {
        debug!("Synthesizing {} chars with voice {}", text.chars().count(), voice);

        let response = self
            .authorize(self.client.post(format!("{}/audio/speech", self.base_url)))
            .json(&SpeechRequest {
                model: &self.tts_model,
                input: text,
                voice,
                speed: speed.clamp(0.25, 4.0),
                response_format: "wav",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Synthesis failed with {}: {}", status, body);
            return Err(ParleyError::Synthesis(format!("service returned {}", status)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// `th-TH` -> `th`; the transcription API takes ISO-639-1 codes
fn primary_subtag(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase()
}

/// Encode mono f32 samples as 16-bit PCM WAV
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| ParleyError::Capture(e.to_string()))?;
        for &sample in samples {
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(value)
                .map_err(|e| ParleyError::Capture(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| ParleyError::Capture(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("th-TH"), "th");
        assert_eq!(primary_subtag("en_US"), "en");
        assert_eq!(primary_subtag("TH"), "th");
    }

    #[test]
    fn test_samples_to_wav_header_and_clamping() {
        let wav = samples_to_wav(&[0.0, 0.5, 2.0, -2.0], 16_000).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, 32767, -32768]);
    }
}
