//! Configuration for the chat client
//!
//! Provides centralized configuration for the controller and its collaborators.

use crate::{ParleyError, Result};
use serde::Deserialize;
use std::path::Path;

/// Apology shown and spoken when an exchange fails
pub const DEFAULT_FALLBACK_APOLOGY: &str =
    "ขออภัยครับ ดูเหมือนว่าจะมีปัญหาในการเชื่อมต่อกับระบบ";

/// Opening assistant line rendered at session start
pub const DEFAULT_GREETING: &str = "สวัสดีครับ มีสิ่งใดให้ผมช่วยชี้แนะหรือไม่?";

/// Placeholder wording for the text input
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Placeholders {
    /// Prompt shown while nothing is happening
    pub idle: String,
    /// Shown while voice capture is running
    pub listening: String,
    /// Shown after the capture control is released, before a result arrives
    pub processing: String,
    /// Shown while an exchange is in flight
    pub thinking: String,
    /// Shown when voice capture fails
    pub capture_error: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            idle: "ถามคำถามของท่านที่นี่...".to_string(),
            listening: "กำลังฟัง...".to_string(),
            processing: "กำลังประมวลผลเสียง...".to_string(),
            thinking: "กำลังครุ่นคิด...".to_string(),
            capture_error: "ขออภัยครับ เกิดข้อผิดพลาดในการรับเสียง".to_string(),
        }
    }
}

/// Voice capture and playback settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    /// BCP-47 language tag used for both recognition and synthesis
    pub language: String,

    /// Voice name fragment tried first
    pub preferred_voice: String,

    /// Provider name fragment tried when the preferred voice is missing
    pub secondary_provider: String,

    /// Speech rate (1.0 = engine normal)
    pub rate: f32,

    /// Speech pitch (1.0 = engine normal)
    pub pitch: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "th-TH".to_string(),
            preferred_voice: "Kanya".to_string(),
            secondary_provider: "Google".to_string(),
            rate: 0.95,
            pitch: 1.0,
        }
    }
}

/// Speech-to-text and text-to-speech service used by the device engines
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechServiceConfig {
    /// Base URL of an OpenAI-compatible audio API
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Transcription model
    pub stt_model: String,

    /// Synthesis model
    pub tts_model: String,

    /// Voice names the synthesis service offers, first one is the default
    pub voices: Vec<String>,
}

impl Default for SpeechServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            voices: vec!["nova".to_string(), "alloy".to_string()],
        }
    }
}

impl SpeechServiceConfig {
    /// API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Configuration for the complete client
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParleyConfig {
    /// URL of the answer service endpoint
    pub endpoint: String,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Audio API behind the microphone and speaker engines
    pub speech: SpeechServiceConfig,

    /// Input placeholder wording
    pub placeholders: Placeholders,

    /// Answer substituted when an exchange fails
    pub fallback_apology: String,

    /// Assistant greeting rendered at startup
    pub greeting: Option<String>,

    /// Initial sound preference
    pub sound_enabled: bool,

    /// Whether to wire up voice capture
    pub enable_voice_input: bool,

    /// Whether to wire up voice playback
    pub enable_voice_output: bool,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/ask".to_string(),
            voice: VoiceConfig::default(),
            speech: SpeechServiceConfig::default(),
            placeholders: Placeholders::default(),
            fallback_apology: DEFAULT_FALLBACK_APOLOGY.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            sound_enabled: true,
            enable_voice_input: true,
            enable_voice_output: true,
        }
    }
}

impl ParleyConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Set the answer service endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the greeting, or `None` to start with an empty log
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    /// Start with sound disabled
    pub fn muted(mut self) -> Self {
        self.sound_enabled = false;
        self
    }

    /// Disable voice capture (text-only input)
    pub fn without_voice_input(mut self) -> Self {
        self.enable_voice_input = false;
        self
    }

    /// Disable voice playback (text-only output)
    pub fn without_voice_output(mut self) -> Self {
        self.enable_voice_output = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ParleyError::Config(format!(
                "Endpoint must be an http(s) URL: {:?}",
                self.endpoint
            )));
        }

        if self.voice.language.trim().is_empty() {
            return Err(ParleyError::Config("Voice language is required".to_string()));
        }

        if self.voice.rate <= 0.0 || self.voice.pitch <= 0.0 {
            return Err(ParleyError::Config(format!(
                "Rate and pitch must be positive (rate {}, pitch {})",
                self.voice.rate, self.voice.pitch
            )));
        }

        if !(self.speech.base_url.starts_with("http://")
            || self.speech.base_url.starts_with("https://"))
        {
            return Err(ParleyError::Config(format!(
                "Speech service URL must be an http(s) URL: {:?}",
                self.speech.base_url
            )));
        }

        Ok(())
    }
}
