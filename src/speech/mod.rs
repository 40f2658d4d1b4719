//! Speech capture and playback
//!
//! This module provides:
//! - Sentence segmentation for playback
//! - The voice capture adapter over a speech-to-text engine
//! - The voice playback adapter over a text-to-speech engine
//! - An HTTP speech service and, with `audio-io`, microphone and speaker engines

pub mod cloud;
#[cfg(feature = "audio-io")]
pub mod device;
pub mod input;
pub mod output;
pub mod segment;
pub mod unsupported;

pub use cloud::{samples_to_wav, SpeechService};
#[cfg(feature = "audio-io")]
pub use device::{MicrophoneRecognizer, SpeakerSynthesizer};
pub use input::{CaptureEvent, RecognizerConfig, SpeechRecognizer, VoiceInputProvider};
pub use output::{
    select_voice, PlaybackGate, SpeechSynthesizer, SynthesisEvent, Utterance, Voice,
    VoiceOutputProvider,
};
pub use segment::split_sentences;
pub use unsupported::{UnsupportedRecognizer, UnsupportedSynthesizer};
