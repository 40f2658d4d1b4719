//! Stand-ins for hosts without speech engines

use crate::speech::input::{CaptureEvent, RecognizerConfig, SpeechRecognizer};
use crate::speech::output::{SpeechSynthesizer, SynthesisEvent, Utterance, Voice};
use crate::{ParleyError, Result};
use crossbeam_channel::Sender;

/// Recognizer for hosts with no speech-to-text support
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    fn attach(&mut self, _config: RecognizerConfig, _events: Sender<CaptureEvent>) {}

    fn start(&mut self) -> Result<()> {
        Err(ParleyError::CaptureUnavailable(
            "no speech recognition engine".to_string(),
        ))
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Synthesizer for hosts with no text-to-speech support
#[derive(Debug, Default)]
pub struct UnsupportedSynthesizer;

impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn attach(&mut self, _events: Sender<SynthesisEvent>) {}

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn enqueue(&mut self, _utterance: Utterance) -> Result<()> {
        Err(ParleyError::SynthesisUnavailable(
            "no speech synthesis engine".to_string(),
        ))
    }

    fn cancel(&mut self) {}
}
