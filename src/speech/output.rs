//! Voice playback adapter
//!
//! Wraps a text-to-speech engine behind [`SpeechSynthesizer`]. Each reply is
//! split into sentences and queued as consecutive utterances; a new reply
//! always cancels whatever is still playing.

use crate::config::VoiceConfig;
use crate::speech::segment::split_sentences;
use crate::Result;
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

/// A voice offered by the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// One queued piece of speech
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    /// `None` leaves the choice to the engine default
    pub voice: Option<Voice>,
    /// Reply this utterance belongs to; every `speak` starts a new stream
    pub stream: u64,
}

/// Notifications from the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// The voice list changed (engines may publish it late)
    VoicesChanged,
    /// Every queued utterance of `stream` has finished playing
    QueueDrained { stream: u64 },
}

/// A text-to-speech capability
pub trait SpeechSynthesizer: Send {
    /// Whether the host supports synthesis at all
    fn is_available(&self) -> bool;

    /// Subscribe the controller to engine notifications
    fn attach(&mut self, events: Sender<SynthesisEvent>);

    /// Voices currently known to the engine; may be empty before readiness
    fn voices(&self) -> Vec<Voice>;

    /// Append an utterance to the engine's playback queue
    fn enqueue(&mut self, utterance: Utterance) -> Result<()>;

    /// Stop the current utterance and discard the queue
    fn cancel(&mut self);
}

/// Read-only view of the session flags that gate playback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackGate {
    pub sound_enabled: bool,
    pub audio_unlocked: bool,
}

impl PlaybackGate {
    pub fn is_open(&self) -> bool {
        self.sound_enabled && self.audio_unlocked
    }
}

fn same_language(a: &str, b: &str) -> bool {
    a.replace('_', "-").eq_ignore_ascii_case(&b.replace('_', "-"))
}

/// Pick a voice for the configured language.
///
/// Order: preferred voice name, then secondary provider name, then any voice
/// in the language. `None` means the engine default.
pub fn select_voice(voices: &[Voice], config: &VoiceConfig) -> Option<Voice> {
    let in_language: Vec<&Voice> = voices
        .iter()
        .filter(|v| same_language(&v.language, &config.language))
        .collect();

    let by_name = |needle: &str| {
        if needle.is_empty() {
            return None;
        }
        in_language.iter().find(|v| v.name.contains(needle)).copied()
    };

    by_name(config.preferred_voice.as_str())
        .or_else(|| by_name(config.secondary_provider.as_str()))
        .or_else(|| in_language.first().copied())
        .cloned()
}

/// Voice playback provider used by the turn controller
pub struct VoiceOutputProvider {
    synthesizer: Box<dyn SpeechSynthesizer>,
    config: VoiceConfig,
    voices: Vec<Voice>,
    stream: u64,
}

impl VoiceOutputProvider {
    pub fn new(
        mut synthesizer: Box<dyn SpeechSynthesizer>,
        config: VoiceConfig,
        events: Sender<SynthesisEvent>,
    ) -> Self {
        let available = synthesizer.is_available();
        if available {
            synthesizer.attach(events);
        } else {
            info!("Speech synthesis not supported, replies will not be spoken");
        }

        let mut provider = Self {
            synthesizer,
            config,
            voices: Vec::new(),
            stream: 0,
        };
        if available {
            provider.refresh_voices();
        }
        provider
    }

    pub fn is_available(&self) -> bool {
        self.synthesizer.is_available()
    }

    /// Reload the voice list from the engine
    pub fn refresh_voices(&mut self) {
        self.voices = self.synthesizer.voices();
        if !self.voices.is_empty() {
            let names: Vec<&str> = self
                .voices
                .iter()
                .filter(|v| same_language(&v.language, &self.config.language))
                .map(|v| v.name.as_str())
                .collect();
            info!("Voices ready for {}: {:?}", self.config.language, names);
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn current_voice(&mut self) -> Option<Voice> {
        // An empty list may only mean the engine was not ready yet
        if self.voices.is_empty() {
            self.refresh_voices();
        }
        select_voice(&self.voices, &self.config)
    }

    /// Speak `text`, pre-empting anything already playing.
    ///
    /// Returns the number of utterances queued; zero when the gate is closed,
    /// the engine is missing or the text has nothing to say.
    pub fn speak(&mut self, text: &str, gate: PlaybackGate) -> usize {
        if !gate.is_open() || text.trim().is_empty() || !self.is_available() {
            return 0;
        }

        self.synthesizer.cancel();
        self.stream += 1;

        let voice = self.current_voice();
        let mut queued = 0;
        for sentence in split_sentences(text) {
            let utterance = Utterance {
                text: sentence,
                language: self.config.language.clone(),
                rate: self.config.rate,
                pitch: self.config.pitch,
                voice: voice.clone(),
                stream: self.stream,
            };
            match self.synthesizer.enqueue(utterance) {
                Ok(()) => queued += 1,
                Err(e) => warn!("Failed to queue utterance: {}", e),
            }
        }

        debug!("Queued {} utterances", queued);
        queued
    }

    /// Halt playback and drop the queue
    pub fn cancel(&mut self) {
        if self.is_available() {
            self.synthesizer.cancel();
            self.stream += 1;
        }
    }

    /// Whether `stream` is the reply currently allowed to play
    pub fn is_current_stream(&self, stream: u64) -> bool {
        stream == self.stream
    }
}
