//! Voice capture adapter
//!
//! Wraps a speech recognition engine behind [`SpeechRecognizer`] and makes sure
//! the controller sees exactly one outcome per capture.

use crate::config::VoiceConfig;
use crate::Result;
use crossbeam_channel::Sender;
use tracing::{debug, error, info, warn};

/// Recognition settings handed to the engine once at construction
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerConfig {
    /// Spoken language to recognise
    pub language: String,
    /// Whether partial hypotheses are reported (always false here)
    pub interim_results: bool,
    /// Number of alternative transcripts considered
    pub max_alternatives: u32,
}

impl RecognizerConfig {
    pub fn from_voice(voice: &VoiceConfig) -> Self {
        Self {
            language: voice.language.clone(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Outcome of one capture, as reported by the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A transcript was recognised
    Transcript(String),
    /// Recognition failed with the given reason code
    Error(String),
    /// Capture ended without a result
    Ended,
}

/// A speech-to-text capability
///
/// Engines deliver [`CaptureEvent`]s through the sender given to `attach`; they
/// must never call back into the controller synchronously.
pub trait SpeechRecognizer: Send {
    /// Whether the host supports recognition at all
    fn is_available(&self) -> bool;

    /// Configure the engine and subscribe the controller to its events
    fn attach(&mut self, config: RecognizerConfig, events: Sender<CaptureEvent>);

    /// Begin capturing
    fn start(&mut self) -> Result<()>;

    /// Stop capturing; a pending result may still be delivered
    fn stop(&mut self) -> Result<()>;
}

/// Where the current capture stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureStatus {
    Idle,
    /// Started, outcome not yet reported
    Active,
    /// Reported an error; the engine's end signal is still to come
    Closing,
}

/// Voice capture provider used by the turn controller
pub struct VoiceInputProvider {
    recognizer: Box<dyn SpeechRecognizer>,
    status: CaptureStatus,
}

impl VoiceInputProvider {
    pub fn new(
        mut recognizer: Box<dyn SpeechRecognizer>,
        voice: &VoiceConfig,
        events: Sender<CaptureEvent>,
    ) -> Self {
        if recognizer.is_available() {
            recognizer.attach(RecognizerConfig::from_voice(voice), events);
        } else {
            info!("Speech recognition not supported, voice capture disabled");
        }

        Self {
            recognizer,
            status: CaptureStatus::Idle,
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    /// Whether a capture has started and not yet reported its outcome
    pub fn is_active(&self) -> bool {
        self.status == CaptureStatus::Active
    }

    /// Start a capture. Failures are logged and reported as `false`.
    pub fn start(&mut self) -> bool {
        if !self.recognizer.is_available() {
            warn!("Cannot start capture: recognition unavailable");
            return false;
        }
        if self.is_active() {
            warn!("Cannot start capture: already capturing");
            return false;
        }

        match self.recognizer.start() {
            Ok(()) => {
                self.status = CaptureStatus::Active;
                debug!("Voice capture started");
                true
            }
            Err(e) if e.is_recoverable() => {
                warn!("Failed to start voice capture: {}", e);
                false
            }
            Err(e) => {
                error!("Voice capture engine failed: {}", e);
                false
            }
        }
    }

    /// Ask the engine to stop early. The outcome still arrives as an event.
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Err(e) = self.recognizer.stop() {
            warn!("Failed to stop voice capture: {}", e);
        }
    }

    /// Filter an engine event.
    ///
    /// Only the first outcome of a capture passes. After an error the engine's
    /// closing `Ended` also passes, so the error wording can be cleared.
    pub fn accept(&mut self, event: CaptureEvent) -> Option<CaptureEvent> {
        match (self.status, &event) {
            (CaptureStatus::Active, CaptureEvent::Error(_)) => {
                self.status = CaptureStatus::Closing;
                Some(event)
            }
            (CaptureStatus::Active, _) => {
                self.status = CaptureStatus::Idle;
                Some(event)
            }
            (CaptureStatus::Closing, CaptureEvent::Ended) => {
                self.status = CaptureStatus::Idle;
                Some(event)
            }
            _ => {
                debug!("Dropping capture event outside a capture: {:?}", event);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParleyError;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Calls {
        config: Option<RecognizerConfig>,
        starts: usize,
        stops: usize,
    }

    struct FakeRecognizer {
        available: bool,
        fail_start: bool,
        calls: Arc<Mutex<Calls>>,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_available(&self) -> bool {
            self.available
        }

        fn attach(&mut self, config: RecognizerConfig, _events: Sender<CaptureEvent>) {
            self.calls.lock().config = Some(config);
        }

        fn start(&mut self) -> Result<()> {
            if self.fail_start {
                return Err(ParleyError::Capture("busy".into()));
            }
            self.calls.lock().starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.calls.lock().stops += 1;
            Ok(())
        }
    }

    fn provider(available: bool, fail_start: bool) -> (VoiceInputProvider, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let recognizer = FakeRecognizer {
            available,
            fail_start,
            calls: Arc::clone(&calls),
        };
        let (tx, _rx) = unbounded();
        (
            VoiceInputProvider::new(Box::new(recognizer), &VoiceConfig::default(), tx),
            calls,
        )
    }

    #[test]
    fn test_engine_configured_single_result() {
        let (_provider, calls) = provider(true, false);
        let config = calls.lock().config.clone().unwrap();
        assert_eq!(config.language, "th-TH");
        assert!(!config.interim_results);
        assert_eq!(config.max_alternatives, 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (mut provider, calls) = provider(true, false);
        assert!(provider.start());
        assert!(!provider.start());
        assert_eq!(calls.lock().starts, 1);
    }

    #[test]
    fn test_unavailable_start_fails_silently() {
        let (mut provider, calls) = provider(false, false);
        assert!(!provider.start());
        assert!(!provider.is_active());
        assert!(calls.lock().config.is_none());
    }

    #[test]
    fn test_engine_start_error_leaves_inactive() {
        let (mut provider, _) = provider(true, true);
        assert!(!provider.start());
        assert!(!provider.is_active());
    }

    #[test]
    fn test_only_first_outcome_passes() {
        let (mut provider, _) = provider(true, false);
        provider.start();

        assert_eq!(
            provider.accept(CaptureEvent::Transcript("one".into())),
            Some(CaptureEvent::Transcript("one".into()))
        );
        assert_eq!(provider.accept(CaptureEvent::Ended), None);
        assert_eq!(provider.accept(CaptureEvent::Transcript("two".into())), None);
    }

    #[test]
    fn test_end_after_error_passes_once() {
        let (mut provider, _) = provider(true, false);
        provider.start();

        assert_eq!(
            provider.accept(CaptureEvent::Error("no-speech".into())),
            Some(CaptureEvent::Error("no-speech".into()))
        );
        assert!(!provider.is_active());
        assert_eq!(provider.accept(CaptureEvent::Transcript("late".into())), None);
        assert_eq!(provider.accept(CaptureEvent::Ended), Some(CaptureEvent::Ended));
        assert_eq!(provider.accept(CaptureEvent::Ended), None);
    }

    #[test]
    fn test_restart_while_closing() {
        let (mut provider, calls) = provider(true, false);
        provider.start();
        provider.accept(CaptureEvent::Error("aborted".into()));

        assert!(provider.start());
        assert_eq!(calls.lock().starts, 2);
        assert_eq!(
            provider.accept(CaptureEvent::Transcript("again".into())),
            Some(CaptureEvent::Transcript("again".into()))
        );
    }

    #[test]
    fn test_stop_without_capture_does_not_reach_engine() {
        let (mut provider, calls) = provider(true, false);
        provider.stop();
        assert_eq!(calls.lock().stops, 0);

        provider.start();
        provider.stop();
        assert_eq!(calls.lock().stops, 1);
        assert!(provider.is_active());
    }
}
