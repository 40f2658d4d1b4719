//! Microphone and speaker engines
//!
//! cpal streams and rodio output streams cannot leave the thread that opened
//! them, so each engine keeps its device on a worker thread and talks to it
//! over crossbeam channels. Recognition and synthesis go through
//! [`SpeechService`] on a tokio runtime owned by that worker.

use crate::speech::cloud::{samples_to_wav, SpeechService};
use crate::speech::input::{CaptureEvent, RecognizerConfig, SpeechRecognizer};
use crate::speech::output::{SpeechSynthesizer, SynthesisEvent, Utterance, Voice};
use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

/// How often the playback worker checks whether the queue ran dry
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Voice used when the service offers none
const FALLBACK_VOICE: &str = "alloy";

/// Average interleaved frames down to one channel
fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    let channels = channels.max(1);
    data.chunks(channels)
        .map(move |frame| frame.iter().sum::<f32>() / frame.len() as f32)
}

/// Captured audio plus the rate it was recorded at
struct Recording {
    _stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
}

fn open_microphone() -> Result<Recording> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| ParleyError::CaptureUnavailable("no input device".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| ParleyError::Capture(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let channels = config.channels as usize;

    debug!(
        "Opening {} at {} Hz, {} channel(s), {:?}",
        device.name().unwrap_or_default(),
        config.sample_rate.0,
        channels,
        sample_format
    );

    let samples = Arc::new(Mutex::new(Vec::new()));
    let on_error = |e: cpal::StreamError| error!("Audio capture error: {}", e);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            let buffer = Arc::clone(&samples);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    buffer.lock().extend(downmix(data, channels));
                },
                on_error,
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let buffer = Arc::clone(&samples);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    buffer.lock().extend(downmix(&converted, channels));
                },
                on_error,
                None,
            )
        }
        other => {
            return Err(ParleyError::Capture(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| ParleyError::Capture(e.to_string()))?;

    stream
        .play()
        .map_err(|e| ParleyError::Capture(e.to_string()))?;

    Ok(Recording {
        _stream: stream,
        samples,
        sample_rate: config.sample_rate.0,
    })
}

/// Speech recognizer over the default microphone
///
/// Audio is buffered until `stop`, then uploaded in one piece. Every capture
/// ends with `Ended`, preceded by a `Transcript` or an `Error` when there is one.
pub struct MicrophoneRecognizer {
    service: Arc<SpeechService>,
    language: String,
    events: Option<Sender<CaptureEvent>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl MicrophoneRecognizer {
    pub fn new(service: Arc<SpeechService>) -> Self {
        Self {
            service,
            language: String::new(),
            events: None,
            stop_tx: None,
            worker: None,
        }
    }

    fn capture_worker(
        service: Arc<SpeechService>,
        language: String,
        events: Sender<CaptureEvent>,
        stop_rx: Receiver<()>,
        ready_tx: Sender<Result<()>>,
    ) {
        let recording = match open_microphone() {
            Ok(recording) => {
                let _ = ready_tx.send(Ok(()));
                recording
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        info!("Microphone open");

        // Dropped sender counts as stop
        let _ = stop_rx.recv();

        let Recording {
            _stream: stream,
            samples,
            sample_rate,
        } = recording;
        drop(stream);
        let samples = std::mem::take(&mut *samples.lock());
        debug!("Captured {} samples at {} Hz", samples.len(), sample_rate);

        if !samples.is_empty() {
            match Self::transcribe(&service, &samples, sample_rate, &language) {
                Ok(text) if !text.is_empty() => {
                    let _ = events.send(CaptureEvent::Transcript(text));
                }
                Ok(_) => debug!("Nothing recognised"),
                Err(e) => {
                    warn!("Recognition failed: {}", e);
                    let _ = events.send(CaptureEvent::Error("network".to_string()));
                }
            }
        }

        let _ = events.send(CaptureEvent::Ended);
    }

    fn transcribe(
        service: &SpeechService,
        samples: &[f32],
        sample_rate: u32,
        language: &str,
    ) -> Result<String> {
        let wav = samples_to_wav(samples, sample_rate)?;
        let runtime = Runtime::new()?;
        runtime.block_on(service.transcribe(wav, language))
    }
}

impl SpeechRecognizer for MicrophoneRecognizer {
    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn attach(&mut self, config: RecognizerConfig, events: Sender<CaptureEvent>) {
        self.language = config.language;
        self.events = Some(events);
    }

    fn start(&mut self) -> Result<()> {
        let events = self
            .events
            .clone()
            .ok_or_else(|| ParleyError::CaptureUnavailable("recognizer not attached".to_string()))?;

        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            return Err(ParleyError::Capture("previous capture still running".to_string()));
        }

        let (stop_tx, stop_rx) = bounded(1);
        let (ready_tx, ready_rx) = bounded(1);
        let service = Arc::clone(&self.service);
        let language = self.language.clone();

        let worker = std::thread::Builder::new()
            .name("parley-microphone".to_string())
            .spawn(move || Self::capture_worker(service, language, events, stop_rx, ready_tx))?;

        ready_rx
            .recv()
            .map_err(|_| ParleyError::Capture("capture worker exited".to_string()))??;

        self.stop_tx = Some(stop_tx);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        Ok(())
    }
}

enum PlaybackCommand {
    Speak(Utterance),
    Cancel,
    Shutdown,
}

fn voice_for<'a>(utterance: &'a Utterance, voices: &'a [Voice]) -> &'a str {
    utterance
        .voice
        .as_ref()
        .or_else(|| voices.first())
        .map(|v| v.name.as_str())
        .unwrap_or(FALLBACK_VOICE)
}

/// Speech synthesizer playing service audio on the default output device
pub struct SpeakerSynthesizer {
    service: Arc<SpeechService>,
    voices: Vec<Voice>,
    command_tx: Option<Sender<PlaybackCommand>>,
}

impl SpeakerSynthesizer {
    /// `voices` are the service's voice names, offered in `language`
    pub fn new(service: Arc<SpeechService>, voices: &[String], language: &str) -> Self {
        Self {
            service,
            voices: voices.iter().map(|name| Voice::new(name.clone(), language)).collect(),
            command_tx: None,
        }
    }

    fn playback_worker(
        service: Arc<SpeechService>,
        voices: Vec<Voice>,
        commands: Receiver<PlaybackCommand>,
        events: Sender<SynthesisEvent>,
    ) -> Result<()> {
        let (_output, handle) =
            OutputStream::try_default().map_err(|e| ParleyError::Synthesis(e.to_string()))?;
        let new_sink = || Sink::try_new(&handle).map_err(|e| ParleyError::Synthesis(e.to_string()));
        let runtime = Runtime::new()?;
        let mut sink = new_sink()?;
        let mut playing: Option<u64> = None;

        info!("Speaker open");

        loop {
            match commands.recv_timeout(DRAIN_POLL) {
                Ok(PlaybackCommand::Speak(utterance)) => {
                    let voice = voice_for(&utterance, &voices);
                    let audio = runtime.block_on(service.synthesize(
                        &utterance.text,
                        voice,
                        utterance.rate,
                    ));
                    match audio.and_then(|bytes| {
                        Decoder::new(Cursor::new(bytes))
                            .map_err(|e| ParleyError::Synthesis(e.to_string()))
                    }) {
                        Ok(source) => sink.append(source),
                        Err(e) => warn!("Skipping sentence: {}", e),
                    }
                    // Failed sentences still count towards the drain
                    playing = Some(utterance.stream);
                }
                Ok(PlaybackCommand::Cancel) => {
                    sink.stop();
                    sink = new_sink()?;
                    playing = None;
                }
                Ok(PlaybackCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            if let Some(stream) = playing {
                if sink.empty() && commands.is_empty() {
                    debug!("Playback of stream {} drained", stream);
                    let _ = events.send(SynthesisEvent::QueueDrained { stream });
                    playing = None;
                }
            }
        }

        info!("Speaker closed");
        Ok(())
    }
}

impl SpeechSynthesizer for SpeakerSynthesizer {
    fn is_available(&self) -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    fn attach(&mut self, events: Sender<SynthesisEvent>) {
        let (command_tx, command_rx) = unbounded();
        let service = Arc::clone(&self.service);
        let voices = self.voices.clone();

        let spawned = std::thread::Builder::new()
            .name("parley-speaker".to_string())
            .spawn(move || {
                if let Err(e) = Self::playback_worker(service, voices, command_rx, events) {
                    error!("Playback worker stopped: {}", e);
                }
            });

        match spawned {
            Ok(_) => self.command_tx = Some(command_tx),
            Err(e) => error!("Failed to start playback worker: {}", e),
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn enqueue(&mut self, utterance: Utterance) -> Result<()> {
        self.command_tx
            .as_ref()
            .ok_or_else(|| ParleyError::SynthesisUnavailable("speaker not attached".to_string()))?
            .send(PlaybackCommand::Speak(utterance))
            .map_err(|_| ParleyError::Synthesis("playback worker stopped".to_string()))
    }

    fn cancel(&mut self) {
        if let Some(tx) = &self.command_tx {
            let _ = tx.send(PlaybackCommand::Cancel);
        }
    }
}

impl Drop for SpeakerSynthesizer {
    fn drop(&mut self) {
        if let Some(tx) = &self.command_tx {
            let _ = tx.send(PlaybackCommand::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeechServiceConfig;

    fn utterance(voice: Option<Voice>) -> Utterance {
        Utterance {
            text: "สวัสดี".to_string(),
            language: "th-TH".to_string(),
            rate: 0.95,
            pitch: 1.0,
            voice,
            stream: 1,
        }
    }

    #[test]
    fn test_downmix_averages_frames() {
        let mixed: Vec<f32> = downmix(&[1.0, 0.0, 0.5, 0.5], 2).collect();
        assert_eq!(mixed, vec![0.5, 0.5]);

        let mono: Vec<f32> = downmix(&[0.25, -0.25], 1).collect();
        assert_eq!(mono, vec![0.25, -0.25]);
    }

    #[test]
    fn test_voice_for_prefers_selected_voice() {
        let voices = vec![Voice::new("nova", "th-TH"), Voice::new("alloy", "th-TH")];

        assert_eq!(voice_for(&utterance(Some(Voice::new("alloy", "th-TH"))), &voices), "alloy");
        assert_eq!(voice_for(&utterance(None), &voices), "nova");
        assert_eq!(voice_for(&utterance(None), &[]), FALLBACK_VOICE);
    }

    #[test]
    fn test_speaker_offers_configured_voices() {
        let service = Arc::new(SpeechService::new(&SpeechServiceConfig::default(), None));
        let speaker = SpeakerSynthesizer::new(service, &["nova".to_string()], "th-TH");

        assert_eq!(speaker.voices(), vec![Voice::new("nova", "th-TH")]);
    }

    #[test]
    fn test_unattached_engines_refuse_work() {
        let service = Arc::new(SpeechService::new(&SpeechServiceConfig::default(), None));

        let mut microphone = MicrophoneRecognizer::new(Arc::clone(&service));
        assert!(matches!(
            microphone.start(),
            Err(ParleyError::CaptureUnavailable(_))
        ));

        let mut speaker = SpeakerSynthesizer::new(service, &[], "th-TH");
        assert!(matches!(
            speaker.enqueue(utterance(None)),
            Err(ParleyError::SynthesisUnavailable(_))
        ));
    }
}
