//! Turn controller
//!
//! Owns the session state and handles one message at a time from the window,
//! the capture engine, the playback engine and the exchange pipeline. Nothing
//! else mutates the session, so capture, network, display and playback can
//! never interleave out of order.

use crate::client::{
    AnswerTransport, ConversationClient, ExchangeCommand, ExchangeEvent, ExchangePipeline,
    ExchangeResponse, HttpTransport,
};
use crate::config::ParleyConfig;
use crate::controller::state::{Phase, SessionState};
use crate::messages::{HistoryEntry, Turn};
use crate::speech::{
    CaptureEvent, SpeechRecognizer, SpeechSynthesizer, SynthesisEvent, UnsupportedRecognizer,
    UnsupportedSynthesizer, VoiceInputProvider, VoiceOutputProvider,
};
use crate::ui::{ChatView, Renderer};
use crate::utils::ControllerChannels;
use crate::{ParleyError, Result};
use crossbeam_channel::{never, Receiver, Select, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commands that can be sent to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCommand {
    /// Typed text was submitted
    Submit(String),

    /// The capture control was pressed
    StartCapture,

    /// The capture control was released
    StopCapture,

    /// The pointer left the capture control while holding it
    LeaveCapture,

    /// The sound toggle was clicked
    ToggleSound,

    /// Any click or key press in the window
    UserGesture,

    /// Stop the controller
    Shutdown,
}

/// Handle for controlling the turn controller from the UI
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: Sender<ControllerCommand>,
}

impl ControllerHandle {
    /// Send a command to the controller
    pub fn send_command(&self, cmd: ControllerCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| ParleyError::Channel(format!("Failed to send command: {}", e)))
    }

    pub fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(ControllerCommand::Submit(text.into()))
    }

    pub fn start_capture(&self) -> Result<()> {
        self.send_command(ControllerCommand::StartCapture)
    }

    pub fn stop_capture(&self) -> Result<()> {
        self.send_command(ControllerCommand::StopCapture)
    }

    pub fn leave_capture(&self) -> Result<()> {
        self.send_command(ControllerCommand::LeaveCapture)
    }

    pub fn toggle_sound(&self) -> Result<()> {
        self.send_command(ControllerCommand::ToggleSound)
    }

    pub fn user_gesture(&self) -> Result<()> {
        self.send_command(ControllerCommand::UserGesture)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(ControllerCommand::Shutdown)
    }
}

/// One message taken off the event loop
#[derive(Debug)]
enum Inbound {
    Command(ControllerCommand),
    Capture(CaptureEvent),
    Synthesis(SynthesisEvent),
    Exchange(ExchangeEvent),
    ExchangeClosed,
}

/// The turn-taking state machine
pub struct TurnController {
    config: ParleyConfig,
    state: SessionState,
    client: ConversationClient,
    voice_in: VoiceInputProvider,
    voice_out: VoiceOutputProvider,
    renderer: Box<dyn Renderer>,
    channels: ControllerChannels,
    /// `None` once the exchange worker is gone
    exchange_tx: Option<Sender<ExchangeCommand>>,
    exchange_rx: Receiver<ExchangeEvent>,
}

impl TurnController {
    /// Create a controller, start its exchange worker and render the opening state
    pub fn new(
        config: ParleyConfig,
        transport: Arc<dyn AnswerTransport>,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        renderer: Box<dyn Renderer>,
    ) -> Result<(Self, ControllerHandle)> {
        config.validate()?;

        let channels = ControllerChannels::default();

        let client = ConversationClient::new(transport, config.fallback_apology.clone());
        let pipeline = ExchangePipeline::new(client.clone());
        let exchange_tx = Some(pipeline.command_sender());
        let exchange_rx = pipeline.event_receiver();
        pipeline.start_worker()?;

        let recognizer: Box<dyn SpeechRecognizer> = if config.enable_voice_input {
            recognizer
        } else {
            Box::new(UnsupportedRecognizer)
        };
        let synthesizer: Box<dyn SpeechSynthesizer> = if config.enable_voice_output {
            synthesizer
        } else {
            Box::new(UnsupportedSynthesizer)
        };

        let voice_in =
            VoiceInputProvider::new(recognizer, &config.voice, channels.capture_tx.clone());
        let voice_out = VoiceOutputProvider::new(
            synthesizer,
            config.voice.clone(),
            channels.synthesis_tx.clone(),
        );

        let handle = ControllerHandle {
            command_tx: channels.command_tx.clone(),
        };

        let mut controller = Self {
            state: SessionState::new(config.sound_enabled),
            config,
            client,
            voice_in,
            voice_out,
            renderer,
            channels,
            exchange_tx,
            exchange_rx,
        };
        controller.initialize();

        Ok((controller, handle))
    }

    fn initialize(&mut self) {
        self.renderer
            .set_capture_available(self.voice_in.is_available());
        self.renderer.set_sound_enabled(self.state.sound_enabled());
        self.renderer.set_input_enabled(true);
        self.renderer.set_thinking(false);
        self.renderer.set_placeholder(&self.config.placeholders.idle);

        if let Some(greeting) = self.config.greeting.clone() {
            let turn = Turn::assistant(greeting, None);
            self.renderer.render(&turn);
            self.state.conversation_mut().seed(HistoryEntry::from(&turn));
        }

        self.renderer.focus_input();
        info!(
            "Turn controller ready (voice input: {}, voice output: {})",
            self.voice_in.is_available(),
            self.voice_out.is_available()
        );
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the event loop on the current thread until shutdown
    pub fn run(mut self) {
        info!("Turn controller started");
        while let Some(inbound) = self.next_inbound(None) {
            if !self.dispatch(inbound) {
                break;
            }
        }
        info!("Turn controller stopped");
    }

    /// Run the event loop on its own thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("parley-controller".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    /// Handle at most one pending message, waiting up to `timeout` for it.
    ///
    /// Returns whether a message was handled.
    pub fn poll(&mut self, timeout: Duration) -> bool {
        match self.next_inbound(Some(timeout)) {
            Some(inbound) => {
                self.dispatch(inbound);
                true
            }
            None => false,
        }
    }

    fn next_inbound(&self, timeout: Option<Duration>) -> Option<Inbound> {
        let mut select = Select::new();
        let commands = select.recv(&self.channels.command_rx);
        let captures = select.recv(&self.channels.capture_rx);
        let synthesis = select.recv(&self.channels.synthesis_rx);
        select.recv(&self.exchange_rx);

        let operation = match timeout {
            Some(timeout) => select.select_timeout(timeout).ok()?,
            None => select.select(),
        };

        let index = operation.index();
        let inbound = if index == commands {
            Inbound::Command(operation.recv(&self.channels.command_rx).ok()?)
        } else if index == captures {
            Inbound::Capture(operation.recv(&self.channels.capture_rx).ok()?)
        } else if index == synthesis {
            Inbound::Synthesis(operation.recv(&self.channels.synthesis_rx).ok()?)
        } else {
            match operation.recv(&self.exchange_rx) {
                Ok(event) => Inbound::Exchange(event),
                Err(_) => Inbound::ExchangeClosed,
            }
        };

        Some(inbound)
    }

    fn dispatch(&mut self, inbound: Inbound) -> bool {
        match inbound {
            Inbound::Command(cmd) => return self.handle_command(cmd),
            Inbound::Capture(event) => self.handle_capture_event(event),
            Inbound::Synthesis(event) => self.handle_synthesis_event(event),
            Inbound::Exchange(event) => self.handle_exchange_event(event),
            Inbound::ExchangeClosed => self.handle_exchange_closed(),
        }
        true
    }

    /// Apply a command. Returns false once the controller should stop.
    pub fn handle_command(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::Submit(text) => {
                self.note_gesture();
                self.submit(&text);
            }
            ControllerCommand::StartCapture => {
                self.note_gesture();
                self.start_capture();
            }
            ControllerCommand::StopCapture => self.stop_capture(),
            ControllerCommand::LeaveCapture => {
                if self.state.is_listening() {
                    debug!("Pointer left the capture control");
                    self.stop_capture();
                }
            }
            ControllerCommand::ToggleSound => {
                self.note_gesture();
                self.toggle_sound();
            }
            ControllerCommand::UserGesture => self.note_gesture(),
            ControllerCommand::Shutdown => {
                info!("Turn controller shutdown requested");
                self.voice_out.cancel();
                if let Some(tx) = &self.exchange_tx {
                    let _ = tx.send(ExchangeCommand::Shutdown);
                }
                return false;
            }
        }
        true
    }

    pub fn handle_capture_event(&mut self, event: CaptureEvent) {
        let Some(event) = self.voice_in.accept(event) else {
            return;
        };

        self.state.set_listening(false);
        self.renderer.set_listening(false);

        match event {
            CaptureEvent::Transcript(text) => {
                info!("Transcript received ({} chars)", text.chars().count());
                self.submit(&text);
                if !self.state.is_busy() {
                    self.renderer.set_placeholder(&self.config.placeholders.idle);
                }
            }
            CaptureEvent::Error(reason) => {
                warn!("Voice capture failed: {}", reason);
                if self.state.is_busy() {
                    self.renderer
                        .set_placeholder(&self.config.placeholders.thinking);
                } else {
                    self.renderer
                        .set_placeholder(&self.config.placeholders.capture_error);
                }
            }
            CaptureEvent::Ended => {
                debug!("Voice capture ended without a result");
                if self.state.is_busy() {
                    self.renderer
                        .set_placeholder(&self.config.placeholders.thinking);
                } else {
                    self.renderer.set_placeholder(&self.config.placeholders.idle);
                }
            }
        }
    }

    pub fn handle_synthesis_event(&mut self, event: SynthesisEvent) {
        match event {
            SynthesisEvent::VoicesChanged => self.voice_out.refresh_voices(),
            SynthesisEvent::QueueDrained { stream } => {
                if !self.voice_out.is_current_stream(stream) {
                    debug!("Ignoring drain of superseded playback stream {}", stream);
                    return;
                }
                debug!("Playback finished");
                self.state.set_speaking(false);
            }
        }
    }

    pub fn handle_exchange_event(&mut self, event: ExchangeEvent) {
        match event {
            ExchangeEvent::Settled {
                request_id,
                response,
            } => self.settle(request_id, response),
            ExchangeEvent::Shutdown => debug!("Exchange pipeline shut down"),
        }
    }

    fn handle_exchange_closed(&mut self) {
        error!("Exchange pipeline stopped unexpectedly");
        self.exchange_rx = never();
        self.exchange_tx = None;

        if let Some(pending) = self.state.conversation().in_flight().cloned() {
            let response = self
                .client
                .fallback(&pending.query, self.state.conversation().history());
            self.settle(pending.request_id, response);
        }
    }

    fn note_gesture(&mut self) {
        if self.state.unlock_audio() {
            info!("Audio unlocked by user gesture");
        }
    }

    fn submit(&mut self, text: &str) {
        let query = text.trim();
        if query.is_empty() {
            debug!("Dropping empty submission");
            return;
        }

        let request_id = Uuid::new_v4();
        if !self.state.lock(request_id, query) {
            info!("Rejecting submission while awaiting a response");
            return;
        }

        self.renderer.render(&Turn::user(query));
        self.enter_awaiting();

        debug!("Sending exchange request: {}", request_id);
        let command = ExchangeCommand::Exchange {
            query: query.to_string(),
            history: self.state.conversation().history().clone(),
            request_id,
        };
        let sent = match &self.exchange_tx {
            Some(tx) => tx.send(command).map_err(|e| e.to_string()),
            None => Err("worker stopped".to_string()),
        };
        if let Err(e) = sent {
            error!("Exchange pipeline unavailable: {}", e);
            let response = self
                .client
                .fallback(query, self.state.conversation().history());
            self.settle(request_id, response);
        }
    }

    fn settle(&mut self, request_id: Uuid, response: ExchangeResponse) {
        if !self.state.release(request_id) {
            warn!("Ignoring response for unknown request {}", request_id);
            return;
        }

        let ExchangeResponse {
            answer,
            history,
            image,
        } = response;

        if !history.is_confirmed() {
            warn!("Exchange fell back, keeping speculative history");
        }
        self.state.conversation_mut().apply(history);

        let turn = Turn::assistant(answer, image);
        self.renderer.render(&turn);
        self.exit_awaiting();

        let queued = self.voice_out.speak(turn.text(), self.state.playback_gate());
        if queued > 0 {
            self.state.set_speaking(true);
        }
    }

    fn enter_awaiting(&mut self) {
        self.renderer.set_input_enabled(false);
        self.renderer.set_thinking(true);
        self.renderer.set_placeholder(&self.config.placeholders.thinking);
    }

    fn exit_awaiting(&mut self) {
        self.renderer.set_input_enabled(true);
        self.renderer.set_thinking(false);
        if self.state.is_listening() {
            self.renderer
                .set_placeholder(&self.config.placeholders.listening);
        } else {
            self.renderer.set_placeholder(&self.config.placeholders.idle);
        }
        self.renderer.focus_input();
    }

    fn start_capture(&mut self) {
        if self.state.is_busy() {
            debug!("Ignoring capture start while awaiting a response");
            return;
        }

        if self.voice_in.start() {
            self.state.set_listening(true);
            self.renderer.set_listening(true);
            self.renderer
                .set_placeholder(&self.config.placeholders.listening);
        }
    }

    fn stop_capture(&mut self) {
        if !self.state.is_listening() {
            return;
        }

        self.voice_in.stop();
        self.state.set_listening(false);
        self.renderer.set_listening(false);
        if !self.state.is_busy() {
            self.renderer
                .set_placeholder(&self.config.placeholders.processing);
        }
    }

    fn toggle_sound(&mut self) {
        let enabled = self.state.toggle_sound();
        self.renderer.set_sound_enabled(enabled);

        if !enabled {
            if self.state.is_speaking() {
                debug!("Halting playback");
            }
            self.voice_out.cancel();
            self.state.set_speaking(false);
        }
        info!("Sound {}", if enabled { "enabled" } else { "disabled" });
    }
}

/// Builder for creating a turn controller
pub struct ControllerBuilder {
    config: ParleyConfig,
    transport: Option<Arc<dyn AnswerTransport>>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl ControllerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ParleyConfig::default(),
            transport: None,
            recognizer: None,
            synthesizer: None,
            renderer: None,
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: ParleyConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom transport instead of HTTP to the configured endpoint
    pub fn with_transport(mut self, transport: Arc<dyn AnswerTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the speech recognition engine
    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Set the speech synthesis engine
    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Set the renderer
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Build the controller
    pub fn build(self) -> Result<(TurnController, ControllerHandle)> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.endpoint.clone())),
        };

        TurnController::new(
            self.config,
            transport,
            self.recognizer
                .unwrap_or_else(|| Box::new(UnsupportedRecognizer)),
            self.synthesizer
                .unwrap_or_else(|| Box::new(UnsupportedSynthesizer)),
            self.renderer.unwrap_or_else(|| Box::new(ChatView::new())),
        )
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
