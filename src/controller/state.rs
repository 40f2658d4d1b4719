//! Session state owned by the turn controller

use crate::messages::{ConversationHistory, HistoryEntry, HistoryUpdate};
use crate::speech::PlaybackGate;
use uuid::Uuid;

/// Where the conversation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight
    Idle,
    /// Voice capture is running
    Listening,
    /// An exchange is in flight; new submissions are rejected
    AwaitingResponse,
    /// A reply is being spoken; behaves like `Idle` for the turn lock
    Speaking,
}

/// The exchange currently holding the turn lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    pub request_id: Uuid,
    pub query: String,
}

/// History and in-flight exchange
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    history: ConversationHistory,
    confirmed: bool,
    in_flight: Option<PendingExchange>,
}

impl ConversationState {
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Whether the local history is the service's copy rather than a local guess
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn in_flight(&self) -> Option<&PendingExchange> {
        self.in_flight.as_ref()
    }

    /// Add an entry that only exists locally (e.g. the greeting)
    pub fn seed(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        self.confirmed = false;
    }

    /// Replace the local history wholesale
    pub fn apply(&mut self, update: HistoryUpdate) {
        self.confirmed = update.is_confirmed();
        self.history = update.into_history();
    }
}

/// Every flag the controller owns. Other components only get copies.
#[derive(Debug, Clone)]
pub struct SessionState {
    conversation: ConversationState,
    sound_enabled: bool,
    audio_unlocked: bool,
    listening: bool,
    speaking: bool,
}

impl SessionState {
    pub fn new(sound_enabled: bool) -> Self {
        Self {
            conversation: ConversationState::default(),
            sound_enabled,
            audio_unlocked: false,
            listening: false,
            speaking: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_busy() {
            Phase::AwaitingResponse
        } else if self.listening {
            Phase::Listening
        } else if self.speaking {
            Phase::Speaking
        } else {
            Phase::Idle
        }
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationState {
        &mut self.conversation
    }

    /// Whether the turn lock is held
    pub fn is_busy(&self) -> bool {
        self.conversation.in_flight.is_some()
    }

    /// Take the turn lock for `request_id`. Fails if it is already held.
    pub fn lock(&mut self, request_id: Uuid, query: impl Into<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.conversation.in_flight = Some(PendingExchange {
            request_id,
            query: query.into(),
        });
        true
    }

    /// Release the turn lock if it is held for `request_id`
    pub fn release(&mut self, request_id: Uuid) -> bool {
        match &self.conversation.in_flight {
            Some(pending) if pending.request_id == request_id => {
                self.conversation.in_flight = None;
                true
            }
            _ => false,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Flip the sound preference and return the new value
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    pub fn audio_unlocked(&self) -> bool {
        self.audio_unlocked
    }

    /// Close the audio latch. Returns true only the first time.
    pub fn unlock_audio(&mut self) -> bool {
        if self.audio_unlocked {
            return false;
        }
        self.audio_unlocked = true;
        true
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn set_speaking(&mut self, speaking: bool) {
        self.speaking = speaking;
    }

    pub fn playback_gate(&self) -> PlaybackGate {
        PlaybackGate {
            sound_enabled: self.sound_enabled,
            audio_unlocked: self.audio_unlocked,
        }
    }
}
