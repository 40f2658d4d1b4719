//! Turn-taking controller
//!
//! Coordinates voice capture, the answer service, rendering and voice
//! playback so that only one exchange is ever in flight.

pub mod state;
pub mod turn;

pub use state::{ConversationState, PendingExchange, Phase, SessionState};
pub use turn::{ControllerBuilder, ControllerCommand, ControllerHandle, TurnController};
