pub mod storage;
pub mod types;

pub use storage::TurnLog;
pub use types::{ConversationHistory, HistoryEntry, HistoryUpdate, ImageAttribution, Role, Turn};
