//! Reusable widgets for the chat window

pub mod input_bar;
pub mod message_list;

pub use input_bar::{InputAction, InputBar, InputState};
pub use message_list::MessageList;
