//! Display surface for the conversation
//!
//! The controller only talks to a [`Renderer`]; [`ChatView`] is the renderer
//! the desktop window draws from.

pub mod app;
pub mod components;
pub mod theme;
pub mod view;

pub use app::ParleyApp;
pub use theme::Theme;
pub use view::{image_block, ChatView, ImageBlock, Surface};

use crate::messages::Turn;

/// Rendering contract consumed by the turn controller
pub trait Renderer: Send {
    /// Append a turn to the visible log and scroll to it
    fn render(&mut self, turn: &Turn);

    /// Enable or disable the text input and submit control
    fn set_input_enabled(&mut self, enabled: bool);

    /// Show or hide the "thinking" indicator
    fn set_thinking(&mut self, thinking: bool);

    /// Replace the input placeholder wording
    fn set_placeholder(&mut self, text: &str);

    /// Move keyboard focus to the text input
    fn focus_input(&mut self);

    /// Highlight the capture control while listening
    fn set_listening(&mut self, listening: bool);

    /// Reflect the sound preference on the toggle control
    fn set_sound_enabled(&mut self, enabled: bool);

    /// Show the capture control only when recognition is supported
    fn set_capture_available(&mut self, available: bool);
}
