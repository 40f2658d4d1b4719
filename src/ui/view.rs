//! Renderer state shared between the controller thread and the window

use crate::messages::{ImageAttribution, Role, Turn, TurnLog};
use crate::ui::Renderer;
use parking_lot::Mutex;
use std::sync::Arc;

/// Platform credited in image captions
pub const IMAGE_PLATFORM: &str = "Unsplash";
pub const IMAGE_PLATFORM_URL: &str = "https://unsplash.com";

/// Thumbnail and caption drawn under an assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    /// Image source for the thumbnail
    pub thumbnail_url: String,
    /// Where clicking the thumbnail or the photographer's name goes
    pub link_url: String,
    /// Alt and hover text
    pub alt: String,
    pub photographer: String,
    pub platform: &'static str,
}

impl ImageBlock {
    fn from_attribution(image: &ImageAttribution) -> Self {
        Self {
            thumbnail_url: image.url.clone(),
            link_url: image.photographer_profile_url.clone(),
            alt: image.description.clone(),
            photographer: image.photographer_name.clone(),
            platform: IMAGE_PLATFORM,
        }
    }

    pub fn caption(&self) -> String {
        format!("Photo by {} on {}", self.photographer, self.platform)
    }
}

/// Image block for a turn, if it should have one
pub fn image_block(turn: &Turn) -> Option<ImageBlock> {
    if turn.role() != Role::Assistant {
        return None;
    }
    turn.image()
        .filter(|image| !image.url.is_empty())
        .map(ImageBlock::from_attribution)
}

/// Control state of the window
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub input_enabled: bool,
    pub thinking: bool,
    pub placeholder: String,
    pub listening: bool,
    pub sound_enabled: bool,
    pub capture_available: bool,
    /// Focus requests not yet applied by the window
    pub focus_requests: usize,
    /// Set when a turn was appended and the log should scroll to the bottom
    pub scroll_to_bottom: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            input_enabled: true,
            thinking: false,
            placeholder: String::new(),
            listening: false,
            sound_enabled: true,
            capture_available: false,
            focus_requests: 0,
            scroll_to_bottom: false,
        }
    }
}

/// Cloneable renderer; every clone sees the same log and surface
#[derive(Debug, Clone, Default)]
pub struct ChatView {
    log: TurnLog,
    surface: Arc<Mutex<Surface>>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.log.get_all()
    }

    /// Snapshot of the control state
    pub fn surface(&self) -> Surface {
        self.surface.lock().clone()
    }

    /// Consume a pending focus request
    pub fn take_focus_request(&self) -> bool {
        let mut surface = self.surface.lock();
        if surface.focus_requests > 0 {
            surface.focus_requests = 0;
            true
        } else {
            false
        }
    }

    /// Consume a pending scroll request
    pub fn take_scroll_request(&self) -> bool {
        std::mem::take(&mut self.surface.lock().scroll_to_bottom)
    }
}

impl Renderer for ChatView {
    fn render(&mut self, turn: &Turn) {
        self.log.append(turn.clone());
        self.surface.lock().scroll_to_bottom = true;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.surface.lock().input_enabled = enabled;
    }

    fn set_thinking(&mut self, thinking: bool) {
        self.surface.lock().thinking = thinking;
    }

    fn set_placeholder(&mut self, text: &str) {
        self.surface.lock().placeholder = text.to_string();
    }

    fn focus_input(&mut self) {
        self.surface.lock().focus_requests += 1;
    }

    fn set_listening(&mut self, listening: bool) {
        self.surface.lock().listening = listening;
    }

    fn set_sound_enabled(&mut self, enabled: bool) {
        self.surface.lock().sound_enabled = enabled;
    }

    fn set_capture_available(&mut self, available: bool) {
        self.surface.lock().capture_available = available;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> ImageAttribution {
        ImageAttribution {
            url: "u".into(),
            description: "d".into(),
            photographer_name: "p".into(),
            photographer_profile_url: "x".into(),
        }
    }

    #[test]
    fn test_image_block_links_to_profile() {
        let turn = Turn::assistant("look", Some(photo()));
        let block = image_block(&turn).unwrap();

        assert_eq!(block.thumbnail_url, "u");
        assert_eq!(block.link_url, "x");
        assert_eq!(block.alt, "d");
        assert_eq!(block.caption(), "Photo by p on Unsplash");
    }

    #[test]
    fn test_no_image_block_without_url() {
        let mut image = photo();
        image.url.clear();
        assert!(image_block(&Turn::assistant("a", Some(image))).is_none());
        assert!(image_block(&Turn::assistant("a", None)).is_none());
    }

    #[test]
    fn test_render_appends_and_requests_scroll() {
        let mut view = ChatView::new();
        let observer = view.clone();

        view.render(&Turn::user("one"));
        view.render(&Turn::assistant("two", None));

        let texts: Vec<String> = observer.turns().iter().map(|t| t.text().to_string()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(observer.take_scroll_request());
        assert!(!observer.take_scroll_request());
    }

    #[test]
    fn test_focus_requests_are_consumed_once() {
        let mut view = ChatView::new();
        view.focus_input();
        view.focus_input();

        assert!(view.take_focus_request());
        assert!(!view.take_focus_request());
    }
}
