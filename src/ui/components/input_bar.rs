//! Input bar component
//!
//! Provides the text input, the press-and-hold capture button, the sound
//! toggle and the send button. The bar never talks to the controller itself;
//! it reports what the user did as [`InputAction`]s.

use crate::ui::theme::Theme;
use crate::ui::view::Surface;
use egui::{self, Key, RichText, Vec2};

/// Id of the text input, used to move focus to it
pub const INPUT_ID: &str = "message_input";

/// Something the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Submit(String),
    StartCapture,
    StopCapture,
    LeaveCapture,
    ToggleSound,
}

/// Window-side input state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current contents of the text input
    pub text: String,
    /// Whether the capture button is being held
    pub capture_held: bool,
}

impl InputState {
    /// Take the text for submission, leaving the input empty
    fn take_submission(&mut self) -> Option<InputAction> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(InputAction::Submit(std::mem::take(&mut self.text)))
    }
}

/// Input bar component for text and voice input
pub struct InputBar<'a> {
    input: &'a mut InputState,
    surface: &'a Surface,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a mut InputState, surface: &'a Surface, theme: &'a Theme) -> Self {
        Self {
            input,
            surface,
            theme,
        }
    }

    /// Draw the bar and return the actions triggered this frame
    pub fn show(mut self, ui: &mut egui::Ui) -> Vec<InputAction> {
        let mut actions = Vec::new();

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_sound_toggle(ui, &mut actions);

                    if self.surface.capture_available {
                        self.show_capture_button(ui, &mut actions);
                    }

                    ui.add_space(self.theme.spacing_sm);
                    self.show_text_input(ui, &mut actions);
                    ui.add_space(self.theme.spacing_sm);
                    self.show_send_button(ui, &mut actions);
                });
            });

        actions
    }

    fn show_sound_toggle(&mut self, ui: &mut egui::Ui, actions: &mut Vec<InputAction>) {
        let (icon, tooltip, color) = if self.surface.sound_enabled {
            ("🔊", "Mute", self.theme.text_secondary)
        } else {
            ("🔇", "Unmute", self.theme.warning)
        };

        let button = egui::Button::new(RichText::new(icon).size(18.0).color(color))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding);

        let response = ui.add(button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Toggle sound")
        });

        if response.clicked() {
            actions.push(InputAction::ToggleSound);
        }
        response.on_hover_text(tooltip);
    }

    fn show_capture_button(&mut self, ui: &mut egui::Ui, actions: &mut Vec<InputAction>) {
        let enabled = !self.surface.thinking;
        let color = if self.surface.listening {
            self.theme.listening
        } else {
            self.theme.text_secondary
        };

        let mut button = egui::Button::new(RichText::new("🎤").size(20.0).color(color))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding);
        if self.surface.listening {
            button = button.fill(self.theme.listening.gamma_multiply(0.2));
        }

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Hold to talk")
        });

        let is_pointer_down = response.is_pointer_button_down_on();
        let is_inside = response.contains_pointer();

        // Press-and-hold: react to edges only
        if is_pointer_down && !self.input.capture_held && enabled {
            self.input.capture_held = true;
            actions.push(InputAction::StartCapture);
        } else if self.input.capture_held && !is_pointer_down {
            self.input.capture_held = false;
            actions.push(InputAction::StopCapture);
        } else if self.input.capture_held && !is_inside {
            self.input.capture_held = false;
            actions.push(InputAction::LeaveCapture);
        }

        if self.surface.listening {
            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui, actions: &mut Vec<InputAction>) {
        let available_width = ui.available_width() - 60.0; // Reserve space for send button

        let text_edit = egui::TextEdit::singleline(&mut self.input.text)
            .hint_text(self.surface.placeholder.as_str())
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new(INPUT_ID));

        let response = ui.add_enabled(self.surface.input_enabled, text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(
                egui::WidgetType::TextEdit,
                self.surface.input_enabled,
                "Message input",
            )
        });

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            actions.extend(self.input.take_submission());
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui, actions: &mut Vec<InputAction>) {
        let can_send = self.surface.input_enabled && !self.input.text.trim().is_empty();

        let button_color = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding)
            .fill(button_color);

        let response = ui.add_enabled(can_send, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            actions.extend(self.input.take_submission());
        }

        response.on_hover_text("Send message (Enter)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_not_submitted() {
        let mut input = InputState {
            text: "   ".to_string(),
            capture_held: false,
        };
        assert_eq!(input.take_submission(), None);
        assert_eq!(input.text, "   ");
    }

    #[test]
    fn test_submission_clears_text() {
        let mut input = InputState {
            text: "hello".to_string(),
            capture_held: false,
        };
        assert_eq!(
            input.take_submission(),
            Some(InputAction::Submit("hello".to_string()))
        );
        assert!(input.text.is_empty());
    }
}
