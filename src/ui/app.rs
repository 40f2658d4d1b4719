//! Main application struct and eframe integration
//!
//! The window only draws what the controller rendered into the shared
//! [`ChatView`] and forwards user actions through the [`ControllerHandle`].

use crate::controller::ControllerHandle;
use crate::ui::components::input_bar::INPUT_ID;
use crate::ui::components::{InputAction, InputBar, InputState, MessageList};
use crate::ui::theme::Theme;
use crate::ui::view::ChatView;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::time::Duration;
use tracing::warn;

/// Main Parley window
pub struct ParleyApp {
    view: ChatView,
    handle: ControllerHandle,
    input: InputState,
    theme: Theme,
    gesture_sent: bool,
}

impl ParleyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, view: ChatView, handle: ControllerHandle) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);
        egui_extras::install_image_loaders(&cc.egui_ctx);

        Self {
            view,
            handle,
            input: InputState::default(),
            theme,
            gesture_sent: false,
        }
    }

    /// Report the first click or key press so playback may start
    fn detect_gesture(&mut self, ctx: &egui::Context) {
        if self.gesture_sent {
            return;
        }
        let gesture = ctx.input(|i| {
            i.pointer.any_click()
                || i
                    .events
                    .iter()
                    .any(|e| matches!(e, egui::Event::Key { pressed: true, .. }))
        });
        if gesture {
            self.gesture_sent = true;
            if let Err(e) = self.handle.user_gesture() {
                warn!("Failed to reach controller: {}", e);
            }
        }
    }

    fn dispatch(&self, action: InputAction) {
        let result = match action {
            InputAction::Submit(text) => self.handle.submit(text),
            InputAction::StartCapture => self.handle.start_capture(),
            InputAction::StopCapture => self.handle.stop_capture(),
            InputAction::LeaveCapture => self.handle.leave_capture(),
            InputAction::ToggleSound => self.handle.toggle_sound(),
        };
        if let Err(e) = result {
            warn!("Failed to reach controller: {}", e);
        }
    }

    fn show_header(&self, ctx: &egui::Context, thinking: bool) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let symbol_color = if thinking {
                        let t = ui.ctx().input(|i| i.time);
                        let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
                        self.theme.primary.gamma_multiply(0.4 + pulse * 0.6)
                    } else {
                        self.theme.primary
                    };
                    ui.label(RichText::new("◆").size(20.0).color(symbol_color));
                    ui.label(
                        RichText::new("Parley")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                });
            });
    }
}

impl eframe::App for ParleyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.detect_gesture(ctx);

        let surface = self.view.surface();
        let turns = self.view.turns();
        let scroll = self.view.take_scroll_request();

        self.show_header(ctx, surface.thinking);

        let actions = TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| InputBar::new(&mut self.input, &surface, &self.theme).show(ui))
            .inner;

        for action in actions {
            self.dispatch(action);
        }

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| {
                let opened = MessageList::new(&turns, &self.theme)
                    .thinking(surface.thinking)
                    .scroll_to_bottom(scroll)
                    .show(ui);
                if let Some(link) = opened {
                    ctx.open_url(egui::OpenUrl::new_tab(link));
                }
            });

        if self.view.take_focus_request() {
            ctx.memory_mut(|m| m.request_focus(egui::Id::new(INPUT_ID)));
        }

        // The controller updates the view from its own thread
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.handle.shutdown() {
            warn!("Failed to stop controller: {}", e);
        }
    }
}
