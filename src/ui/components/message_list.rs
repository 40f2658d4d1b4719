//! Message list component
//!
//! Displays the conversation log, with a clickable thumbnail and photo credit
//! under assistant replies that carry an image. Thumbnails are fetched by the
//! image loaders installed on the context; clicking one reports its link.

use crate::messages::{Role, Turn};
use crate::ui::theme::Theme;
use crate::ui::view::{image_block, ImageBlock, IMAGE_PLATFORM_URL};
use egui::{self, Align, Color32, RichText};

/// Largest size a thumbnail is drawn at
const THUMBNAIL_MAX: egui::Vec2 = egui::vec2(240.0, 160.0);

/// Message list component
pub struct MessageList<'a> {
    turns: &'a [Turn],
    thinking: bool,
    scroll_to_bottom: bool,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(turns: &'a [Turn], theme: &'a Theme) -> Self {
        Self {
            turns,
            thinking: false,
            scroll_to_bottom: false,
            theme,
        }
    }

    /// Show the typing indicator after the last turn
    pub fn thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }

    /// Scroll to the newest turn on this frame
    pub fn scroll_to_bottom(mut self, scroll: bool) -> Self {
        self.scroll_to_bottom = scroll;
        self
    }

    /// Draw the log; returns the link of a thumbnail clicked this frame
    pub fn show(self, ui: &mut egui::Ui) -> Option<String> {
        let mut opened = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(self.theme.spacing);

                    for turn in self.turns {
                        if let Some(link) = self.show_turn(ui, turn) {
                            opened = Some(link);
                        }
                        ui.add_space(self.theme.spacing_sm);
                    }

                    if self.thinking {
                        self.show_thinking(ui);
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(Align::BOTTOM));
                    }

                    ui.add_space(self.theme.spacing);
                });
            });
        opened
    }

    fn show_turn(&self, ui: &mut egui::Ui, turn: &Turn) -> Option<String> {
        let is_user = turn.role() == Role::User;
        let bubble_color = if is_user {
            self.theme.user_bubble
        } else {
            self.theme.assistant_bubble
        };
        let text_color = if is_user {
            Color32::WHITE
        } else {
            self.theme.text_primary
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };

        let mut opened = None;
        ui.with_layout(egui::Layout::top_down(align), |ui| {
            let max_width = ui.available_width() * 0.75;

            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);

                    let label = if is_user {
                        format!("User message: {}", turn.text())
                    } else {
                        format!("Assistant response: {}", turn.text())
                    };
                    let response = ui.label(RichText::new(turn.text()).color(text_color));
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                    });

                    if let Some(block) = image_block(turn) {
                        ui.add_space(self.theme.spacing_sm);
                        if self.show_image(ui, &block) {
                            opened = Some(block.link_url.clone());
                        }
                    }
                });

            let time_str = turn.timestamp().format("%H:%M").to_string();
            ui.label(RichText::new(time_str).size(10.0).color(self.theme.text_muted));
        });
        opened
    }

    /// Returns true when the thumbnail was clicked
    fn show_image(&self, ui: &mut egui::Ui, block: &ImageBlock) -> bool {
        ui.vertical(|ui| {
            let thumbnail = ui
                .add(
                    egui::Image::from_uri(&block.thumbnail_url)
                        .max_size(THUMBNAIL_MAX)
                        .maintain_aspect_ratio(true)
                        .rounding(self.theme.button_rounding)
                        .sense(egui::Sense::click()),
                )
                .on_hover_text(block.alt.as_str())
                .on_hover_cursor(egui::CursorIcon::PointingHand);
            thumbnail.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::ImageButton, true, &block.thumbnail_url)
            });

            ui.horizontal_wrapped(|ui| {
                let caption = block.caption();
                let response = ui.label(RichText::new("Photo by").size(11.0).color(self.theme.text_muted));
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &caption)
                });
                ui.hyperlink_to(RichText::new(&block.photographer).size(11.0), &block.link_url);
                ui.label(RichText::new("on").size(11.0).color(self.theme.text_muted));
                ui.hyperlink_to(RichText::new(block.platform).size(11.0), IMAGE_PLATFORM_URL);
            });

            thumbnail.clicked()
        })
        .inner
    }

    fn show_thinking(&self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
            egui::Frame::none()
                .fill(self.theme.assistant_bubble)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for i in 0..3 {
                            let t = ui.ctx().input(|i| i.time);
                            let alpha = ((t * 3.0 + i as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                            ui.label(
                                RichText::new("●")
                                    .size(10.0)
                                    .color(self.theme.text_muted.gamma_multiply(alpha)),
                            );
                        }
                    });
                });
        });

        ui.ctx().request_repaint();
    }
}
