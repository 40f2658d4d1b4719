//! UI automation tests using egui_kittest and AccessKit
//!
//! These tests drive the real chat widgets and check the accessibility tree
//! and the actions the widgets report.

use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use parley::messages::{ImageAttribution, Turn};
use parley::ui::components::{InputAction, InputBar, InputState, MessageList};
use parley::ui::{Surface, Theme};

/// Widget state wrapper for testing
struct TestApp {
    input: InputState,
    surface: Surface,
    turns: Vec<Turn>,
    theme: Theme,
    actions: Vec<InputAction>,
    opened: Vec<String>,
}

impl TestApp {
    fn new() -> Self {
        Self {
            input: InputState::default(),
            surface: Surface {
                placeholder: "ถามคำถามของท่านที่นี่...".to_string(),
                capture_available: true,
                ..Surface::default()
            },
            turns: Vec::new(),
            theme: Theme::dark(),
            actions: Vec::new(),
            opened: Vec::new(),
        }
    }

    fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    fn with_surface(mut self, edit: impl FnOnce(&mut Surface)) -> Self {
        edit(&mut self.surface);
        self
    }
}

/// Render the chat widgets for testing
fn render_chat_ui(app: &mut TestApp, ui: &mut egui::Ui) {
    // Input first: the message list fills whatever height is left
    let actions = InputBar::new(&mut app.input, &app.surface, &app.theme).show(ui);
    app.actions.extend(actions);

    ui.separator();

    if let Some(link) = MessageList::new(&app.turns, &app.theme).show(ui) {
        app.opened.push(link);
    }
}

fn harness(app: TestApp) -> Harness<'static, TestApp> {
    Harness::builder()
        .with_size(egui::Vec2::new(480.0, 600.0))
        .build_state(
            |ctx, app: &mut TestApp| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    render_chat_ui(app, ui);
                });
            },
            app,
        )
}

#[test]
fn test_controls_are_accessible() {
    let mut harness = harness(TestApp::new());
    harness.run();

    let _input = harness.get_by_label("Message input");
    let _send = harness.get_by_label("Send message");
    let _sound = harness.get_by_label("Toggle sound");
    let _capture = harness.get_by_label("Hold to talk");
}

#[test]
fn test_capture_button_hidden_when_unsupported() {
    let app = TestApp::new().with_surface(|s| s.capture_available = false);
    let mut harness = harness(app);
    harness.run();

    assert!(harness.query_by_label("Hold to talk").is_none());
    let _input = harness.get_by_label("Message input");
}

#[test]
fn test_type_and_send_reports_submission() {
    let mut harness = harness(TestApp::new());
    harness.run();

    harness.get_by_label("Message input").focus();
    harness.run();

    harness
        .get_by_label("Message input")
        .type_text("ราคาสินค้าเท่าไร");
    harness.run();
    assert_eq!(harness.state().input.text, "ราคาสินค้าเท่าไร");

    harness.get_by_label("Send message").click();
    harness.run();

    assert_eq!(
        harness.state().actions,
        vec![InputAction::Submit("ราคาสินค้าเท่าไร".to_string())]
    );
    assert!(
        harness.state().input.text.is_empty(),
        "Input should be cleared after sending"
    );
}

#[test]
fn test_cannot_send_empty_message() {
    let mut harness = harness(TestApp::new());
    harness.run();

    harness.get_by_label("Send message").click();
    harness.run();

    assert!(harness.state().actions.is_empty());
}

#[test]
fn test_cannot_send_while_input_disabled() {
    let mut app = TestApp::new().with_surface(|s| s.input_enabled = false);
    app.input.text = "pending".to_string();
    let mut harness = harness(app);
    harness.run();

    harness.get_by_label("Send message").click();
    harness.run();

    assert!(harness.state().actions.is_empty());
    assert_eq!(harness.state().input.text, "pending");
}

#[test]
fn test_sound_toggle_reports_action() {
    let mut harness = harness(TestApp::new());
    harness.run();

    harness.get_by_label("Toggle sound").click();
    harness.run();

    assert_eq!(harness.state().actions, vec![InputAction::ToggleSound]);
}

#[test]
fn test_turns_appear_in_list() {
    let app = TestApp::new()
        .with_turn(Turn::user("ราคาสินค้าเท่าไร"))
        .with_turn(Turn::assistant("100 บาท", None));
    let mut harness = harness(app);
    harness.run();

    let _user = harness.get_by_label("User message: ราคาสินค้าเท่าไร");
    let _assistant = harness.get_by_label("Assistant response: 100 บาท");
    assert!(harness.query_by_label("Photo by p on Unsplash").is_none());
}

#[test]
fn test_image_reply_shows_thumbnail_and_caption() {
    let image = ImageAttribution {
        url: "https://images.test/u.jpg".into(),
        description: "d".into(),
        photographer_name: "p".into(),
        photographer_profile_url: "x".into(),
    };
    let app = TestApp::new().with_turn(Turn::assistant("Here you go.", Some(image)));
    let mut harness = harness(app);
    harness.run();

    let _reply = harness.get_by_label("Assistant response: Here you go.");
    let _thumbnail = harness.get_by_label("https://images.test/u.jpg");
    let _caption = harness.get_by_label("Photo by p on Unsplash");
}

#[test]
fn test_clicking_thumbnail_opens_profile() {
    let image = ImageAttribution {
        url: "https://images.test/u.jpg".into(),
        description: "Temple at dawn".into(),
        photographer_name: "p".into(),
        photographer_profile_url: "https://unsplash.com/@p".into(),
    };
    let app = TestApp::new().with_turn(Turn::assistant("Here you go.", Some(image)));
    let mut harness = harness(app);
    harness.run();
    assert!(harness.state().opened.is_empty());

    harness.get_by_label("https://images.test/u.jpg").click();
    harness.run();

    assert_eq!(
        harness.state().opened,
        vec!["https://unsplash.com/@p".to_string()]
    );
}
