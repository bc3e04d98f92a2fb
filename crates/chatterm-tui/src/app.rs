use std::collections::HashSet;

use chatterm_core::{
    ChatBackend, ChatClient, ChatError, Config, ExchangeOutcome, ExchangeReply, MessageId, Sender,
    Session,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

/// Fallback chat height until the first render reports the real one
const DEFAULT_CHAT_HEIGHT: u16 = 20;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App<B = ChatClient> {
    pub should_quit: bool,
    pub session: Session<B>,

    // Header text
    pub title: String,
    pub subtitle: String,

    // Input line
    pub input_cursor: usize, // cursor position in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,      // inner height, updated during render
    pub chat_width: u16,       // inner width, updated during render
    pub chat_total_lines: u16, // wrapped line count, updated during render
    pub follow_tail: bool,

    // Assistant messages produced by an error or a failed exchange
    pub failed_replies: HashSet<MessageId>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl<B: ChatBackend + 'static> App<B> {
    pub fn new(session: Session<B>, config: &Config) -> Self {
        Self {
            should_quit: false,
            session,
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            follow_tail: true,
            failed_replies: HashSet::new(),
            animation_frame: 0,
        }
    }

    /// Submit the input line and run the exchange on its own task.
    ///
    /// The outcome comes back as [`AppEvent::ExchangeFinished`]. A panicking
    /// exchange is reported as an aborted one so the session never stays busy.
    pub fn submit_input(&mut self, events: &UnboundedSender<AppEvent>) {
        let Some(exchange) = self.session.begin_submit_pending() else {
            return;
        };
        self.input_cursor = 0;
        self.follow_tail = true;

        let events = events.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(exchange.send()).await {
                Ok(outcome) => outcome,
                Err(e) => Err(ChatError::Aborted(e.to_string())),
            };
            if events.send(AppEvent::ExchangeFinished(outcome)).is_err() {
                tracing::debug!("event loop gone before exchange finished");
            }
        });
    }

    pub fn finish_exchange(&mut self, outcome: ExchangeOutcome) {
        let failed = !matches!(outcome, Ok(ExchangeReply::Reply(_)));
        if let Some(id) = self.session.finish_submit(outcome) {
            if failed {
                self.failed_replies.insert(id);
            }
        }
        self.follow_tail = true;
    }

    pub fn is_failed_reply(&self, id: MessageId) -> bool {
        self.failed_replies.contains(&id)
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let mut input = self.session.pending_input().to_string();
        let byte_pos = char_to_byte_index(&input, self.input_cursor);
        input.insert(byte_pos, c);
        self.session.update_pending_input(input);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        self.delete_at_cursor();
    }

    pub fn delete_at_cursor(&mut self) {
        let mut input = self.session.pending_input().to_string();
        if self.input_cursor < input.chars().count() {
            let byte_pos = char_to_byte_index(&input, self.input_cursor);
            input.remove(byte_pos);
            self.session.update_pending_input(input);
        }
    }

    pub fn clear_input(&mut self) {
        self.session.update_pending_input(String::new());
        self.input_cursor = 0;
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.pending_input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.session.pending_input().chars().count();
    }

    /// Whether Enter would currently start an exchange
    pub fn can_send(&self) -> bool {
        !self.session.is_busy() && !self.session.pending_input().trim().is_empty()
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll == max;
    }

    pub fn page_size(&self) -> u16 {
        self.visible_height().saturating_sub(1).max(1)
    }

    /// Scroll offset that puts the newest line at the bottom of the view.
    /// Based on the line count of the last render.
    pub fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.visible_height())
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_CHAT_HEIGHT
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn message_count(&self, sender: Sender) -> usize {
        self.session
            .log()
            .messages()
            .iter()
            .filter(|m| m.sender == sender)
            .count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Echoes the message back, or panics when asked to
    pub(crate) struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn reset(&self) -> Result<(), ChatError> {
            Ok(())
        }

        async fn exchange(&self, message: &str) -> Result<ExchangeReply, ChatError> {
            if message == "panic" {
                panic!("backend blew up");
            }
            Ok(ExchangeReply::Reply(format!("echo: {}", message)))
        }
    }

    pub(crate) fn test_app() -> App<EchoBackend> {
        App::new(Session::new(Arc::new(EchoBackend)), &Config::default())
    }

    fn type_text(app: &mut App<EchoBackend>, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let mut app = test_app();
        type_text(&mut app, "héllo");
        app.cursor_left();
        app.cursor_left();
        app.delete_before_cursor();

        assert_eq!(app.session.pending_input(), "hélo");
        assert_eq!(app.input_cursor, 2);

        app.cursor_home();
        app.insert_char('¡');
        app.cursor_end();
        app.delete_at_cursor();

        assert_eq!(app.session.pending_input(), "¡hélo");
        assert_eq!(app.input_cursor, 5);
    }

    #[test]
    fn test_can_send_requires_text() {
        let mut app = test_app();
        assert!(!app.can_send());
        type_text(&mut app, "   ");
        assert!(!app.can_send());
        type_text(&mut app, "x");
        assert!(app.can_send());
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_event_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = test_app();
        type_text(&mut app, "hi");

        app.submit_input(&tx);
        assert!(app.session.is_busy());
        assert_eq!(app.session.pending_input(), "");
        assert_eq!(app.input_cursor, 0);

        match rx.recv().await {
            Some(AppEvent::ExchangeFinished(outcome)) => app.finish_exchange(outcome),
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(!app.session.is_busy());
        assert_eq!(app.session.log().last().unwrap().text, "echo: hi");
        assert_eq!(app.message_count(Sender::User), 1);
        assert_eq!(app.message_count(Sender::Assistant), 1);
    }

    #[tokio::test]
    async fn test_panicking_exchange_still_releases_busy() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = test_app();
        type_text(&mut app, "panic");

        app.submit_input(&tx);
        match rx.recv().await {
            Some(AppEvent::ExchangeFinished(outcome)) => {
                assert!(matches!(outcome, Err(ChatError::Aborted(_))));
                app.finish_exchange(outcome);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(!app.session.is_busy());
        assert_eq!(
            app.session.log().last().unwrap().text,
            chatterm_core::CONNECTION_FAILED_TEXT
        );
    }

    #[test]
    fn test_scroll_follows_tail_until_user_scrolls_up() {
        let mut app = test_app();
        app.chat_height = 4;
        app.chat_total_lines = 30;
        let max = app.max_scroll();
        assert_eq!(max, 26);

        app.chat_scroll = max;
        app.scroll_up(2);
        assert!(!app.follow_tail);
        assert_eq!(app.chat_scroll, max - 2);

        app.scroll_down(100);
        assert!(app.follow_tail);
        assert_eq!(app.chat_scroll, max);
    }

    #[test]
    fn test_failed_outcomes_are_marked() {
        let mut app = test_app();

        app.session.begin_submit("a");
        app.finish_exchange(Ok(ExchangeReply::Reply("Error: just a word".to_string())));
        let ok_id = app.session.log().last().unwrap().id;

        app.session.begin_submit("b");
        app.finish_exchange(Ok(ExchangeReply::Failed("rate limited".to_string())));
        let failed_id = app.session.log().last().unwrap().id;

        app.session.begin_submit("c");
        app.finish_exchange(Err(ChatError::Status(502)));
        let broken_id = app.session.log().last().unwrap().id;

        assert!(!app.is_failed_reply(ok_id));
        assert!(app.is_failed_reply(failed_id));
        assert!(app.is_failed_reply(broken_id));
    }
}
