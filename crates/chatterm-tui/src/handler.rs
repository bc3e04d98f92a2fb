use chatterm_core::ChatBackend;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::App;
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

pub fn handle_event<B: ChatBackend + 'static>(
    app: &mut App<B>,
    event: AppEvent,
    events: &UnboundedSender<AppEvent>,
) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, events),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::ExchangeFinished(outcome) => app.finish_exchange(outcome),
    }
}

fn handle_key<B: ChatBackend + 'static>(
    app: &mut App<B>,
    key: KeyEvent,
    events: &UnboundedSender<AppEvent>,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('u') => app.clear_input(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        // Ignored while an exchange is outstanding; the session decides
        KeyCode::Enter => app.submit_input(events),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let page = app.page_size();
            app.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.page_size();
            app.scroll_down(page);
        }
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse<B: ChatBackend + 'static>(app: &mut App<B>, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use chatterm_core::Sender;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[tokio::test]
    async fn test_typing_and_enter_sends_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        for c in "hi".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)), &tx);
        }
        handle_event(&mut app, key(KeyCode::Enter), &tx);
        assert!(app.session.is_busy());

        let finished = rx.recv().await.unwrap();
        handle_event(&mut app, finished, &tx);

        let texts: Vec<&str> = app
            .session
            .log()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["hi", "echo: hi"]);
        assert!(!app.session.is_busy());
    }

    #[tokio::test]
    async fn test_enter_while_busy_keeps_typed_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(&mut app, key(KeyCode::Char('a')), &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        // Typing stays possible while the reply is outstanding
        handle_event(&mut app, key(KeyCode::Char('b')), &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx);
        assert_eq!(app.session.pending_input(), "b");
        assert_eq!(app.message_count(Sender::User), 1);

        let finished = rx.recv().await.unwrap();
        handle_event(&mut app, finished, &tx);
        assert!(!app.session.is_busy());
        assert_eq!(app.session.pending_input(), "b");
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(&mut app, key(KeyCode::Char(' ')), &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        assert!(app.session.log().is_empty());
        assert!(!app.session.is_busy());
    }

    #[test]
    fn test_quit_keys() {
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Esc), &tx);
        assert!(app.should_quit);

        let mut app = test_app();
        handle_event(&mut app, ctrl('c'), &tx);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_u_clears_input() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(&mut app, key(KeyCode::Char('x')), &tx);
        handle_event(&mut app, ctrl('u'), &tx);

        assert_eq!(app.session.pending_input(), "");
        assert_eq!(app.input_cursor, 0);
    }

    #[test]
    fn test_tick_animates_only_while_busy() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(&mut app, AppEvent::Tick, &tx);
        assert_eq!(app.animation_frame, 0);

        app.session.begin_submit("wait");
        handle_event(&mut app, AppEvent::Tick, &tx);
        handle_event(&mut app, AppEvent::Tick, &tx);
        handle_event(&mut app, AppEvent::Tick, &tx);
        assert_eq!(app.animation_frame, 0);
        handle_event(&mut app, AppEvent::Tick, &tx);
        assert_eq!(app.animation_frame, 1);
    }
}
