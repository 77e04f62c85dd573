use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

/// Lines scrolled per arrow key or mouse wheel notch.
const SCROLL_STEP: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => insert_text(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }

    // A finished request is picked up on whatever event comes next
    app.poll_pending().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
        }
        KeyCode::Esc => {
            app.should_quit = true;
        }
        // Line insertion never submits
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            insert_char(app, '\n');
        }
        KeyCode::Char('j') if ctrl => {
            insert_char(app, '\n');
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
                app.session.pending_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.session.pending_input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
                app.session.pending_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.pending_input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.session.pending_input.chars().count();
        }
        KeyCode::Up => app.scroll_up(SCROLL_STEP),
        KeyCode::Down => app.scroll_down(SCROLL_STEP),
        KeyCode::PageUp => {
            let step = app.half_page();
            app.scroll_up(step);
        }
        KeyCode::PageDown => {
            let step = app.half_page();
            app.scroll_down(step);
        }
        KeyCode::Char(c) if !ctrl => {
            insert_char(app, c);
        }
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
    app.session.pending_input.insert(byte_pos, c);
    app.input_cursor += 1;
}

/// Insert pasted text at the cursor. Line breaks stay in the input.
fn insert_text(app: &mut App, text: &str) {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let byte_pos = char_to_byte_index(&app.session.pending_input, app.input_cursor);
    app.session.pending_input.insert_str(byte_pos, &text);
    app.input_cursor += text.chars().count();
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(SCROLL_STEP),
        MouseEventKind::ScrollDown => app.scroll_down(SCROLL_STEP),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{settle, test_app};
    use chatbot_core::{Message, Role};
    use crossterm::event::{KeyEventKind, KeyEventState, MouseEvent};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 0), 0);
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 10), 6);
    }

    #[tokio::test]
    async fn test_typing_and_enter_submits() {
        let (mut app, _) = test_app();
        type_text(&mut app, "hi").await;
        assert_eq!(app.session.pending_input, "hi");
        assert_eq!(app.input_cursor, 2);

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert!(app.session.is_busy());
        assert_eq!(app.session.transcript.as_slice(), [Message::user("hi")]);

        settle(&mut app).await;
        assert_eq!(
            app.session.transcript.last(),
            Some(&Message::assistant("echo: hi"))
        );
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let (mut app, backend) = test_app();
        type_text(&mut app, "line one").await;
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT))
            .await
            .unwrap();
        type_text(&mut app, "two").await;
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::ALT))
            .await
            .unwrap();
        handle_event(&mut app, key_with(KeyCode::Char('j'), KeyModifiers::CONTROL))
            .await
            .unwrap();

        assert_eq!(app.session.pending_input, "line one\ntwo\n\n");
        assert!(app.session.transcript.is_empty());
        assert_eq!(
            backend.calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_paste_keeps_newlines_without_submitting() {
        let (mut app, backend) = test_app();
        type_text(&mut app, "Q: ").await;
        handle_event(&mut app, key(KeyCode::Home)).await.unwrap();

        handle_event(&mut app, AppEvent::Paste("first\r\nsecond\rthïrd ".to_string()))
            .await
            .unwrap();

        assert_eq!(app.session.pending_input, "first\nsecond\nthïrd Q: ");
        assert_eq!(app.input_cursor, "first\nsecond\nthïrd ".chars().count());
        assert!(!app.session.is_busy());
        assert!(app.session.transcript.is_empty());
        assert_eq!(
            backend.calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(
            app.session.transcript.as_slice(),
            [Message::user("first\nsecond\nthïrd Q:")]
        );
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_enter_while_busy_keeps_input() {
        let (mut app, _) = test_app();
        type_text(&mut app, "first").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        // current-thread runtime: the echo task cannot run until we yield
        assert!(app.session.is_busy());
        type_text(&mut app, "second").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.session.pending_input, "second");
        assert_eq!(app.session.transcript.len(), 1);

        settle(&mut app).await;
        let roles: Vec<Role> = app.session.transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_cursor_editing_is_utf8_safe() {
        let (mut app, _) = test_app();
        type_text(&mut app, "añb").await;
        handle_event(&mut app, key(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.session.pending_input, "ab");
        assert_eq!(app.input_cursor, 1);

        handle_event(&mut app, key(KeyCode::Home)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Delete)).await.unwrap();
        assert_eq!(app.session.pending_input, "b");

        handle_event(&mut app, key(KeyCode::End)).await.unwrap();
        type_text(&mut app, "ç").await;
        assert_eq!(app.session.pending_input, "bç");
        assert_eq!(app.input_cursor, 2);

        handle_event(&mut app, key(KeyCode::Right)).await.unwrap();
        assert_eq!(app.input_cursor, 2);
    }

    #[tokio::test]
    async fn test_whitespace_enter_sets_error() {
        let (mut app, _) = test_app();
        type_text(&mut app, "   ").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert!(app.pending.is_none());
        assert_eq!(app.session.last_error(), Some("empty input"));
        assert!(app.session.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _) = test_app();
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert!(app.should_quit);
        assert!(app.session.pending_input.is_empty());

        let (mut app, _) = test_app();
        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_mouse_wheel_scrolls() {
        let (mut app, _) = test_app();
        app.chat_height = 2;
        app.chat_width = 40;
        for q in ["a", "b", "c"] {
            app.session.pending_input = q.to_string();
            app.submit_input();
            settle(&mut app).await;
        }
        let bottom = app.chat_scroll;
        assert!(bottom > 0);

        let wheel = |kind| {
            AppEvent::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };
        handle_event(&mut app, wheel(MouseEventKind::ScrollUp)).await.unwrap();
        assert_eq!(app.chat_scroll, bottom - SCROLL_STEP);
        handle_event(&mut app, wheel(MouseEventKind::ScrollDown)).await.unwrap();
        assert_eq!(app.chat_scroll, bottom);
    }

    #[tokio::test]
    async fn test_tick_settles_finished_reply() {
        let (mut app, _) = test_app();
        app.session.pending_input = "ping".to_string();
        app.submit_input();

        while app.pending.is_some() {
            tokio::task::yield_now().await;
            handle_event(&mut app, AppEvent::Tick).await.unwrap();
        }
        assert!(!app.session.is_busy());
        assert_eq!(app.session.transcript.len(), 2);
    }
}
