use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::state::ChatMessage;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_message(app),
        KeyCode::Char(c) => {
            let byte_idx = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_idx, c);
            app.cursor += 1;
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                let byte_idx = char_to_byte_index(&app.input, app.cursor - 1);
                app.input.remove(byte_idx);
                app.cursor -= 1;
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => app.cursor = (app.cursor + 1).min(app.input.chars().count()),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.chars().count(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        _ => {}
    }
}

/// Submit the current input as one chat turn. Rejected without a network call
/// when the trimmed input is empty or a send is already in flight.
fn submit_message(app: &mut App) {
    if !app.can_send() {
        return;
    }

    let text = app.input.trim().to_string();
    app.messages.push(ChatMessage::user(text.clone()));

    app.input.clear();
    app.cursor = 0;
    app.loading = true;

    // Scroll to bottom so "Thinking..." is visible
    app.scroll_chat_to_bottom();

    // Spawn background task for the single worker request
    let client = app.client.clone();
    app.send_task = Some(tokio::spawn(async move { client.send(&text).await }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SentinelClient;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn test_app() -> App {
        App::new(SentinelClient::new("http://localhost:8787/"))
    }

    #[tokio::test]
    async fn test_enter_on_blank_input_sends_nothing() {
        let mut app = test_app();
        app.input = "   ".to_string();

        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(app.send_task.is_none());
        assert!(!app.loading);
        assert_eq!(app.messages.len(), 1); // welcome only
    }

    #[tokio::test]
    async fn test_enter_submits_trimmed_input() {
        let mut app = test_app();
        app.input = "  What is the fraud penalty?  ".to_string();
        app.cursor = app.input.chars().count();

        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(app.send_task.is_some());
        assert!(app.loading);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(
            app.messages.last().unwrap().content,
            "What is the fraud penalty?"
        );

        app.send_task.take().unwrap().abort();
    }

    #[tokio::test]
    async fn test_no_second_send_while_in_flight() {
        let mut app = test_app();
        app.input = "first".to_string();
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let before = app.messages.len();

        app.input = "second".to_string();
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        // Still the first task; the second submission was ignored.
        assert_eq!(app.messages.len(), before);
        assert_eq!(app.input, "second");

        app.send_task.take().unwrap().abort();
    }

    #[test]
    fn test_utf8_editing() {
        let mut app = test_app();
        for c in "pénalité".chars() {
            handle_key(&mut app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!(app.input, "pénalité");
        assert_eq!(app.cursor, 8);

        handle_key(&mut app, KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.input, "pénalit");
    }
}
