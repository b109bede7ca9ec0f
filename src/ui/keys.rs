//! Keyboard bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// The start/stop control.
    Toggle,
    Quit,
    None,
}

/// Map a key event to an action.
///
/// - Space / Enter: start or stop
/// - q / Esc / Ctrl+C: quit (raw mode swallows SIGINT)
pub fn handle_key_event(event: KeyEvent) -> UiAction {
    if event.kind == KeyEventKind::Release {
        return UiAction::None;
    }
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => UiAction::Quit,
            _ => UiAction::None,
        };
    }

    match code {
        KeyCode::Char(' ') | KeyCode::Enter => UiAction::Toggle,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => UiAction::Quit,
        _ => UiAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_toggle_keys() {
        assert_eq!(handle_key_event(key(KeyCode::Char(' '), KeyModifiers::NONE)), UiAction::Toggle);
        assert_eq!(handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE)), UiAction::Toggle);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(handle_key_event(key(KeyCode::Char('q'), KeyModifiers::NONE)), UiAction::Quit);
        assert_eq!(handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE)), UiAction::Quit);
        assert_eq!(handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), UiAction::Quit);
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(handle_key_event(key(KeyCode::Char('x'), KeyModifiers::NONE)), UiAction::None);
        assert_eq!(handle_key_event(key(KeyCode::Char(' '), KeyModifiers::CONTROL)), UiAction::None);
    }

    #[test]
    fn test_release_ignored() {
        let mut ev = key(KeyCode::Char(' '), KeyModifiers::NONE);
        ev.kind = KeyEventKind::Release;
        assert_eq!(handle_key_event(ev), UiAction::None);
    }
}
