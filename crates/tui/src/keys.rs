//! Key conversion from crossterm to code-edit.

use code_edit::{Key, KeyCode};
use crossterm::event::{KeyCode as CtKeyCode, KeyEvent, KeyModifiers};

/// Convert a crossterm KeyEvent to a code-edit Key.
///
/// Keys the editor has no use for (Esc, function keys, media keys) yield
/// `None`. Shift is already folded into the character.
pub fn convert_key(event: KeyEvent) -> Option<Key> {
    let code = match event.code {
        CtKeyCode::Char(c) => KeyCode::Char(c),
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Delete => KeyCode::Delete,
        CtKeyCode::Left => KeyCode::Left,
        CtKeyCode::Right => KeyCode::Right,
        CtKeyCode::Up => KeyCode::Up,
        CtKeyCode::Down => KeyCode::Down,
        CtKeyCode::Home => KeyCode::Home,
        CtKeyCode::End => KeyCode::End,
        CtKeyCode::PageUp => KeyCode::PageUp,
        CtKeyCode::PageDown => KeyCode::PageDown,
        CtKeyCode::Tab => KeyCode::Tab,
        CtKeyCode::Enter => KeyCode::Enter,
        _ => return None,
    };

    Some(Key {
        code,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
    })
}
