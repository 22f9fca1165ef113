//! Keyboard-to-controller mapping for the windowed shell.

use fami_nes::Button;
use winit::keyboard::KeyCode;

/// Map a physical key to a controller-1 button.
///
/// Z/X are A/B, Enter is Start, right Shift is Select, arrows are the
/// D-pad.
pub fn map_keycode(key: KeyCode) -> Option<Button> {
    match key {
        KeyCode::KeyZ => Some(Button::A),
        KeyCode::KeyX => Some(Button::B),
        KeyCode::ShiftRight => Some(Button::Select),
        KeyCode::Enter => Some(Button::Start),
        KeyCode::ArrowUp => Some(Button::Up),
        KeyCode::ArrowDown => Some(Button::Down),
        KeyCode::ArrowLeft => Some(Button::Left),
        KeyCode::ArrowRight => Some(Button::Right),
        _ => None,
    }
}
