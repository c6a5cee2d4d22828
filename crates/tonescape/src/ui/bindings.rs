//! Keyboard bindings and input handling.
//!
//! Centralizes all keyboard shortcuts and key mapping logic.

use nannou::prelude::*;
use tonescape_engine::ModeKind;

/// Actions that can be triggered by key presses
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // App-level
    Quit,
    ShowHelp,

    // Mode picker navigation
    PickerShow,
    PickerHide,
    PickerMoveUp,
    PickerMoveDown,
    PickerSelect,

    // Normal mode
    SelectMode(ModeKind),
    CycleNext,
    TogglePlayback,
}

/// Number keys map onto modes in menu order
fn mode_for_key(key: Key) -> Option<ModeKind> {
    let index = match key {
        Key::Key1 | Key::Numpad1 => 0,
        Key::Key2 | Key::Numpad2 => 1,
        Key::Key3 | Key::Numpad3 => 2,
        Key::Key4 | Key::Numpad4 => 3,
        _ => return None,
    };
    ModeKind::ALL.get(index).copied()
}

/// Parse a key into an action based on current mode
pub fn parse_key(key: Key, picker_active: bool) -> Option<Action> {
    // Global quit key
    if key == Key::Q {
        return Some(Action::Quit);
    }

    if key == Key::H {
        return Some(Action::ShowHelp);
    }

    // Mode picker bindings
    if picker_active {
        return match key {
            Key::Escape => Some(Action::PickerHide),
            Key::Up => Some(Action::PickerMoveUp),
            Key::Down => Some(Action::PickerMoveDown),
            Key::Return => Some(Action::PickerSelect),
            _ => None,
        };
    }

    if let Some(mode) = mode_for_key(key) {
        return Some(Action::SelectMode(mode));
    }

    // Normal mode bindings
    match key {
        Key::Tab => Some(Action::CycleNext),
        Key::Space => Some(Action::TogglePlayback),
        Key::Up | Key::Down => Some(Action::PickerShow),
        _ => None,
    }
}
