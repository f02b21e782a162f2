//! Key to action mapping.
//!
//! Resolution is mode-aware: global shortcuts first, then the bindings of the
//! active mode. Unmapped keys produce no action.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{AppAction, UiFocus, UiMode};

const SCROLL_STEP: u16 = 1;

pub fn action_for_key(mode: UiMode, focus: UiFocus, key: KeyEvent) -> Option<AppAction> {
    if let Some(action) = global_action(key) {
        return Some(action);
    }
    match mode {
        UiMode::Loading => navigation_action(key),
        UiMode::RoleSelect | UiMode::SkillSelect => picker_action(key),
        UiMode::TextInput => text_input_action(focus, key),
    }
}

fn global_action(key: KeyEvent) -> Option<AppAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return Some(AppAction::Quit);
    }
    None
}

fn navigation_action(key: KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Up => Some(AppAction::ScrollUp { lines: SCROLL_STEP }),
        KeyCode::Down => Some(AppAction::ScrollDown { lines: SCROLL_STEP }),
        KeyCode::PageUp => Some(AppAction::ScrollPageUp),
        KeyCode::PageDown => Some(AppAction::ScrollPageDown),
        KeyCode::Home => Some(AppAction::ScrollToTop),
        KeyCode::End => Some(AppAction::ScrollToBottom),
        _ => None,
    }
}

fn picker_action(key: KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Esc => Some(AppAction::PickerEscape),
        KeyCode::Enter => Some(AppAction::PickerConfirm),
        KeyCode::Up => Some(AppAction::PickerMoveUp),
        KeyCode::Down => Some(AppAction::PickerMoveDown),
        KeyCode::Backspace => Some(AppAction::PickerBackspace),
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(AppAction::PickerTypeChar { ch })
        }
        _ => None,
    }
}

fn text_input_action(focus: UiFocus, key: KeyEvent) -> Option<AppAction> {
    if key.code == KeyCode::BackTab {
        return Some(AppAction::ToggleFocus);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let action = match key.code {
            KeyCode::Char('s') => Some(AppAction::SubmitInput),
            KeyCode::Char('r') => Some(AppAction::OpenRolePicker),
            KeyCode::Char('e') => Some(AppAction::OpenSkillPicker),
            KeyCode::Char('d') => Some(AppAction::SaveTranscript),
            KeyCode::Char('c') => Some(AppAction::CopyTranscript),
            _ => None,
        };
        if action.is_some() {
            return action;
        }
    }
    match focus {
        UiFocus::Transcript => navigation_action(key),
        UiFocus::Input => match key.code {
            KeyCode::PageUp => Some(AppAction::ScrollPageUp),
            KeyCode::PageDown => Some(AppAction::ScrollPageDown),
            _ => Some(AppAction::EditInput { key }),
        },
    }
}
