use tracing::{info, warn};

use super::{set_status_message, App, AppAction, AppCommand};
use crate::core::app::{PickerKind, UiMode};
use crate::ui::picker::PickerState;

pub(super) fn handle_picker_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::OpenRolePicker => {
            if app.ui.mode == UiMode::TextInput {
                app.open_role_picker();
            }
            Vec::new()
        }
        AppAction::OpenSkillPicker => {
            if app.ui.mode == UiMode::TextInput {
                app.open_skill_picker();
            }
            Vec::new()
        }
        AppAction::PickerEscape => handle_picker_escape(app),
        AppAction::PickerMoveUp => {
            with_picker(app, |state| state.move_up());
            Vec::new()
        }
        AppAction::PickerMoveDown => {
            with_picker(app, |state| state.move_down());
            Vec::new()
        }
        AppAction::PickerTypeChar { ch } => {
            with_picker(app, |state| state.push_filter_char(ch));
            Vec::new()
        }
        AppAction::PickerBackspace => {
            with_picker(app, |state| state.pop_filter_char());
            Vec::new()
        }
        AppAction::PickerConfirm => handle_picker_confirm(app),
        _ => unreachable!("non-picker action routed to picker handler"),
    }
}

fn with_picker(app: &mut App, f: impl FnOnce(&mut PickerState)) {
    if let Some(state) = app.picker_state_mut() {
        f(state);
        app.ui.picker_error = None;
    }
}

fn no_selection_message(kind: PickerKind) -> String {
    match kind {
        PickerKind::Role => "No role matches the filter".to_string(),
        PickerKind::Skill => "No skill available for this role".to_string(),
    }
}

/// Esc first clears an active filter and stays open, reporting when nothing
/// matched; a second Esc leaves with the selection unchanged.
fn handle_picker_escape(app: &mut App) -> Vec<AppCommand> {
    let Some(picker) = app.picker.as_mut() else {
        return Vec::new();
    };
    if picker.state.filter().is_empty() {
        app.close_picker();
        return Vec::new();
    }

    let had_match = picker.state.selected_item().is_some();
    let kind = picker.kind;
    picker.state.clear_filter();
    app.ui.picker_error = (!had_match).then(|| no_selection_message(kind));
    Vec::new()
}

/// Apply the highlighted entry. Without one the picker stays open and
/// shows why.
fn handle_picker_confirm(app: &mut App) -> Vec<AppCommand> {
    let Some(picker) = app.picker.as_ref() else {
        return Vec::new();
    };
    let kind = picker.kind;
    let Some(id) = picker.state.selected_id().map(str::to_string) else {
        app.ui.picker_error = Some(no_selection_message(kind));
        return Vec::new();
    };

    let result = match kind {
        PickerKind::Role => app.session.select_role(&id),
        PickerKind::Skill => app.session.select_skill(&id),
    };

    match result {
        Ok(()) => {
            app.close_picker();
            let message = match kind {
                PickerKind::Role => {
                    let role = app.session.active_role();
                    info!(role = %role.id, "selected role");
                    format!("Role: {}", role.name)
                }
                PickerKind::Skill => {
                    let skill = app.session.active_skill();
                    info!(skill = %skill.id, "selected skill");
                    format!("Skill: {}", skill.id)
                }
            };
            vec![set_status_message(app, message)]
        }
        Err(err) => {
            warn!(error = %err, "picker selection failed");
            app.ui.picker_error = Some(err.to_string());
            Vec::new()
        }
    }
}
