//! Interactive application state.
//!
//! [`App`] is owned by the chat loop and only ever mutated through
//! [`apply_action`]; background work reports back by dispatching more
//! actions. Nothing here touches the terminal or the network.

pub mod actions;
pub mod ui_state;


pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use ui_state::{UiFocus, UiMode, UiState, DEFAULT_STATUS};

use crate::backend::PromptRequest;
use crate::core::session::Session;
use crate::ui::picker::{PickerItem, PickerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Role,
    Skill,
}

#[derive(Debug, Clone)]
pub struct ActivePicker {
    pub kind: PickerKind,
    pub state: PickerState,
}

pub struct App {
    pub session: Session,
    pub ui: UiState,
    pub picker: Option<ActivePicker>,
    pub model_name: String,
    /// User text of the prompt currently in flight.
    pending_input: Option<String>,
}

impl App {
    pub fn new(session: Session, model_name: impl Into<String>) -> Self {
        Self {
            session,
            ui: UiState::new(),
            picker: None,
            model_name: model_name.into(),
            pending_input: None,
        }
    }

    pub fn pending_input(&self) -> Option<&str> {
        self.pending_input.as_deref()
    }

    pub fn prompt_request(&self, message: impl Into<String>) -> PromptRequest {
        let role = self.session.active_role();
        PromptRequest {
            role_name: role.name.clone(),
            persona: role.persona.clone(),
            instruction: self.session.active_skill().instruction.clone(),
            message: message.into(),
        }
    }

    /// Enter Loading with `text` held until the answer arrives.
    fn begin_prompt(&mut self, text: String) -> PromptRequest {
        let request = self.prompt_request(text.clone());
        self.pending_input = Some(text);
        self.ui.clear_input();
        self.ui.mode = UiMode::Loading;
        self.ui.loading_since = Some(std::time::Instant::now());
        request
    }

    fn finish_prompt(&mut self) -> Option<String> {
        self.ui.mode = UiMode::TextInput;
        self.ui.loading_since = None;
        self.pending_input.take()
    }

    pub fn open_role_picker(&mut self) {
        let active = &self.session.active_role().id;
        let roles = self.session.registry().roles();
        let selected = roles.iter().position(|r| &r.id == active).unwrap_or(0);
        let items = roles
            .iter()
            .map(|role| PickerItem {
                id: role.id.clone(),
                label: role.name.clone(),
                detail: role.persona.clone(),
            })
            .collect();
        self.show_picker(PickerKind::Role, PickerState::new("Pick a role", items, selected));
    }

    /// Skills are filtered against the role active at the time of opening.
    pub fn open_skill_picker(&mut self) {
        let active = &self.session.active_skill().id;
        let skills = self.session.available_skills();
        let selected = skills.iter().position(|s| &s.id == active).unwrap_or(0);
        let items = skills
            .iter()
            .map(|skill| PickerItem {
                id: skill.id.clone(),
                label: skill.id.clone(),
                detail: skill.description.clone(),
            })
            .collect();
        let title = format!("Pick a skill for {}", self.session.active_role().name);
        self.show_picker(PickerKind::Skill, PickerState::new(title, items, selected));
    }

    fn show_picker(&mut self, kind: PickerKind, state: PickerState) {
        self.ui.mode = match kind {
            PickerKind::Role => UiMode::RoleSelect,
            PickerKind::Skill => UiMode::SkillSelect,
        };
        self.ui.picker_error = None;
        self.picker = Some(ActivePicker { kind, state });
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
        self.ui.picker_error = None;
        self.ui.mode = UiMode::TextInput;
    }

    pub fn picker_state_mut(&mut self) -> Option<&mut PickerState> {
        self.picker.as_mut().map(|picker| &mut picker.state)
    }

    /// Title line context: model plus active role and skill.
    pub fn header_text(&self) -> String {
        let skill = &self.session.active_skill().id;
        let skill = if skill.is_empty() { "none" } else { skill };
        format!(
            "Gail - {} - role: {} - skill: {}",
            self.model_name,
            self.session.active_role().name,
            skill
        )
    }
}
