use crate::core::assistant::AssistantRegistry;
use crate::core::config::{Role, Skill};
use crate::core::message::{ConversationTurn, Speaker};
use crate::utils::highlight::HighlightedAnswer;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    UnknownRole(String),
    UnknownSkill(String),
    SkillNotForRole { skill: String, role: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::UnknownRole(id) => write!(f, "Unknown role: {id}"),
            SelectionError::UnknownSkill(id) => write!(f, "Unknown skill: {id}"),
            SelectionError::SkillNotForRole { skill, role } => {
                write!(f, "Skill '{skill}' is not available for role '{role}'")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Per-process conversation state: active role/skill plus the turn history.
#[derive(Debug, Clone)]
pub struct Session {
    registry: AssistantRegistry,
    role: Role,
    skill: Skill,
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(registry: AssistantRegistry) -> Self {
        let role = registry.default_role();
        let skill = registry.default_skill();
        Self {
            registry,
            role,
            skill,
            turns: Vec::new(),
        }
    }

    pub fn registry(&self) -> &AssistantRegistry {
        &self.registry
    }

    pub fn active_role(&self) -> &Role {
        &self.role
    }

    pub fn active_skill(&self) -> &Skill {
        &self.skill
    }

    /// Switch persona. The current skill survives only if it applies to the
    /// new role; otherwise it becomes the empty skill.
    pub fn select_role(&mut self, id: &str) -> Result<(), SelectionError> {
        let role = self
            .registry
            .find_role(id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownRole(id.to_string()))?;

        if !self.skill.applies_to(&role.id) {
            self.skill = Skill::default();
        }
        self.role = role;
        Ok(())
    }

    pub fn select_skill(&mut self, id: &str) -> Result<(), SelectionError> {
        let skill = self
            .registry
            .find_skill(id)
            .ok_or_else(|| SelectionError::UnknownSkill(id.to_string()))?;

        if !skill.applies_to(&self.role.id) {
            return Err(SelectionError::SkillNotForRole {
                skill: id.to_string(),
                role: self.role.id.clone(),
            });
        }
        self.skill = skill.clone();
        Ok(())
    }

    /// Skills available to the active role, queried on demand.
    pub fn available_skills(&self) -> Vec<&Skill> {
        self.registry.skills_for_role(&self.role.id)
    }

    pub fn record_exchange(&mut self, user_text: &str, answer: HighlightedAnswer) {
        self.turns.push(ConversationTurn::user(user_text));
        self.turns.push(ConversationTurn::assistant(answer));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Flattened transcript: each `You: ...` line is followed by a blank
    /// line and the `Gail: ...` answer, which ends with a newline.
    pub fn plain_transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::User => turn.plain_line(),
                Speaker::Assistant => format!("\n{}\n", turn.plain_line()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
