use crate::core::config::defaults::{DEFAULT_ROLE_ID, DEFAULT_SKILL_ID};
use crate::core::config::{AssistantsFile, Role, Skill};

/// Immutable catalogue of roles and skills loaded from `assistants.toml`.
#[derive(Debug, Clone, Default)]
pub struct AssistantRegistry {
    roles: Vec<Role>,
    skills: Vec<Skill>,
}

impl AssistantRegistry {
    pub fn new(roles: Vec<Role>, skills: Vec<Skill>) -> Self {
        Self { roles, skills }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// The `swe` role, falling back to the first declared role.
    pub fn default_role(&self) -> Role {
        self.find_role(DEFAULT_ROLE_ID)
            .or_else(|| self.roles.first())
            .cloned()
            .unwrap_or_default()
    }

    /// The `default` skill, or an empty instruction when none is declared.
    pub fn default_skill(&self) -> Skill {
        self.find_skill(DEFAULT_SKILL_ID)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find_role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }

    pub fn find_skill(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    /// Skills whose role list contains `role_id`, in declaration order.
    pub fn skills_for_role(&self, role_id: &str) -> Vec<&Skill> {
        self.skills
            .iter()
            .filter(|skill| skill.applies_to(role_id))
            .collect()
    }
}

impl From<AssistantsFile> for AssistantRegistry {
    fn from(file: AssistantsFile) -> Self {
        Self::new(file.roles, file.skills)
    }
}

#[cfg(test)]
pub(crate) fn sample_registry() -> AssistantRegistry {
    let role = |id: &str, name: &str, persona: &str| Role {
        id: id.into(),
        name: name.into(),
        persona: persona.into(),
    };
    let skill = |id: &str, instruction: &str, roles: &[&str]| Skill {
        id: id.into(),
        instruction: instruction.into(),
        description: format!("{id} skill"),
        role_ids: roles.iter().map(|r| r.to_string()).collect(),
    };
    AssistantRegistry::new(
        vec![
            role("swe", "Software Engineer", "You are a software engineer"),
            role("writer", "Writer", "You are a writer"),
            role("lonely", "Lonely", "You have no skills"),
        ],
        vec![
            skill("default", "Be concise", &["swe", "writer"]),
            skill("review", "Review the code", &["swe"]),
            skill("proofread", "Proofread the text", &["writer"]),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_by_well_known_ids() {
        let registry = sample_registry();
        assert_eq!(registry.default_role().id, "swe");
        assert_eq!(registry.default_skill().id, "default");
    }

    #[test]
    fn default_role_falls_back_to_first_role() {
        let registry = AssistantRegistry::new(
            vec![Role {
                id: "ops".into(),
                name: "Ops".into(),
                persona: String::new(),
            }],
            Vec::new(),
        );
        assert_eq!(registry.default_role().id, "ops");
        assert_eq!(registry.default_skill(), Skill::default());
    }

    #[test]
    fn skills_are_filtered_by_role_in_order() {
        let registry = sample_registry();
        let ids: Vec<&str> = registry
            .skills_for_role("swe")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["default", "review"]);
        assert!(registry.skills_for_role("lonely").is_empty());
    }
}
