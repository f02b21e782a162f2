use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A persona the assistant adopts for the conversation.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub persona: String,
}

/// A task instruction that applies to one or more roles.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "roleIDs")]
    pub role_ids: Vec<String>,
}

impl Skill {
    pub fn applies_to(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|id| id == role_id)
    }
}

/// A named pattern that flags personally identifiable information.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub name: String,
    pub pattern: String,
}

/// On-disk shape of `assistants.toml`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct AssistantsFile {
    #[serde(default, rename = "role")]
    pub roles: Vec<Role>,
    #[serde(default, rename = "skill")]
    pub skills: Vec<Skill>,
}

/// On-disk shape of `validations.toml`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ValidationsFile {
    #[serde(default, rename = "validation")]
    pub validations: Vec<ValidationRule>,
}

/// Format a path for display, replacing the home directory with `~` on Unix.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
