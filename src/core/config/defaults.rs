//! Default configuration shipped inside the binary.
//!
//! These files seed the user's config directory on first run; they are never
//! written over an existing file.

pub const ASSISTANTS_FILE_NAME: &str = "assistants.toml";
pub const VALIDATIONS_FILE_NAME: &str = "validations.toml";

pub const DEFAULT_ASSISTANTS: &str = include_str!("../../builtins/assistants.toml");
pub const DEFAULT_VALIDATIONS: &str = include_str!("../../builtins/validations.toml");

/// Role selected at startup when present.
pub const DEFAULT_ROLE_ID: &str = "swe";
/// Skill selected at startup when present.
pub const DEFAULT_SKILL_ID: &str = "default";
