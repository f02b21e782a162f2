pub mod data;
pub mod defaults;
pub mod io;

pub use data::{path_display, AssistantsFile, Role, Skill, ValidationRule, ValidationsFile};
pub use io::{ConfigError, ConfigPaths};
