use crate::core::assistant::AssistantRegistry;
use crate::core::config::{path_display, ConfigPaths};
use std::error::Error;
use std::fmt::Write as _;

pub fn list_roles(paths: &ConfigPaths) -> Result<(), Box<dyn Error>> {
    paths.ensure_seeded()?;
    let registry = AssistantRegistry::from(paths.load_assistants()?);
    println!(
        "Available roles (from {}):\n",
        path_display(paths.assistants())
    );
    print!("{}", format_roles(&registry));
    Ok(())
}

/// One line per role, followed by the skills that apply to it.
pub fn format_roles(registry: &AssistantRegistry) -> String {
    let mut out = String::new();
    if registry.roles().is_empty() {
        out.push_str("  No roles defined.\n");
        return out;
    }

    let default_role = registry.default_role();
    for role in registry.roles() {
        let marker = if role.id == default_role.id {
            " (default)"
        } else {
            ""
        };
        let _ = writeln!(out, "  • {} [{}]{}", role.name, role.id, marker);
        let skills = registry.skills_for_role(&role.id);
        if skills.is_empty() {
            out.push_str("      no skills\n");
        }
        for skill in skills {
            let _ = writeln!(out, "      - {}: {}", skill.id, skill.description);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assistant::sample_registry;

    #[test]
    fn lists_roles_with_their_skills() {
        let text = format_roles(&sample_registry());
        let swe = text
            .lines()
            .position(|line| line.contains("[swe]"))
            .expect("swe listed");
        assert!(text.lines().nth(swe).unwrap().ends_with("(default)"));
        assert!(text.lines().nth(swe + 1).unwrap().contains("- default:"));
        assert!(text.lines().nth(swe + 2).unwrap().contains("- review:"));
        assert!(text.lines().nth(swe + 3).unwrap().contains("[writer]"));
    }

    #[test]
    fn roles_without_skills_say_so() {
        let text = format_roles(&sample_registry());
        let lonely = text
            .lines()
            .position(|line| line.contains("[lonely]"))
            .expect("lonely listed");
        assert_eq!(text.lines().nth(lonely + 1), Some("      no skills"));
    }

    #[test]
    fn empty_registry_is_reported() {
        let text = format_roles(&AssistantRegistry::default());
        assert_eq!(text, "  No roles defined.\n");
    }
}
