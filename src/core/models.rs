use clap::ValueEnum;
use std::fmt;

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// The model families gail knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// OpenAI assistants (threads and runs)
    Gpt,
    /// Anthropic messages
    Claude,
    /// OpenAI responses with reasoning effort
    Gpto,
}

impl ModelKind {
    pub fn model_name(self) -> &'static str {
        match self {
            ModelKind::Gpt => "gpt-4o",
            ModelKind::Claude => "claude-3-5-sonnet-20240620",
            ModelKind::Gpto => "o4-mini",
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            ModelKind::Gpt => 4096,
            ModelKind::Claude => 4092,
            ModelKind::Gpto => 25_000,
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ModelKind::Claude => "CLAUDE_API_KEY",
            ModelKind::Gpt | ModelKind::Gpto => "OPENAI_API_KEY",
        }
    }

    pub fn base_url_env(self) -> &'static str {
        match self {
            ModelKind::Claude => "ANTHROPIC_BASE_URL",
            ModelKind::Gpt | ModelKind::Gpto => "OPENAI_BASE_URL",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ModelKind::Claude => ANTHROPIC_DEFAULT_BASE_URL,
            ModelKind::Gpt | ModelKind::Gpto => OPENAI_DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Gpt => "gpt",
            ModelKind::Claude => "claude",
            ModelKind::Gpto => "gpto",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_reads_its_own_key() {
        assert_eq!(ModelKind::Claude.api_key_env(), "CLAUDE_API_KEY");
        assert_eq!(ModelKind::Gpto.api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn value_enum_parses_cli_names() {
        assert_eq!(ModelKind::from_str("gpto", true), Ok(ModelKind::Gpto));
        assert_eq!(ModelKind::Claude.to_string(), "claude");
    }
}
