//! Command-line interface parsing and startup.
//!
//! Everything the chat loop needs is constructed here, in order, before the
//! terminal is touched. Any failure aborts startup with a message.

pub mod roles;

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::backend::{self, BackendSettings, HttpTransport};
use crate::cli::roles::list_roles;
use crate::core::app::App;
use crate::core::assistant::AssistantRegistry;
use crate::core::config::{path_display, ConfigPaths};
use crate::core::models::ModelKind;
use crate::core::session::Session;
use crate::core::validator::Validator;
use crate::ui::chat_loop::{run_chat, ChatServices};
use crate::ui::theme::Theme;
use crate::utils::editor::editor_command;
use crate::utils::highlight::SyntaxTheme;
use crate::utils::history::HistoryStore;
use crate::utils::logging::{default_log_dir, init_logging, LogLevel};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "gail")]
#[command(version = LONG_VERSION)]
#[command(about = "A terminal chat assistant with roles and skills")]
#[command(
    long_about = "Gail is a full-screen terminal chat client. Pick a role (persona) and a \
skill (task instruction), then chat with an OpenAI or Anthropic model.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY        API key for the gpt and gpto models\n\
  CLAUDE_API_KEY        API key for the claude model\n\
  OPENAI_BASE_URL       Custom OpenAI endpoint (optional)\n\
  ANTHROPIC_BASE_URL    Custom Anthropic endpoint (optional)\n\
  EDITOR                Editor used by ctrl+c (defaults to vim)\n\
  GAIL_HIGHLIGHT_COLOR  Accent color, 256-color index or #rrggbb (defaults to 6)\n\
  GAIL_SYNTAX_THEME     Syntax highlighting theme (defaults to base16-ocean.dark)\n\
  GAIL_LOG              Log filter directive, overrides --log-level\n\n\
Controls:\n\
  ctrl+s          Send the message\n\
  ctrl+r          Pick a role\n\
  ctrl+e          Pick a skill for the current role\n\
  ctrl+d          Save the conversation\n\
  ctrl+c          Open the conversation in your editor\n\
  shift+tab       Switch focus between input and transcript\n\
  ctrl+q          Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model family to chat with
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Gpt, global = true)]
    pub model: ModelKind,

    /// Minimum level written to the log file
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List roles and the skills available to each
    Roles,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let log_path = init_logging(args.log_level, &default_log_dir()?)?;
    info!(version = LONG_VERSION, log = %log_path.display(), "starting gail");

    let paths = ConfigPaths::resolve()?;
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Roles => list_roles(&paths),
        Commands::Chat => start_chat(args.model, &paths).await,
    }
}

async fn start_chat(kind: ModelKind, paths: &ConfigPaths) -> Result<(), Box<dyn Error>> {
    paths.ensure_seeded()?;
    let assistants = paths.load_assistants()?;
    let validations = paths.load_validations()?;
    let validator = Arc::new(Validator::new(&validations.validations)?);
    info!(
        config = %path_display(&paths.config_dir),
        roles = assistants.roles.len(),
        skills = assistants.skills.len(),
        rules = validator.rule_count(),
        "configuration loaded"
    );

    let registry = AssistantRegistry::from(assistants);
    if registry.roles().is_empty() {
        return Err(format!(
            "No roles defined in {}",
            path_display(paths.assistants())
        )
        .into());
    }

    let settings = BackendSettings::from_env(kind)?;
    let backend = backend::connect(settings, validator, Arc::new(HttpTransport::new())).await?;

    let history = HistoryStore::new(HistoryStore::default_dir()?);
    let services = ChatServices::new(
        backend,
        history,
        SyntaxTheme::from_env(),
        Theme::from_env(),
        editor_command(),
    );

    let app = App::new(Session::new(registry), kind.model_name());
    run_chat(app, services).await
}
