//! Gail is a terminal chat client that talks to a swappable LLM backend under
//! a selectable role (persona) and skill (task instruction).
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`backend`] hides the OpenAI assistants, OpenAI responses and Anthropic
//!   messages protocols behind one prompt contract, with PII validation in
//!   front of every remote call.
//! - [`core`] owns configuration, the role/skill registry, the conversation
//!   session and the application state machine.
//! - [`ui`] renders the terminal interface and runs the event loop that
//!   drives input, background prompts and display updates.
//! - [`utils`] holds code highlighting, transcript persistence, the external
//!   editor handoff and logging setup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod backend;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
