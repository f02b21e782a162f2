//! Terminal UI layer.
//!
//! - [`chat_loop`]: terminal setup and the event loop that feeds keys and
//!   background results into [`crate::core::app`].
//! - [`renderer`] and [`layout`]: per-frame view composition.
//! - [`theme`]: accent colors from the environment.
//! - [`picker`]: the filterable list behind the role and skill overlays.

pub mod chat_loop;
pub mod layout;
pub mod picker;
pub mod renderer;
pub mod theme;
