//! CLI prompts using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod prompts;
#[cfg(feature = "tui")]
mod run;

#[cfg(feature = "tui")]
pub use prompts::CliclackPrompter;
#[cfg(feature = "tui")]
pub use run::{run, CreateArgs};
