//! Capabilities used while collecting module parameters
//!
//! Interactive input and command execution sit behind traits so parameter
//! collection can run against scripted implementations in tests.

pub mod command;

pub use command::{CommandRunner, ShellCommandRunner};

/// Interactive input from the user
///
/// Errors (including the user cancelling) abort the current module's
/// parameter collection.
pub trait Prompter {
    /// Ask the user to pick one of `items`
    fn ask_select(&mut self, label: &str, items: &[String]) -> std::io::Result<String>;

    /// Ask the user for free-text input
    fn ask_text(&mut self, label: &str) -> std::io::Result<String>;
}
