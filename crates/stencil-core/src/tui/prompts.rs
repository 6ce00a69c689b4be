//! Prompter backed by cliclack

use crate::prompt::Prompter;

/// Asks for parameter values on the terminal
///
/// Cancelling a prompt (Esc / Ctrl+C) surfaces as an `Interrupted` error.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliclackPrompter;

impl Prompter for CliclackPrompter {
    fn ask_select(&mut self, label: &str, items: &[String]) -> std::io::Result<String> {
        let mut select = cliclack::select(label);
        for item in items {
            select = select.item(item.clone(), item, "");
        }
        select.interact()
    }

    fn ask_text(&mut self, label: &str) -> std::io::Result<String> {
        cliclack::input(label).interact()
    }
}
