//! Parameter collection for a module's prompts

use crate::config::descriptor::{PromptMode, PromptSpec};
use crate::config::ProjectContext;
use crate::error::{ModuleError, ModuleResult};
use crate::prompt::{CommandRunner, Prompter};
use std::collections::HashMap;

/// Fill `params` and `ctx` by walking `prompts` in declaration order
///
/// A field already present in the project context is never asked again.
/// Otherwise the value comes from a select prompt, a shell command, or a
/// free-text prompt, in that order of precedence.
///
/// Prompt failures are returned as [`ModuleError::UserAbort`]; command
/// failures as the fatal [`ModuleError::CommandExecution`].
pub fn collect_params(
    prompts: &[PromptSpec],
    params: &mut HashMap<String, String>,
    ctx: &mut ProjectContext,
    prompter: &mut dyn Prompter,
    runner: &dyn CommandRunner,
) -> ModuleResult<()> {
    for prompt in prompts {
        let field = prompt.field.as_str();

        if ctx.contains(field) {
            tracing::debug!(field, "already set in project context, skipping");
            continue;
        }

        let label = prompt.display_label();
        let raw = match prompt.mode() {
            PromptMode::Select => prompter
                .ask_select(label, &prompt.options)
                .map_err(|e| user_abort(field, e))?,
            PromptMode::Execute => {
                let env: Vec<(String, String)> = ctx
                    .env_vars()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                runner.run(&prompt.execute, &env)?
            }
            PromptMode::Text => prompter
                .ask_text(label)
                .map_err(|e| user_abort(field, e))?,
        };

        let value = sanitize_prompt_result(&raw);
        params.insert(field.to_string(), value.clone());
        ctx.insert(field, value);
    }

    Ok(())
}

/// Drop newlines; command output usually ends with one
pub fn sanitize_prompt_result(raw: &str) -> String {
    raw.replace('\n', "")
}

fn user_abort(field: &str, error: std::io::Error) -> ModuleError {
    tracing::debug!(field, %error, "prompt cancelled");
    ModuleError::UserAbort {
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers prompts from a script and records what was asked
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<std::io::Result<String>>,
        asked: Vec<String>,
    }

    impl ScriptedPrompter {
        fn answering(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
                asked: Vec::new(),
            }
        }

        fn next(&mut self, label: &str) -> std::io::Result<String> {
            self.asked.push(label.to_string());
            self.answers
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected prompt '{}'", label))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask_select(&mut self, label: &str, items: &[String]) -> std::io::Result<String> {
            let answer = self.next(label)?;
            assert!(items.contains(&answer), "'{}' is not an option", answer);
            Ok(answer)
        }

        fn ask_text(&mut self, label: &str) -> std::io::Result<String> {
            self.next(label)
        }
    }

    /// Returns a fixed output (or fails) and records the environment it was given
    struct RecordingRunner {
        output: Option<String>,
        env_seen: RefCell<Vec<(String, String)>>,
        calls: RefCell<usize>,
    }

    impl RecordingRunner {
        fn returning(output: &str) -> Self {
            Self {
                output: Some(output.to_string()),
                env_seen: RefCell::new(Vec::new()),
                calls: RefCell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                output: None,
                env_seen: RefCell::new(Vec::new()),
                calls: RefCell::new(0),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &str, env: &[(String, String)]) -> ModuleResult<String> {
            *self.calls.borrow_mut() += 1;
            *self.env_seen.borrow_mut() = env.to_vec();
            self.output
                .clone()
                .ok_or_else(|| ModuleError::CommandExecution {
                    command: command.to_string(),
                    message: "exit status: 255".to_string(),
                })
        }
    }

    fn prompt(field: &str) -> PromptSpec {
        PromptSpec {
            field: field.to_string(),
            ..Default::default()
        }
    }

    fn select(field: &str, options: &[&str]) -> PromptSpec {
        PromptSpec {
            field: field.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        }
    }

    fn execute(field: &str, command: &str) -> PromptSpec {
        PromptSpec {
            field: field.to_string(),
            execute: command.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_then_text_fills_params_and_context() {
        let prompts = vec![select("region", &["us", "eu"]), prompt("name")];
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter::answering(&["eu", "demo"]);
        let runner = RecordingRunner::returning("");

        collect_params(&prompts, &mut params, &mut ctx, &mut prompter, &runner).unwrap();

        let expected = HashMap::from([
            ("region".to_string(), "eu".to_string()),
            ("name".to_string(), "demo".to_string()),
        ]);
        assert_eq!(params, expected);
        assert_eq!(ctx, ProjectContext::from(expected));
        assert_eq!(prompter.asked, vec!["region", "name"]);
    }

    #[test]
    fn test_second_module_reuses_context() {
        let mut ctx = ProjectContext::new();
        ctx.insert("region", "eu");
        let mut params = HashMap::new();
        let mut prompter = ScriptedPrompter::default();
        let runner = RecordingRunner::returning("us");

        collect_params(
            &[prompt("region"), execute("region", "echo us")],
            &mut params,
            &mut ctx,
            &mut prompter,
            &runner,
        )
        .unwrap();

        assert!(prompter.asked.is_empty());
        assert_eq!(*runner.calls.borrow(), 0);
        assert_eq!(ctx.get("region"), Some("eu"));
    }

    #[test]
    fn test_execute_sees_earlier_values_and_is_sanitized() {
        let prompts = vec![prompt("profile"), execute("accountId", "aws sts ...")];
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        ctx.insert("blank", "");
        let mut prompter = ScriptedPrompter::answering(&["prod"]);
        let runner = RecordingRunner::returning("1234\n5678\n");

        collect_params(&prompts, &mut params, &mut ctx, &mut prompter, &runner).unwrap();

        assert_eq!(params["accountId"], "12345678");
        assert_eq!(ctx.get("accountId"), Some("12345678"));
        let env = runner.env_seen.borrow();
        assert!(env.contains(&("profile".to_string(), "prod".to_string())));
        assert!(!env.iter().any(|(k, _)| k == "blank"));
    }

    #[test]
    fn test_options_win_over_execute() {
        let mut spec = select("env", &["dev", "prod"]);
        spec.execute = "echo staging".to_string();
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter::answering(&["prod"]);
        let runner = RecordingRunner::returning("staging");

        collect_params(&[spec], &mut params, &mut ctx, &mut prompter, &runner).unwrap();

        assert_eq!(params["env"], "prod");
        assert_eq!(*runner.calls.borrow(), 0);
    }

    #[test]
    fn test_user_abort_is_recoverable_and_stops_collection() {
        let prompts = vec![prompt("first"), prompt("second")];
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter {
            answers: VecDeque::from([Err(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "ctrl-c",
            ))]),
            asked: Vec::new(),
        };
        let runner = RecordingRunner::returning("");

        let err = collect_params(&prompts, &mut params, &mut ctx, &mut prompter, &runner)
            .unwrap_err();

        assert!(matches!(err, ModuleError::UserAbort { ref field } if field == "first"));
        assert!(!err.is_fatal());
        assert_eq!(prompter.asked.len(), 1);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_command_failure_is_fatal() {
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter::default();
        let runner = RecordingRunner::failing();

        let err = collect_params(
            &[execute("accountId", "aws sts get-caller-identity")],
            &mut params,
            &mut ctx,
            &mut prompter,
            &runner,
        )
        .unwrap_err();

        assert!(err.is_fatal());
        assert!(!ctx.contains("accountId"));
    }

    #[test]
    fn test_param_missing_from_context_is_asked_even_when_preset() {
        let mut params = HashMap::from([("port".to_string(), "8080".to_string())]);
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter::answering(&["9090"]);
        let runner = RecordingRunner::returning("");

        collect_params(&[prompt("port")], &mut params, &mut ctx, &mut prompter, &runner).unwrap();

        assert_eq!(prompter.asked, vec!["port"]);
        assert_eq!(params["port"], "9090");
        assert_eq!(ctx.get("port"), Some("9090"));
    }

    #[test]
    fn test_label_defaults_to_field() {
        let mut labelled = prompt("svc");
        labelled.label = "Service name".to_string();
        let mut params = HashMap::new();
        let mut ctx = ProjectContext::new();
        let mut prompter = ScriptedPrompter::answering(&["a", "b"]);
        let runner = RecordingRunner::returning("");

        collect_params(
            &[labelled, prompt("owner")],
            &mut params,
            &mut ctx,
            &mut prompter,
            &runner,
        )
        .unwrap();

        assert_eq!(prompter.asked, vec!["Service name", "owner"]);
    }

    #[test]
    fn test_sanitize_prompt_result() {
        assert_eq!(sanitize_prompt_result("us-east-1\n"), "us-east-1");
        assert_eq!(sanitize_prompt_result("a\r\nb"), "a\rb");
        assert_eq!(sanitize_prompt_result("plain"), "plain");
    }
}
