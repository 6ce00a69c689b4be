//! Shell command execution for Execute-mode prompts

use crate::error::{ModuleError, ModuleResult};
use std::process::{Command, Stdio};

/// Runs a command and returns its standard output
pub trait CommandRunner {
    /// Run `command` with `env` added to the process environment
    fn run(&self, command: &str, env: &[(String, String)]) -> ModuleResult<String>;
}

/// Runs commands through `<shell> -c`
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SHELL)
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str, env: &[(String, String)]) -> ModuleResult<String> {
        tracing::debug!(shell = %self.shell, command, "running prompt command");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ModuleError::CommandExecution {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModuleError::CommandExecution {
                command: command.to_string(),
                message: format!("{} {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> ShellCommandRunner {
        ShellCommandRunner::new("sh")
    }

    #[test]
    fn test_captures_stdout() {
        let out = sh().run("echo hello", &[]).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_passes_environment() {
        let env = vec![("REGION".to_string(), "eu".to_string())];
        let out = sh().run("printf %s \"$REGION\"", &env).unwrap();
        assert_eq!(out, "eu");
    }

    #[test]
    fn test_non_zero_exit_is_fatal() {
        let err = sh().run("echo oops >&2; exit 3", &[]).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_missing_shell_is_fatal() {
        let err = ShellCommandRunner::new("/nonexistent/shell")
            .run("true", &[])
            .unwrap_err();
        assert!(matches!(err, ModuleError::CommandExecution { .. }));
    }
}
