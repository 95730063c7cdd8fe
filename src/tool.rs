//! Subprocess execution as an injected capability.
//!
//! Everything that shells out (Candy Machine CLI, `spl-token`, git, yarn)
//! goes through [`ToolRunner`], so callers can be exercised against
//! [`ScriptedRunner`] instead of real binaries.

use std::cell::RefCell;
use std::fmt;
use std::process::Command;

use tracing::debug;

use crate::error::{HerbsError, Result};

/// A program plus its arguments, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        ToolOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        ToolOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait ToolRunner {
    /// Runs to completion. `Err` only when the process could not be started.
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Runs real processes, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        debug!(command = %invocation, "running");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stdout.lines() {
            debug!(program = %invocation.program, "{line}");
        }
        for line in stderr.lines() {
            debug!(program = %invocation.program, stream = "stderr", "{line}");
        }

        Ok(ToolOutput {
            status: output.status.code(),
            stdout,
            stderr,
        })
    }
}

/// A configured command prefix, e.g. `ts-node path/to/cli.ts` or `spl-token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Short name used in error messages.
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Splits `command` into program and leading arguments; an empty list falls back to `name`.
    pub fn new(name: impl Into<String>, command: &[String]) -> Self {
        let name = name.into();
        match command.split_first() {
            Some((program, args)) => ToolCommand {
                name,
                program: program.clone(),
                args: args.to_vec(),
            },
            None => ToolCommand {
                program: name.clone(),
                name,
                args: Vec::new(),
            },
        }
    }

    pub fn invocation<I, S>(&self, extra: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.args.clone();
        args.extend(extra.into_iter().map(Into::into));
        Invocation {
            program: self.program.clone(),
            args,
        }
    }
}

/// Runs `invocation`. A launch failure is [`HerbsError::ToolUnavailable`],
/// a non-zero exit [`HerbsError::ExternalTool`].
pub fn run_checked<R: ToolRunner + ?Sized>(
    runner: &R,
    tool: &str,
    operation: &str,
    invocation: &Invocation,
) -> Result<ToolOutput> {
    let output = runner
        .run(invocation)
        .map_err(|source| HerbsError::ToolUnavailable {
            tool: tool.to_string(),
            operation: operation.to_string(),
            source,
        })?;

    if !output.success() {
        let status = output
            .status
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
        let stderr = output.stderr.trim();
        let detail = if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        };
        return Err(HerbsError::ExternalTool {
            tool: tool.to_string(),
            operation: operation.to_string(),
            detail,
        });
    }
    Ok(output)
}

/// In-process stand-in for [`SystemRunner`]: records every invocation and
/// answers from a list of `(pattern, output)` rules, succeeding with empty
/// output when no rule matches.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, ToolOutput)>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `output` to any invocation whose command line contains `pattern`.
    /// Earlier rules win.
    pub fn respond(mut self, pattern: impl Into<String>, output: ToolOutput) -> Self {
        self.rules.push((pattern.into(), output));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Recorded invocations rendered as command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.to_string();
        let output = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ToolOutput::ok(""));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_prefix_is_kept() {
        let cmd = ToolCommand::new(
            "candy-machine",
            &["ts-node".to_string(), "cli.ts".to_string()],
        );
        let inv = cmd.invocation(["upload", "-e", "devnet"]);
        assert_eq!(inv.program, "ts-node");
        assert_eq!(inv.to_string(), "ts-node cli.ts upload -e devnet");
    }

    #[test]
    fn empty_command_falls_back_to_name() {
        let cmd = ToolCommand::new("spl-token", &[]);
        assert_eq!(cmd.invocation(["accounts"]).to_string(), "spl-token accounts");
    }

    #[test]
    fn non_zero_exit_is_an_external_tool_error() {
        let runner = ScriptedRunner::new().respond("burn", ToolOutput::failed(1, "no funds"));
        let err = run_checked(
            &runner,
            "spl-token",
            "burn",
            &Invocation::new("spl-token", ["burn", "acc", "1"]),
        )
        .unwrap_err();

        match err {
            HerbsError::ExternalTool { tool, detail, .. } => {
                assert_eq!(tool, "spl-token");
                assert!(detail.contains("exit status 1"));
                assert!(detail.contains("no funds"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scripted_runner_records_calls_in_order() {
        let runner = ScriptedRunner::new();
        runner.run(&Invocation::new("a", ["1"])).unwrap();
        runner.run(&Invocation::new("b", ["2"])).unwrap();
        assert_eq!(runner.command_lines(), vec!["a 1", "b 2"]);
    }

    #[test]
    fn missing_binary_is_reported_not_panicked() {
        let err = run_checked(
            &SystemRunner,
            "ghost",
            "run",
            &Invocation::new("definitely-not-a-real-binary-herbs", Vec::<String>::new()),
        )
        .unwrap_err();
        assert!(matches!(err, HerbsError::ToolUnavailable { .. }));
        assert!(err.to_string().contains("could not be started"));
    }
}
