//! Test utilities and mocks for gobuild unit tests.
//!
//! The [`RecordingExecutor`] stands in for real tools: it records every
//! command and staged file, can fail commands matching a pattern, and can
//! create the files a real tool would have generated (for example the
//! `_cgo_gotypes.go` the cgo tool writes).
//!
//! # Example
//!
//! ```rust,ignore
//! use gobuild::test_support::{CommandPattern, RecordingExecutor};
//!
//! let exec = RecordingExecutor::new()
//!     .fail_on(CommandPattern::Contains("tool pack".into()), "pack exploded");
//! // Run a build with `&exec`, then inspect `exec.calls()`.
//! ```

pub mod fixtures;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::command::CommandSpec;
use crate::builder::executor::Executor;
use crate::core::action::Action;

pub use fixtures::*;

/// Pattern for matching commands in the RecordingExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// A command as seen by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Program and arguments joined with spaces.
    pub line: String,
    /// Program.
    pub program: PathBuf,
    /// Flattened arguments.
    pub args: Vec<String>,
    /// Environment overrides.
    pub env: Vec<(String, String)>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
}

impl RecordedCommand {
    fn from_spec(spec: &CommandSpec) -> Self {
        RecordedCommand {
            line: spec.display_command(),
            program: spec.program.clone(),
            args: spec.to_args(),
            env: spec.env.clone(),
            cwd: spec.cwd.clone(),
        }
    }

    /// The value following `flag` in the arguments, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Whether the arguments contain `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// The value of an environment override, if set.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A file the executor creates on disk when a matching command runs.
#[derive(Debug, Clone)]
struct GeneratedFile {
    pattern: CommandPattern,
    path: PathBuf,
    contents: Vec<u8>,
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<RecordedCommand>,
    written: BTreeMap<PathBuf, Vec<u8>>,
}

/// Executor that records commands instead of running them.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    failures: Vec<(CommandPattern, String)>,
    generated: Vec<GeneratedFile>,
    fail_writes: bool,
    recorded: Mutex<Recorded>,
}

impl RecordingExecutor {
    /// Create a new recording executor where every command succeeds.
    pub fn new() -> Self {
        RecordingExecutor::default()
    }

    /// Fail commands matching `pattern` with `message`.
    pub fn fail_on(mut self, pattern: CommandPattern, message: impl Into<String>) -> Self {
        self.failures.push((pattern, message.into()));
        self
    }

    /// Write `contents` to `path` on disk whenever a command matching `pattern` runs.
    pub fn generate_on(
        mut self,
        pattern: CommandPattern,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.generated.push(GeneratedFile {
            pattern,
            path: path.into(),
            contents: contents.into(),
        });
        self
    }

    /// Fail every `write_file` call.
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Get all commands that were run, in order.
    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.lock().calls.clone()
    }

    /// Get the command lines that were run, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.line.clone()).collect()
    }

    /// Get the commands whose line contains `needle`.
    pub fn calls_containing(&self, needle: &str) -> Vec<RecordedCommand> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.line.contains(needle))
            .cloned()
            .collect()
    }

    /// Get the files written through the executor.
    pub fn written(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.lock().written.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, _action: &Action, cmd: &CommandSpec) -> Result<()> {
        let recorded = RecordedCommand::from_spec(cmd);
        let line = recorded.line.clone();
        self.lock().calls.push(recorded);

        for (pattern, message) in &self.failures {
            if pattern.matches(&line) {
                bail!("`{}` failed: {}", line, message);
            }
        }

        for file in &self.generated {
            if file.pattern.matches(&line) {
                crate::util::fs::write_bytes(&file.path, &file.contents)?;
            }
        }

        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.fail_writes {
            bail!("failed to write file: {}", path.display());
        }
        self.lock()
            .written
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::Package;

    fn action() -> Action {
        Action::new(Package::new("example.com/foo", "/src/foo"), "/tmp/b001")
    }

    #[test]
    fn test_command_pattern_matching() {
        assert!(CommandPattern::Exact("go tool pack".into()).matches("go tool pack"));
        assert!(!CommandPattern::Exact("go tool".into()).matches("go tool pack"));
        assert!(CommandPattern::StartsWith("go tool".into()).matches("go tool pack"));
        assert!(CommandPattern::Contains("pack".into()).matches("go tool pack r"));
        assert!(CommandPattern::Regex(r"tool (asm|compile)".into()).matches("go tool asm -p x"));
        assert!(!CommandPattern::Regex("[".into()).matches("anything"));
        assert!(CommandPattern::Any.matches(""));
    }

    #[test]
    fn test_records_calls_and_writes() {
        let exec = RecordingExecutor::new();
        let cmd = CommandSpec::new("go")
            .arg("tool")
            .arg("compile")
            .value("-o", "out.o")
            .env("GOROOT_FINAL", "go");

        exec.run(&action(), &cmd).unwrap();
        exec.write_file(Path::new("/tmp/b001/go_asm.h"), b"").unwrap();

        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].line, "go tool compile -o out.o");
        assert_eq!(calls[0].flag_value("-o"), Some("out.o"));
        assert_eq!(calls[0].env_value("GOROOT_FINAL"), Some("go"));
        assert!(exec.written().contains_key(Path::new("/tmp/b001/go_asm.h")));
    }

    #[test]
    fn test_fail_on_pattern() {
        let exec = RecordingExecutor::new()
            .fail_on(CommandPattern::Contains("tool pack".into()), "boom");

        exec.run(&action(), &CommandSpec::new("go").arg("tool").arg("compile"))
            .unwrap();
        let err = exec
            .run(&action(), &CommandSpec::new("go").arg("tool").arg("pack"))
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn test_generate_on_pattern() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("_cgo_gotypes.go");
        let exec = RecordingExecutor::new().generate_on(
            CommandPattern::Contains("tool cgo".into()),
            &path,
            "package foo\n",
        );

        exec.run(&action(), &CommandSpec::new("go").arg("tool").arg("cgo"))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package foo\n");
    }
}
