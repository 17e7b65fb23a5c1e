//! The effect boundary of the builder.
//!
//! Every subprocess the builder starts and every staging file it writes goes
//! through an [`Executor`]. Builds are otherwise free of side effects, so
//! tests substitute a recording executor for the real one.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::command::CommandSpec;
use crate::core::action::Action;
use crate::util::fs::write_bytes;
use crate::util::process::ProcessBuilder;

/// Runs build commands and writes staging files.
///
/// Implementations must be usable from several builds at once.
pub trait Executor: Send + Sync {
    /// Run a command to completion on behalf of `action`.
    ///
    /// A non-zero exit status is an error.
    fn run(&self, action: &Action, cmd: &CommandSpec) -> Result<()>;

    /// Write a file, replacing any previous contents.
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// Executor that runs real processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    dry_run: bool,
}

impl ProcessExecutor {
    /// Create an executor that runs commands.
    pub fn new() -> Self {
        ProcessExecutor { dry_run: false }
    }

    /// Print commands instead of running them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn print(&self, line: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").context("failed to write to stdout")
    }
}

impl Executor for ProcessExecutor {
    fn run(&self, action: &Action, cmd: &CommandSpec) -> Result<()> {
        if self.dry_run {
            if let Some(ref cwd) = cmd.cwd {
                self.print(&format!("cd {}", cwd.display()))?;
            }
            return self.print(&cmd.to_string());
        }

        tracing::debug!("{}", cmd);

        ProcessBuilder::from_spec(cmd)
            .exec_and_check()
            .with_context(|| format!("building {}", action.package.import_path))?;
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.dry_run {
            return self.print(&format!(
                "cat >{} << 'EOF' # internal\n{}EOF",
                path.display(),
                String::from_utf8_lossy(contents)
            ));
        }

        tracing::debug!("writing {}", path.display());
        write_bytes(path, contents)
    }
}
