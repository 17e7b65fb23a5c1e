//! Tool command construction.
//!
//! A [`CommandSpec`] is an ordered list of typed argument segments. The
//! segments flatten to the exact argument vector handed to the executor.

use std::fmt;
use std::path::{Path, PathBuf};

/// One segment of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A single argument, e.g. `-complete` or an input file
    Flag(String),
    /// A flag followed by its value, e.g. `-o out.a`
    Value(String, String),
    /// Zero or more arguments kept together, e.g. user CFLAGS
    Values(Vec<String>),
}

impl Arg {
    fn push_into(&self, out: &mut Vec<String>) {
        match self {
            Arg::Flag(f) => out.push(f.clone()),
            Arg::Value(f, v) => {
                out.push(f.clone());
                out.push(v.clone());
            }
            Arg::Values(vs) => out.extend(vs.iter().cloned()),
        }
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "go", "gcc")
    pub program: PathBuf,
    /// Argument segments, in order
    pub segments: Vec<Arg>,
    /// Environment overrides, added to the ambient environment
    pub env: Vec<(String, String)>,
    /// Working directory, if the command must run somewhere specific
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            segments: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.segments.push(Arg::Flag(arg.into()));
        self
    }

    /// Add a path argument.
    pub fn path(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().to_string_lossy())
    }

    /// Add a flag and its value.
    pub fn value(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.segments.push(Arg::Value(flag.into(), value.into()));
        self
    }

    /// Add a flag and a path value.
    pub fn value_path(self, flag: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.value(flag, path.as_ref().to_string_lossy())
    }

    /// Add a run of arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.segments
            .push(Arg::Values(args.into_iter().map(Into::into).collect()));
        self
    }

    /// Add a run of path arguments.
    pub fn paths(self, paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        self.args(
            paths
                .into_iter()
                .map(|p| p.as_ref().to_string_lossy().into_owned()),
        )
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The flattened argument vector.
    pub fn to_args(&self) -> Vec<String> {
        let mut out = Vec::new();
        for seg in &self.segments {
            seg.push_into(&mut out);
        }
        out
    }

    /// The command line as a single string, for logs and dry runs.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.to_args());
        parts.join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.display_command())
    }
}
