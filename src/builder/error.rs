//! Typed build errors.
//!
//! Input-contract and security violations are reported with these types.
//! Subprocess and filesystem failures travel as plain `anyhow` errors.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::package::SourceKind;

/// Error raised by the builder for a package it refuses to build.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("package using cgo has Go assembly file {}", .file.display())]
    #[diagnostic(
        code(gobuild::cgo::go_assembly),
        help("move the Go assembly into a package without cgo, or rewrite it for the C compiler")
    )]
    GoAssemblyInCgoPackage { file: PathBuf },

    #[error("{}: C source files not supported without cgo", .file.display())]
    #[diagnostic(code(gobuild::toolchain::c_without_cgo))]
    CSourceWithoutCgo { file: PathBuf },

    #[error("unknown toolchain `{name}`: no compiler selected")]
    #[diagnostic(
        code(gobuild::toolchain::no_compiler),
        help("valid toolchains: gc, gccgo")
    )]
    NoCompiler { name: String },

    #[error("{} is listed as both {first} and {second} source", .file.display())]
    #[diagnostic(code(gobuild::package::duplicate_source))]
    DuplicateSourceFile {
        file: PathBuf,
        first: SourceKind,
        second: SourceKind,
    },

    #[error("invalid flag in {origin}: {flag}")]
    #[diagnostic(code(gobuild::cgo::invalid_flag), url("https://golang.org/s/invalidflag"))]
    InvalidFlag { origin: String, flag: String },

    #[error("invalid flag in {origin}: {flag} {arg}")]
    #[diagnostic(code(gobuild::cgo::invalid_flag), url("https://golang.org/s/invalidflag"))]
    InvalidFlagArgument {
        origin: String,
        flag: String,
        arg: String,
    },

    #[error("invalid flag in {origin}: {flag} without argument")]
    #[diagnostic(code(gobuild::cgo::invalid_flag), url("https://golang.org/s/invalidflag"))]
    MissingFlagArgument { origin: String, flag: String },

    #[error("invalid {var} pattern `{pattern}`")]
    #[diagnostic(code(gobuild::config::flag_pattern))]
    InvalidFlagPattern {
        var: String,
        pattern: String,
        #[source]
        err: regex::Error,
    },
}

impl BuildError {
    /// Whether this error rejects a linker flag.
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self,
            BuildError::InvalidFlag { .. }
                | BuildError::InvalidFlagArgument { .. }
                | BuildError::MissingFlagArgument { .. }
        )
    }
}
