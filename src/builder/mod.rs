//! Go package build system.
//!
//! This module implements the per-package build: the cgo bridge step, the
//! compiler suite back ends and the orchestrator that drives them.

pub mod build;
pub mod cgo;
pub mod command;
pub mod context;
pub mod error;
pub mod executor;
pub mod security;
pub mod toolchain;

pub use build::{BuildOutput, PackageBuilder};
pub use command::CommandSpec;
pub use context::{BuildMode, CgoEnv, Context, OutputMode};
pub use error::BuildError;
pub use executor::{Executor, ProcessExecutor};
pub use toolchain::{BuildToolchain, Toolchain, ToolchainFamily};
