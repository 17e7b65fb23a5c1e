//! gobuild - build Go packages with the gc or gccgo compiler suites
//!
//! This crate provides the per-package build core: cgo bridging, linker
//! flag checking, path trimming and the compile/assemble/pack/link stages.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for gobuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording executor and on-disk package
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildError, BuildMode, Context, PackageBuilder};
pub use core::{action::Action, package::Package};
pub use util::Config;
