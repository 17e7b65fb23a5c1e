//! Core data structures for gobuild.
//!
//! This module contains the inputs of a package build:
//! - Packages and their source file lists
//! - Actions (one package build in one object directory)
//! - Source overlays

pub mod action;
pub mod overlay;
pub mod package;

pub use action::Action;
pub use overlay::Overlay;
pub use package::{Package, SourceKind};
