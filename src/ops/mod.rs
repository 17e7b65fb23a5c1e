//! High-level operations.
//!
//! This module contains the implementation of gobuild commands.

pub mod gobuild_build;
pub mod manifest;

pub use gobuild_build::{
    build, build_action, link, link_action, trimpath, BuildOptions, LinkOptions,
};
pub use manifest::load_action;
