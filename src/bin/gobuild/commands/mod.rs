//! Command implementations

pub mod build;
pub mod link;
pub mod trimpath;

use anyhow::{anyhow, Context, Result};

use crate::cli::ToolchainArgs;
use gobuild::builder::{OutputMode, ToolchainFamily};
use gobuild::ops::BuildOptions;
use gobuild::util::config::{load_for, Config};

/// Load the configuration for the current directory.
pub fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(load_for(&cwd))
}

/// Turn the toolchain flags into build options.
pub fn build_options(args: ToolchainArgs) -> Result<BuildOptions> {
    let toolchain = args
        .toolchain
        .map(|t| t.parse::<ToolchainFamily>())
        .transpose()?;

    let buildmode = args
        .buildmode
        .map(|m| m.parse::<OutputMode>())
        .transpose()
        .map_err(|e| anyhow!("{}", e))?;

    Ok(BuildOptions {
        dry_run: args.dry_run,
        toolchain,
        msan: args.msan,
        no_trimpath: args.no_trimpath,
        buildmode,
        overlay: args.overlay,
    })
}
