//! Implementation of `gobuild build` and `gobuild link`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::{
    BuildMode, BuildOutput, BuildToolchain, Context, Executor, OutputMode, PackageBuilder,
    ProcessExecutor, ToolchainFamily,
};
use crate::core::action::Action;
use crate::core::overlay::Overlay;
use crate::ops::manifest::load_action;
use crate::util::config::Config;
use crate::util::fs::ensure_dir;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Print commands instead of running them
    pub dry_run: bool,

    /// Compiler suite, overriding the configuration
    pub toolchain: Option<ToolchainFamily>,

    /// Build with the memory sanitizer
    pub msan: bool,

    /// Keep file system paths in the outputs
    pub no_trimpath: bool,

    /// Kind of final artifact, overriding the configuration
    pub buildmode: Option<OutputMode>,

    /// JSON overlay file, overriding the configuration
    pub overlay: Option<PathBuf>,
}

impl BuildOptions {
    /// The build mode of `config` with these options applied on top.
    pub fn build_mode(&self, config: &Config) -> Result<BuildMode> {
        let mut mode = config.build_mode()?;
        mode.dry_run = self.dry_run;
        if let Some(toolchain) = self.toolchain {
            mode.toolchain = toolchain;
        }
        if self.msan {
            mode.msan = true;
        }
        if self.no_trimpath {
            mode.trimpath = false;
        }
        if let Some(output) = self.buildmode {
            mode.output = output;
        }
        if let Some(ref overlay) = self.overlay {
            mode.overlay = Overlay::load(overlay)?;
        }
        Ok(mode)
    }
}

/// Options for the link command.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Build options shared with `build`
    pub build: BuildOptions,

    /// Executable to write
    pub output: PathBuf,

    /// Archive of the main package
    pub mainpkg: PathBuf,

    /// Import configuration, defaulting to the manifest's
    pub importcfg: Option<PathBuf>,
}

/// Build the package described by the action manifest at `manifest`.
pub fn build(manifest: &Path, config: &Config, opts: &BuildOptions) -> Result<BuildOutput> {
    let action = load_action(manifest)?;
    let ctx = config.context()?;
    let mode = opts.build_mode(config)?;

    let exec = ProcessExecutor::new().dry_run(mode.dry_run);
    build_action(&ctx, &mode, &exec, &action)
}

/// Build one action with the given executor.
pub fn build_action(
    ctx: &Context,
    mode: &BuildMode,
    exec: &dyn Executor,
    action: &Action,
) -> Result<BuildOutput> {
    if !mode.dry_run {
        ensure_dir(&action.objdir)?;
    }

    let toolchain = BuildToolchain::new(mode);
    let output = PackageBuilder::new(ctx, mode, exec, &toolchain).build(action)?;

    tracing::info!(
        "Built {} ({} object{})",
        output.archive.display(),
        output.objects.len(),
        if output.objects.len() == 1 { "" } else { "s" }
    );
    Ok(output)
}

/// Link an executable for the main package described by `manifest`.
pub fn link(manifest: &Path, config: &Config, opts: &LinkOptions) -> Result<()> {
    let action = load_action(manifest)?;
    let ctx = config.context()?;
    let mode = opts.build.build_mode(config)?;

    let exec = ProcessExecutor::new().dry_run(mode.dry_run);
    link_action(&ctx, &mode, &exec, &action, opts)
}

/// Link one action with the given executor.
pub fn link_action(
    ctx: &Context,
    mode: &BuildMode,
    exec: &dyn Executor,
    action: &Action,
    opts: &LinkOptions,
) -> Result<()> {
    if !action.package.is_main() {
        bail!(
            "cannot link package `{}`: not a main package",
            action.package
        );
    }

    let Some(importcfg) = opts.importcfg.as_ref().or(action.importcfg.as_ref()) else {
        bail!(
            "no import configuration for {}\n\
             hint: pass --importcfg or set `importcfg` in the action manifest",
            action.package
        );
    };

    let toolchain = BuildToolchain::new(mode);
    PackageBuilder::new(ctx, mode, exec, &toolchain).link(
        action,
        &opts.output,
        importcfg,
        &opts.mainpkg,
    )
}

/// The trimpath rewrite rule for the action described by `manifest`.
pub fn trimpath(manifest: &Path) -> Result<String> {
    Ok(load_action(manifest)?.trimpath())
}
