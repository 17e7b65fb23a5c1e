//! `gobuild build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::{build_options, load_config};
use gobuild::ops::build;

pub fn execute(args: BuildArgs) -> Result<()> {
    let config = load_config()?;
    let opts = build_options(args.toolchain)?;

    let output = build(&args.manifest, &config, &opts)?;

    if !opts.dry_run {
        eprintln!("    Finished -> {}", output.archive.display());
    }

    Ok(())
}
