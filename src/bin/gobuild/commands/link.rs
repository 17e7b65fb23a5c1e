//! `gobuild link` command

use anyhow::Result;

use crate::cli::LinkArgs;
use crate::commands::{build_options, load_config};
use gobuild::ops::{link, LinkOptions};

pub fn execute(args: LinkArgs) -> Result<()> {
    let config = load_config()?;
    let opts = LinkOptions {
        build: build_options(args.toolchain)?,
        output: args.output,
        mainpkg: args.mainpkg,
        importcfg: args.importcfg,
    };

    link(&args.manifest, &config, &opts)?;

    if !opts.build.dry_run {
        eprintln!("    Finished -> {}", opts.output.display());
    }

    Ok(())
}
