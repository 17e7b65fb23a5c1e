//! `gobuild trimpath` command

use anyhow::Result;

use crate::cli::TrimpathArgs;
use gobuild::ops::trimpath;

pub fn execute(args: TrimpathArgs) -> Result<()> {
    println!("{}", trimpath(&args.manifest)?);
    Ok(())
}
