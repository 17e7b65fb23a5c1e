//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// gobuild - build Go packages with the gc or gccgo compiler suites
#[derive(Parser)]
#[command(name = "gobuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the package described by an action manifest
    Build(BuildArgs),

    /// Link a main package into an executable
    Link(LinkArgs),

    /// Print the trimpath rewrite rule for an action manifest
    Trimpath(TrimpathArgs),
}

/// Options shared by commands that run the toolchain.
#[derive(Args)]
pub struct ToolchainArgs {
    /// Print the commands instead of running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Compiler suite to use (gc, gccgo)
    #[arg(long)]
    pub toolchain: Option<String>,

    /// Build with the memory sanitizer
    #[arg(long)]
    pub msan: bool,

    /// Keep file system paths in the outputs
    #[arg(long)]
    pub no_trimpath: bool,

    /// Kind of artifact the build produces (default, archive, c-archive, c-shared, exe, pie)
    #[arg(long)]
    pub buildmode: Option<String>,

    /// JSON file replacing cgo source files with other files
    #[arg(long)]
    pub overlay: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the action manifest
    pub manifest: PathBuf,

    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

#[derive(Args)]
pub struct LinkArgs {
    /// Path to the action manifest of the main package
    pub manifest: PathBuf,

    /// Executable to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Archive of the main package
    #[arg(long = "main")]
    pub mainpkg: PathBuf,

    /// Import configuration (defaults to the manifest's `importcfg`)
    #[arg(long)]
    pub importcfg: Option<PathBuf>,

    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

#[derive(Args)]
pub struct TrimpathArgs {
    /// Path to the action manifest
    pub manifest: PathBuf,
}
