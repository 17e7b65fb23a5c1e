//! Toolchain abstraction for Go compiler suites.
//!
//! A [`Toolchain`] turns build stages (symbol ABI scan, compile, C compile,
//! assemble, pack, link) into tool invocations issued through an
//! [`Executor`]. Every back end implements every stage; the set of back ends
//! is closed and represented by [`BuildToolchain`], selected once per build
//! from the [`BuildMode`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;

use crate::builder::command::CommandSpec;
use crate::builder::context::{BuildMode, Context};
use crate::builder::error::BuildError;
use crate::builder::executor::Executor;
use crate::core::action::Action;

mod gc;
mod gccgo;

pub use gc::GcToolchain;
pub use gccgo::GccgoToolchain;

/// Object file the compiler writes when it does not write the archive.
pub const GO_OBJECT: &str = "_go_.o";

/// Header the compiler writes for assembly files (`-asmhdr`).
pub const ASM_HEADER: &str = "go_asm.h";

/// Symbol ABI file produced from assembly sources.
pub const SYMABIS: &str = "symabis";

/// The `GOROOT_FINAL` value used when paths are trimmed.
pub const TRIMPATH_GOROOT_FINAL: &str = "go";

/// The compiler suite family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolchainFamily {
    /// The standard Go toolchain (`go tool compile`, `asm`, `pack`, `link`)
    #[default]
    Gc,
    /// The GCC Go front end
    Gccgo,
}

impl ToolchainFamily {
    /// Get the family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainFamily::Gc => "gc",
            ToolchainFamily::Gccgo => "gccgo",
        }
    }
}

impl FromStr for ToolchainFamily {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gc" => Ok(ToolchainFamily::Gc),
            "gccgo" => Ok(ToolchainFamily::Gccgo),
            _ => Err(BuildError::NoCompiler {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ToolchainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for the Go compile stage.
#[derive(Debug, Clone, Copy)]
pub struct GoCompileInput<'a> {
    /// Import configuration file
    pub importcfg: Option<&'a Path>,
    /// Archive the compiler should write, if the back end can
    pub archive: Option<&'a Path>,
    /// Symbol ABI file from [`Toolchain::symabis`]
    pub symabis: Option<&'a Path>,
    /// Whether to write `go_asm.h` for the package's assembly
    pub asmhdr: bool,
    /// Go files, relative to the package directory or absolute
    pub gofiles: &'a [PathBuf],
}

/// Trait for toolchain implementations.
///
/// Each toolchain knows how to run every build stage with its own tools.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain family.
    fn family(&self) -> ToolchainFamily;

    /// Scan the assembly files for symbol ABI definitions.
    ///
    /// Returns the path of the symabis file, or `None` when nothing was written.
    fn symabis(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Option<PathBuf>>;

    /// Compile Go files and return the path of the generated output file.
    ///
    /// The output is either the requested archive or a standalone object.
    fn gc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        input: &GoCompileInput<'_>,
    ) -> Result<PathBuf>;

    /// Compile a single C file to `ofile` with the toolchain's C compiler.
    fn cc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        ofile: &Path,
        cfile: &Path,
    ) -> Result<()>;

    /// Assemble each file and return the object files, in order.
    fn asm(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Vec<PathBuf>>;

    /// Append object files to an archive, creating it if needed.
    fn pack(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        afile: &Path,
        ofiles: &[PathBuf],
    ) -> Result<()>;

    /// Link an executable starting at the `mainpkg` archive.
    fn ld(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        out: &Path,
        importcfg: &Path,
        mainpkg: &Path,
    ) -> Result<()>;
}

/// The selected back end.
#[derive(Debug, Clone)]
pub enum BuildToolchain {
    Gc(GcToolchain),
    Gccgo(GccgoToolchain),
}

impl BuildToolchain {
    /// Select the back end named by the build mode.
    pub fn new(mode: &BuildMode) -> Self {
        match mode.toolchain {
            ToolchainFamily::Gc => BuildToolchain::Gc(GcToolchain::new(mode.trimpath)),
            ToolchainFamily::Gccgo => BuildToolchain::Gccgo(GccgoToolchain::new(
                mode.cgo.gccgo.clone(),
                mode.cgo.cc.clone(),
                mode.cgo.ar.clone(),
                mode.trimpath,
            )),
        }
    }

    fn inner(&self) -> &dyn Toolchain {
        match self {
            BuildToolchain::Gc(t) => t,
            BuildToolchain::Gccgo(t) => t,
        }
    }
}

impl Toolchain for BuildToolchain {
    fn family(&self) -> ToolchainFamily {
        self.inner().family()
    }

    fn symabis(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Option<PathBuf>> {
        self.inner().symabis(ctx, exec, a, sfiles)
    }

    fn gc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        input: &GoCompileInput<'_>,
    ) -> Result<PathBuf> {
        self.inner().gc(ctx, exec, a, input)
    }

    fn cc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        ofile: &Path,
        cfile: &Path,
    ) -> Result<()> {
        self.inner().cc(ctx, exec, a, ofile, cfile)
    }

    fn asm(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        self.inner().asm(ctx, exec, a, sfiles)
    }

    fn pack(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        afile: &Path,
        ofiles: &[PathBuf],
    ) -> Result<()> {
        self.inner().pack(ctx, exec, a, afile, ofiles)
    }

    fn ld(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        out: &Path,
        importcfg: &Path,
        mainpkg: &Path,
    ) -> Result<()> {
        self.inner().ld(ctx, exec, a, out, importcfg, mainpkg)
    }
}

/// Object file name for an assembly or C source: `<objdir>/<stem>.o`.
pub(crate) fn object_for(a: &Action, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    a.obj(format!("{stem}.o"))
}

/// Preprocessor defines naming the target.
pub(crate) fn target_defines(ctx: &Context) -> [String; 4] {
    [
        "-D".to_string(),
        format!("GOOS_{}", ctx.goos),
        "-D".to_string(),
        format!("GOARCH_{}", ctx.goarch),
    ]
}

/// A `go tool <name>` command.
pub(crate) fn go_tool(ctx: &Context, name: &str) -> CommandSpec {
    CommandSpec::new(&ctx.go_tool).arg("tool").arg(name)
}
