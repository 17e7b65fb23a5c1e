//! C, C++ and Fortran compiler invocations for the cgo step.

use std::path::{Path, PathBuf};

use crate::builder::command::CommandSpec;
use crate::builder::context::{BuildMode, Context};
use crate::core::action::Action;

/// Directory object paths are rewritten to in debug info.
pub const TRIMMED_OBJDIR: &str = "/tmp/go-build";

/// Which compiler from the cgo environment to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compiler {
    /// CC, for C, Objective-C and assembly
    C,
    /// CXX
    Cxx,
    /// FC
    Fortran,
}

impl Compiler {
    fn program<'m>(&self, mode: &'m BuildMode) -> &'m Path {
        match self {
            Compiler::C => &mode.cgo.cc,
            Compiler::Cxx => &mode.cgo.cxx,
            Compiler::Fortran => &mode.cgo.fc,
        }
    }
}

/// Flags selecting the target's data model and instruction set.
pub fn arch_flags(goarch: &str) -> &'static [&'static str] {
    match goarch {
        "386" => &["-m32"],
        "amd64" | "ppc64" | "ppc64le" => &["-m64"],
        "arm" => &["-marm"],
        "s390x" => &["-m64", "-march=z196"],
        "mips64" | "mips64le" => &["-mabi=64"],
        "mips" | "mipsle" => &["-mabi=32"],
        _ => &[],
    }
}

/// Builds the foreign compiler command lines for one action.
#[derive(Debug, Clone, Copy)]
pub struct CCommands<'a> {
    ctx: &'a Context,
    mode: &'a BuildMode,
    action: &'a Action,
}

impl<'a> CCommands<'a> {
    pub fn new(ctx: &'a Context, mode: &'a BuildMode, action: &'a Action) -> Self {
        CCommands { ctx, mode, action }
    }

    /// The compiler and the options every invocation shares.
    fn base(&self, compiler: Compiler) -> CommandSpec {
        let a = self.action;
        let mut cmd = CommandSpec::new(compiler.program(self.mode))
            .value_path("-I", &a.objdir)
            .args(arch_flags(&self.ctx.goarch).iter().copied());

        if !self.ctx.is_windows() {
            cmd = cmd.arg("-fPIC").arg("-pthread");
        }
        cmd.arg("-fmessage-length=0")
            .env("TERM", "dumb")
            .cwd(&a.package.dir)
    }

    /// Compile `file` to `ofile` with the given merged flags.
    pub fn compile(
        &self,
        compiler: Compiler,
        flags: &[String],
        ofile: &Path,
        file: &Path,
    ) -> CommandSpec {
        let a = self.action;
        // The object directory never reaches debug info; the package
        // directory is rewritten only when trimming paths.
        let mut cmd = self.base(compiler).args([
            format!("-fdebug-prefix-map={}={}", a.objdir.display(), TRIMMED_OBJDIR),
            "-gno-record-gcc-switches".to_string(),
        ]);
        if self.mode.trimpath {
            cmd = cmd.arg(format!(
                "-fdebug-prefix-map={}={}",
                a.package.dir.display(),
                a.rewrite_dir()
            ));
        }

        cmd.args(flags.iter().cloned())
            .value_path("-o", ofile)
            .value_path("-c", a.package.abs(file))
    }

    /// Link `objects` into `out`.
    ///
    /// Packages with C++ sources link with CXX so the C++ runtime comes along.
    pub fn link(&self, out: &Path, objects: &[PathBuf], ldflags: &[String]) -> CommandSpec {
        let compiler = if self.action.package.files.cxx.is_empty() {
            Compiler::C
        } else {
            Compiler::Cxx
        };
        self.base(compiler)
            .value_path("-o", out)
            .paths(objects)
            .args(ldflags.iter().cloned())
    }
}
