//! The cgo step.
//!
//! Packages that `import "C"` are run through the cgo tool, which writes Go
//! files with the bindings and C files with the glue. The glue and all of
//! the package's foreign sources are compiled with the C toolchain into
//! `_x%03d.o` objects that later go into the package archive.

mod compile;
mod flags;
mod ldflag;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::builder::command::CommandSpec;
use crate::builder::context::{BuildMode, Context};
use crate::builder::error::BuildError;
use crate::builder::executor::Executor;
use crate::builder::security::check_linker_flags;
use crate::builder::toolchain::{go_tool, Toolchain, ToolchainFamily};
use crate::core::action::Action;
use crate::core::package::Package;

pub use compile::{arch_flags, CCommands, Compiler, TRIMMED_OBJDIR};
pub use flags::{go_quote, CgoFlags, CGO_LDFLAGS_ORIGIN};
pub use ldflag::{remove_expected, scan_ldflags, CGO_LDFLAG_DIRECTIVE};

/// Go file cgo writes with the package's type definitions.
pub const GOTYPES_GO: &str = "_cgo_gotypes.go";
/// C file cgo writes for functions exported to C.
pub const EXPORT_C: &str = "_cgo_export.c";
/// Go file with the package's dynamic imports (gc only).
pub const IMPORT_GO: &str = "_cgo_import.go";
/// C stub used to discover dynamic imports (gc only).
pub const MAIN_C: &str = "_cgo_main.c";
/// Object linked from [`MAIN_C`] and the bridge objects.
pub const DYNIMPORT_OBJ: &str = "_cgo_.o";
/// C file with function definitions for gccgo.
pub const DEFUN_C: &str = "_cgo_defun.c";
/// Linker flags cgo records for gccgo.
pub const FLAGS_FILE: &str = "_cgo_flags";
/// Header for C code calling exported functions.
pub const INSTALL_H: &str = "_cgo_install.h";

/// Origin reported for flags found in generated files.
pub const CGO_LDFLAG_ORIGIN: &str = "go:cgo_ldflag";

/// Files produced by the cgo step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgoOutput {
    /// Generated Go files to compile with the package
    pub gofiles: Vec<PathBuf>,
    /// Objects to add to the package archive
    pub objects: Vec<PathBuf>,
}

/// Foreign sources handed to the C toolchain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignSources<'a> {
    /// C files and assembly files for the C compiler
    pub gcc: &'a [PathBuf],
    pub cxx: &'a [PathBuf],
    pub objc: &'a [PathBuf],
    pub fortran: &'a [PathBuf],
}

/// Reject assembly files written for the Go assembler.
///
/// In a cgo package `.s` files go to the C compiler, which cannot assemble
/// Go assembly. Files that cannot be read are left to the C compiler to
/// report.
pub fn check_go_assembly(p: &Package, sfiles: &[PathBuf]) -> Result<(), BuildError> {
    for sfile in sfiles {
        let Ok(data) = crate::util::fs::read(&p.abs(sfile)) else {
            continue;
        };
        if is_go_assembly(&data) {
            return Err(BuildError::GoAssemblyInCgoPackage {
                file: sfile.clone(),
            });
        }
    }
    Ok(())
}

fn is_go_assembly(data: &[u8]) -> bool {
    ["TEXT", "DATA", "GLOBL"].iter().any(|directive| {
        data.starts_with(directive.as_bytes())
            || data
                .windows(directive.len() + 1)
                .any(|w| w[0] == b'\n' && &w[1..] == directive.as_bytes())
    })
}

/// Runs the cgo step for one action.
pub struct CgoStep<'a> {
    ctx: &'a Context,
    mode: &'a BuildMode,
    exec: &'a dyn Executor,
    toolchain: &'a dyn Toolchain,
}

impl<'a> CgoStep<'a> {
    pub fn new(
        ctx: &'a Context,
        mode: &'a BuildMode,
        exec: &'a dyn Executor,
        toolchain: &'a dyn Toolchain,
    ) -> Self {
        CgoStep {
            ctx,
            mode,
            exec,
            toolchain,
        }
    }

    /// Run cgo on the package's cgo files and compile everything foreign.
    pub fn run(&self, a: &Action, sources: &ForeignSources<'_>) -> Result<CgoOutput> {
        let p = &a.package;
        let flags = CgoFlags::derive(
            a,
            self.mode,
            !sources.objc.is_empty(),
            !sources.fortran.is_empty(),
        )?;

        let cgofiles: Vec<PathBuf> = p.abs_all(&p.files.cgo);
        let mut gofiles = vec![a.obj(GOTYPES_GO)];
        let mut cfiles = vec![a.obj(EXPORT_C)];
        for file in &cgofiles {
            let base = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            gofiles.push(a.obj(format!("{base}.cgo1.go")));
            cfiles.push(a.obj(format!("{base}.cgo2.c")));
        }

        tracing::debug!("running cgo on {} files of {}", cgofiles.len(), p);
        self.exec.run(a, &self.cgo_command(a, &flags, &cgofiles))?;

        let commands = CCommands::new(self.ctx, self.mode, a);
        let mut objects = Vec::new();
        let mut seq = 0;
        let mut next_ofile = || {
            seq += 1;
            a.obj(format!("_x{seq:03}.o"))
        };

        let cflags = flags.c();
        let cxxflags = flags.cxx();
        let fflags = flags.fortran();
        let units = cfiles
            .iter()
            .chain(sources.gcc)
            .map(|f| (Compiler::C, &cflags, f))
            .chain(sources.cxx.iter().map(|f| (Compiler::Cxx, &cxxflags, f)))
            .chain(sources.objc.iter().map(|f| (Compiler::C, &cflags, f)))
            .chain(sources.fortran.iter().map(|f| (Compiler::Fortran, &fflags, f)));

        for (compiler, args, file) in units {
            let ofile = next_ofile();
            self.exec
                .run(a, &commands.compile(compiler, args, &ofile, file))?;
            objects.push(ofile);
        }

        match self.toolchain.family() {
            ToolchainFamily::Gc => {
                let import_go = self.dynimport(a, &commands, &cflags, &flags.ldflags, &objects)?;
                gofiles.push(import_go);
            }
            ToolchainFamily::Gccgo => {
                let defun_obj = a.obj("_cgo_defun.o");
                self.toolchain
                    .cc(self.ctx, self.exec, a, &defun_obj, &a.obj(DEFUN_C))?;
                objects.push(defun_obj);
            }
        }

        if self.toolchain.family() == ToolchainFamily::Gc && !self.mode.dry_run {
            self.check_generated_ldflags(&gofiles, &flags.ldflags)?;
        }

        Ok(CgoOutput { gofiles, objects })
    }

    /// `go tool cgo -objdir ... -- <cppflags> <cflags> <files>`.
    fn cgo_command(&self, a: &Action, flags: &CgoFlags, cgofiles: &[PathBuf]) -> CommandSpec {
        let p = &a.package;
        let mut cgoflags = Vec::new();

        if p.is_standard("runtime/cgo") {
            cgoflags.push("-import_runtime_cgo=false".to_string());
        }
        if ["runtime/race", "runtime/msan", "runtime/cgo"]
            .iter()
            .any(|path| p.is_standard(path))
        {
            cgoflags.push("-import_syscall=false".to_string());
        }
        if self.toolchain.family() == ToolchainFamily::Gccgo {
            cgoflags.push("-gccgo".to_string());
            if !p.is_main() {
                cgoflags.push(format!("-gccgopkgpath={}", p.import_path));
            }
        }
        if self.mode.output.exports_to_c() {
            cgoflags.push(format!("-exportheader={}", a.obj(INSTALL_H).display()));
        }

        // cgo writes //line directives naming its inputs; point them back at
        // the real files when the inputs come from the overlay.
        let mut inputs = Vec::with_capacity(cgofiles.len());
        let mut rewrites = Vec::new();
        for file in cgofiles {
            match self.mode.overlay.overlay_path(file) {
                Some(opath) => {
                    rewrites.push(format!("{}=>{}", opath.display(), file.display()));
                    inputs.push(opath.to_path_buf());
                }
                None => inputs.push(file.clone()),
            }
        }
        if !rewrites.is_empty() {
            cgoflags.push("-trimpath".to_string());
            cgoflags.push(rewrites.join(";"));
        }

        let mut cmd = go_tool(self.ctx, "cgo")
            .value_path("-objdir", &a.objdir)
            .value("-importpath", &p.import_path)
            .args(cgoflags)
            .arg("--")
            .args(flags.cppflags.iter().cloned())
            .args(flags.cflags.iter().cloned())
            .paths(inputs)
            .cwd(&p.dir)
            .env("TERM", "dumb")
            .env("CC", self.mode.cgo.cc.to_string_lossy());
        if let Some(ldflags) = flags.ldflags_env() {
            cmd = cmd.env("CGO_LDFLAGS", ldflags);
        }
        cmd
    }

    /// Produce `_cgo_import.go` with the package's dynamic imports.
    fn dynimport(
        &self,
        a: &Action,
        commands: &CCommands<'_>,
        cflags: &[String],
        ldflags: &[String],
        objects: &[PathBuf],
    ) -> Result<PathBuf> {
        let p = &a.package;
        let main_obj = a.obj("_cgo_main.o");
        self.exec
            .run(a, &commands.compile(Compiler::C, cflags, &main_obj, &a.obj(MAIN_C)))?;

        let mut linkobj = vec![main_obj];
        linkobj.extend(objects.iter().cloned());
        linkobj.extend(p.abs_all(&p.files.syso));

        let dynobj = a.obj(DYNIMPORT_OBJ);
        let ldflags = self.dynimport_ldflags(ldflags);
        self.exec.run(a, &commands.link(&dynobj, &linkobj, &ldflags))?;

        let import_go = a.obj(IMPORT_GO);
        let mut cmd = go_tool(self.ctx, "cgo")
            .value("-dynpackage", &p.name)
            .value_path("-dynimport", &dynobj)
            .value_path("-dynout", &import_go)
            .env("TERM", "dumb");
        if p.is_standard("runtime/cgo") {
            cmd = cmd.arg("-dynlinker");
        }
        self.exec.run(a, &cmd)?;

        Ok(import_go)
    }

    /// Linker flags for `_cgo_.o`.
    ///
    /// linux/arm and android link it as PIE so imported symbols resolve
    /// accurately; `-static` cannot be combined with that.
    fn dynimport_ldflags(&self, ldflags: &[String]) -> Vec<String> {
        let ctx = self.ctx;
        let mut ldflags = ldflags.to_vec();
        if (ctx.goarch == "arm" && ctx.goos == "linux") || ctx.goos == "android" {
            if !ldflags.iter().any(|f| f == "-no-pie") {
                ldflags.push("-pie".to_string());
            }
            if ldflags.iter().any(|f| f == "-pie") {
                ldflags.retain(|f| f != "-static");
            }
        }
        ldflags
    }

    /// Check the `//go:cgo_ldflag` directives cgo wrote.
    ///
    /// The flags that came from `CGO_LDFLAGS` are expected to be there; any
    /// others must pass the allow-list.
    fn check_generated_ldflags(&self, gofiles: &[PathBuf], ldflags: &[String]) -> Result<()> {
        let mut flags = Vec::new();
        for file in gofiles.iter().filter(|f| is_cgo_generated(f)) {
            let src = crate::util::fs::read_to_string(file)
                .context("checking cgo linker flags")?;
            flags.extend(scan_ldflags(&src));
        }

        if !remove_expected(&mut flags, ldflags) && !ldflags.is_empty() {
            tracing::debug!("CGO_LDFLAGS not found among generated linker flags");
        }
        check_linker_flags(CGO_LDFLAG_ORIGIN, &flags, &self.mode.cgo)?;
        Ok(())
    }
}

/// Whether the compiler accepts `//go:cgo_*` directives in `file`.
fn is_cgo_generated(file: &Path) -> bool {
    file.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with("_cgo_"))
}
