//! The GCC Go front end.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::builder::cgo::TRIMMED_OBJDIR;
use crate::builder::command::CommandSpec;
use crate::builder::context::Context;
use crate::builder::executor::Executor;
use crate::core::action::Action;

use super::{object_for, target_defines, GoCompileInput, Toolchain, ToolchainFamily, GO_OBJECT};

/// The gccgo toolchain.
#[derive(Debug, Clone)]
pub struct GccgoToolchain {
    /// The gccgo driver
    pub gccgo: PathBuf,
    /// C compiler for `.c` files
    pub cc: PathBuf,
    /// Archiver
    pub ar: PathBuf,
    /// Whether source paths are rewritten in debug info
    pub trimpath: bool,
}

impl GccgoToolchain {
    /// Create a new gccgo toolchain.
    pub fn new(
        gccgo: impl Into<PathBuf>,
        cc: impl Into<PathBuf>,
        ar: impl Into<PathBuf>,
        trimpath: bool,
    ) -> Self {
        GccgoToolchain {
            gccgo: gccgo.into(),
            cc: cc.into(),
            ar: ar.into(),
            trimpath,
        }
    }

    /// `-ffile-prefix-map` arguments equivalent to the action's trimpath rule.
    ///
    /// The object directory is always mapped away; the package directory
    /// only when trimming paths.
    fn prefix_maps(&self, a: &Action) -> Vec<String> {
        let mut maps = Vec::with_capacity(2);
        if self.trimpath {
            maps.push(format!(
                "-ffile-prefix-map={}={}",
                a.package.dir.display(),
                a.rewrite_dir()
            ));
        }
        maps.push(format!(
            "-ffile-prefix-map={}={}",
            a.objdir.display(),
            TRIMMED_OBJDIR
        ));
        maps
    }
}

/// Archives named by `packagefile` lines of an import configuration, in order.
pub(crate) fn packagefiles(importcfg: &str) -> Vec<PathBuf> {
    importcfg
        .lines()
        .filter_map(|line| line.trim().strip_prefix("packagefile "))
        .filter_map(|rest| rest.split_once('='))
        .map(|(_, file)| PathBuf::from(file.trim()))
        .collect()
}

impl Toolchain for GccgoToolchain {
    fn family(&self) -> ToolchainFamily {
        ToolchainFamily::Gccgo
    }

    fn symabis(
        &self,
        _ctx: &Context,
        _exec: &dyn Executor,
        _a: &Action,
        _sfiles: &[PathBuf],
    ) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    fn gc(
        &self,
        _ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        input: &GoCompileInput<'_>,
    ) -> Result<PathBuf> {
        let ofile = a.obj(GO_OBJECT);

        let mut cmd = CommandSpec::new(&self.gccgo).arg("-c").arg("-g");
        if !a.package.is_main() {
            cmd = cmd.arg(format!("-fgo-pkgpath={}", a.package.import_path));
        }
        if let Some(importcfg) = input.importcfg {
            cmd = cmd.arg(format!("-fgo-importcfg={}", importcfg.display()));
        }
        cmd = cmd
            .args(self.prefix_maps(a))
            .value_path("-o", &ofile)
            .paths(a.package.abs_all(input.gofiles));

        exec.run(a, &cmd)?;
        Ok(ofile)
    }

    fn cc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        ofile: &Path,
        cfile: &Path,
    ) -> Result<()> {
        let cmd = CommandSpec::new(&self.cc)
            .arg("-Wall")
            .arg("-g")
            .value_path("-I", &a.objdir)
            .value_path("-I", ctx.include_dir())
            .value_path("-o", ofile)
            .args(target_defines(ctx))
            .args(self.prefix_maps(a))
            .arg("-c")
            .path(a.package.abs(cfile));

        exec.run(a, &cmd)
    }

    fn asm(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let mut ofiles = Vec::with_capacity(sfiles.len());
        for sfile in sfiles {
            let ofile = object_for(a, sfile);
            let cmd = CommandSpec::new(&self.gccgo)
                .arg("-xassembler-with-cpp")
                .value_path("-I", &a.objdir)
                .arg("-c")
                .value_path("-o", &ofile)
                .args(target_defines(ctx))
                .path(a.package.abs(sfile));
            exec.run(a, &cmd)?;
            ofiles.push(ofile);
        }
        Ok(ofiles)
    }

    fn pack(
        &self,
        _ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        afile: &Path,
        ofiles: &[PathBuf],
    ) -> Result<()> {
        let cmd = CommandSpec::new(&self.ar)
            .arg("rc")
            .path(a.objdir.join(afile))
            .paths(ofiles.iter().map(|f| a.objdir.join(f)));

        exec.run(a, &cmd)
    }

    fn ld(
        &self,
        _ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        out: &Path,
        importcfg: &Path,
        mainpkg: &Path,
    ) -> Result<()> {
        let cfg = crate::util::fs::read_to_string(importcfg)
            .with_context(|| format!("reading import configuration for {}", a.package))?;
        let archives = packagefiles(&cfg);
        tracing::debug!("linking {} against {} archives", a.package, archives.len());

        let cmd = CommandSpec::new(&self.gccgo)
            .value_path("-o", out)
            .path(mainpkg)
            .arg("-Wl,-(")
            .paths(archives)
            .arg("-Wl,-)")
            .args(a.package.cgo.ldflags.iter().cloned());

        exec.run(a, &cmd)
    }
}
