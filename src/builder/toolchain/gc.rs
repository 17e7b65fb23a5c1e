//! The standard Go toolchain (`go tool compile`, `asm`, `pack`, `link`).

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::command::CommandSpec;
use crate::builder::context::Context;
use crate::builder::error::BuildError;
use crate::builder::executor::Executor;
use crate::core::action::Action;

use super::{
    go_tool, object_for, target_defines, GoCompileInput, Toolchain, ToolchainFamily, ASM_HEADER,
    GO_OBJECT, SYMABIS, TRIMPATH_GOROOT_FINAL,
};

/// The gc toolchain.
#[derive(Debug, Clone, Default)]
pub struct GcToolchain {
    /// Whether GOROOT is hidden from linked binaries
    pub trimpath: bool,
}

impl GcToolchain {
    /// Create a new gc toolchain.
    pub fn new(trimpath: bool) -> Self {
        GcToolchain { trimpath }
    }

    /// Arguments shared by every assembler invocation.
    fn asm_command(&self, ctx: &Context, a: &Action) -> CommandSpec {
        // -I <goroot>/pkg/include so #include "textflag.h" works in .s files.
        go_tool(ctx, "asm")
            .value("-p", a.pkg_path())
            .value("-trimpath", a.trimpath_rule(self.trimpath))
            .value_path("-I", &a.objdir)
            .value_path("-I", ctx.include_dir())
            .args(target_defines(ctx))
    }
}

impl Toolchain for GcToolchain {
    fn family(&self) -> ToolchainFamily {
        ToolchainFamily::Gc
    }

    fn symabis(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Option<PathBuf>> {
        if sfiles.is_empty() {
            return Ok(None);
        }

        let symabis = a.obj(SYMABIS);
        let cmd = self
            .asm_command(ctx, a)
            .arg("-gensymabis")
            .value_path("-o", &symabis)
            .paths(a.package.abs_all(sfiles));

        // -gensymabis only needs go_asm.h to exist, not its definitions.
        exec.write_file(&a.obj(ASM_HEADER), b"")?;
        exec.run(a, &cmd)?;

        Ok(Some(symabis))
    }

    fn gc(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        input: &GoCompileInput<'_>,
    ) -> Result<PathBuf> {
        let p = &a.package;
        let ofile = match input.archive {
            Some(archive) => archive.to_path_buf(),
            None => a.obj(GO_OBJECT),
        };

        let mut gcargs = vec!["-p".to_string(), a.pkg_path().to_string()];

        // The compiler sees the whole package, so it can report missing
        // bodies and forward declarations properly.
        if p.files.non_go_count() == 0 {
            gcargs.push("-complete".to_string());
        }
        if ctx.goos == "plan9" || ctx.goarch == "wasm" {
            gcargs.push("-dwarf=false".to_string());
        }
        if let Some(version) = ctx.go_version.as_deref().filter(|v| v.starts_with("go1")) {
            gcargs.push("-goversion".to_string());
            gcargs.push(version.to_string());
        }
        if let Some(symabis) = input.symabis {
            gcargs.push("-symabis".to_string());
            gcargs.push(symabis.to_string_lossy().into_owned());
        }

        let mut cmd = go_tool(ctx, "compile")
            .value_path("-o", &ofile)
            .value("-trimpath", a.trimpath_rule(self.trimpath))
            .args(gcargs);

        if let Some(importcfg) = input.importcfg {
            cmd = cmd.value_path("-importcfg", importcfg);
        }
        if input.archive == Some(ofile.as_path()) {
            cmd = cmd.arg("-pack");
        }
        if input.asmhdr {
            cmd = cmd.value_path("-asmhdr", a.obj(ASM_HEADER));
        }
        cmd = cmd.paths(p.abs_all(input.gofiles));

        exec.run(a, &cmd)?;
        Ok(ofile)
    }

    fn cc(
        &self,
        _ctx: &Context,
        _exec: &dyn Executor,
        a: &Action,
        _ofile: &Path,
        cfile: &Path,
    ) -> Result<()> {
        Err(BuildError::CSourceWithoutCgo {
            file: a.package.abs(cfile),
        }
        .into())
    }

    fn asm(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        sfiles: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let base = self.asm_command(ctx, a);
        let mut ofiles = Vec::with_capacity(sfiles.len());

        for sfile in sfiles {
            let ofile = object_for(a, sfile);
            let cmd = base
                .clone()
                .value_path("-o", &ofile)
                .path(a.package.abs(sfile));
            exec.run(a, &cmd)?;
            ofiles.push(ofile);
        }

        Ok(ofiles)
    }

    fn pack(
        &self,
        ctx: &Context,
        exec: &dyn Executor,
        a: &Action,
        afile: &Path,
        ofiles: &[PathBuf],
    ) -> Result<()> {
        let cmd = go_tool(ctx, "pack")
            .arg("r")
            .path(a.objdir.join(afile))
            .paths(ofiles.iter().map(|f| a.objdir.join(f)));

        exec.run(a, &cmd)
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
        let mut cmd = go_tool(ctx, "link")
            .value_path("-o", out)
            .value_path("-importcfg", importcfg);

        let ldflags = &a.package.cgo.ldflags;
        if !ldflags.is_empty() {
            cmd = cmd.value("-extldflags", ldflags.join(" "));
        }
        cmd = cmd.path(mainpkg);

        if self.trimpath {
            cmd = cmd.env("GOROOT_FINAL", TRIMPATH_GOROOT_FINAL);
        }

        exec.run(a, &cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::SourceKind;
    use crate::test_support::{test_context, PackageFixture, RecordingExecutor, GO_ASM};

    fn fixture() -> PackageFixture {
        PackageFixture::new("example.com/foo/bar")
            .module("example.com/foo", Some("v1.2.0"))
            .go("bar.go")
    }

    #[test]
    fn test_gc_writes_archive_with_pack() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();
        let archive = a.archive();
        let importcfg = a.importcfg.clone().unwrap();

        let ofile = GcToolchain::new(true)
            .gc(
                &test_context(),
                &exec,
                &a,
                &GoCompileInput {
                    importcfg: Some(&importcfg),
                    archive: Some(&archive),
                    symabis: None,
                    asmhdr: false,
                    gofiles: &a.package.files.go,
                },
            )
            .unwrap();

        assert_eq!(ofile, archive);
        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        let cmd = &calls[0];
        assert_eq!(cmd.args[..2], ["tool", "compile"]);
        assert_eq!(cmd.flag_value("-o"), Some(archive.to_str().unwrap()));
        assert_eq!(cmd.flag_value("-trimpath"), Some(a.trimpath().as_str()));
        assert_eq!(cmd.flag_value("-p"), Some("example.com/foo/bar"));
        assert_eq!(cmd.flag_value("-importcfg"), Some(importcfg.to_str().unwrap()));
        assert!(cmd.has_arg("-complete"));
        assert!(cmd.has_arg("-pack"));
        assert!(!cmd.has_arg("-asmhdr"));
        assert_eq!(
            cmd.args.last().map(String::as_str),
            fx.package.dir.join("bar.go").to_str()
        );
    }

    #[test]
    fn test_gc_without_archive_writes_object() {
        let fx = fixture().file(SourceKind::Asm, "add_amd64.s", GO_ASM);
        let a = fx.action();
        let exec = RecordingExecutor::new();
        let symabis = a.obj(SYMABIS);
        let ctx = test_context().with_go_version("go1.21.3");

        let ofile = GcToolchain::new(true)
            .gc(
                &ctx,
                &exec,
                &a,
                &GoCompileInput {
                    importcfg: None,
                    archive: None,
                    symabis: Some(&symabis),
                    asmhdr: true,
                    gofiles: &a.package.files.go,
                },
            )
            .unwrap();

        assert_eq!(ofile, a.obj(GO_OBJECT));
        let cmd = &exec.calls()[0];
        assert!(!cmd.has_arg("-complete"));
        assert!(!cmd.has_arg("-pack"));
        assert_eq!(cmd.flag_value("-goversion"), Some("go1.21.3"));
        assert_eq!(cmd.flag_value("-symabis"), symabis.to_str());
        assert_eq!(cmd.flag_value("-asmhdr"), a.obj(ASM_HEADER).to_str());
        assert_eq!(cmd.flag_value("-importcfg"), None);
    }

    #[test]
    fn test_gc_disables_dwarf_for_wasm() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();
        let ctx = Context::new("/goroot", "js", "wasm", "go").with_go_version("devel +abc");

        GcToolchain::new(true)
            .gc(
                &ctx,
                &exec,
                &a,
                &GoCompileInput {
                    importcfg: None,
                    archive: None,
                    symabis: None,
                    asmhdr: false,
                    gofiles: &a.package.files.go,
                },
            )
            .unwrap();

        let cmd = &exec.calls()[0];
        assert!(cmd.has_arg("-dwarf=false"));
        assert!(!cmd.has_arg("-goversion"));
    }

    #[test]
    fn test_cc_is_unsupported() {
        let fx = fixture().file(SourceKind::C, "helper.c", "int helper(void) { return 1; }\n");
        let a = fx.action();
        let exec = RecordingExecutor::new();

        let err = GcToolchain::new(true)
            .cc(
                &test_context(),
                &exec,
                &a,
                &a.obj("helper.o"),
                Path::new("helper.c"),
            )
            .unwrap_err();

        let err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(err, BuildError::CSourceWithoutCgo { .. }));
        assert!(err.to_string().ends_with("helper.c: C source files not supported without cgo"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_symabis_none_without_assembly() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();

        let symabis = GcToolchain::new(true)
            .symabis(&test_context(), &exec, &a, &[])
            .unwrap();

        assert_eq!(symabis, None);
        assert!(exec.calls().is_empty());
        assert!(exec.written().is_empty());
    }

    #[test]
    fn test_symabis_writes_placeholder_header_first() {
        let fx = fixture().file(SourceKind::Asm, "add_amd64.s", GO_ASM);
        let a = fx.action();
        let exec = RecordingExecutor::new();

        let symabis = GcToolchain::new(true)
            .symabis(&test_context(), &exec, &a, &a.package.files.asm)
            .unwrap();

        assert_eq!(symabis, Some(a.obj(SYMABIS)));
        assert_eq!(exec.written().get(&a.obj(ASM_HEADER)), Some(&Vec::new()));

        let cmd = &exec.calls()[0];
        assert_eq!(cmd.args[..2], ["tool", "asm"]);
        assert!(cmd.has_arg("-gensymabis"));
        assert!(cmd.has_arg("GOOS_linux"));
        assert!(cmd.has_arg("GOARCH_amd64"));
        assert!(cmd.has_arg("/goroot/pkg/include"));
        assert_eq!(cmd.flag_value("-o"), a.obj(SYMABIS).to_str());
    }

    #[test]
    fn test_symabis_write_failure_stops_scan() {
        let fx = fixture().file(SourceKind::Asm, "add_amd64.s", GO_ASM);
        let a = fx.action();
        let exec = RecordingExecutor::new().fail_writes();

        let err = GcToolchain::new(true)
            .symabis(&test_context(), &exec, &a, &a.package.files.asm)
            .unwrap_err();

        assert!(err.to_string().contains("go_asm.h"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_asm_one_invocation_per_file() {
        let fx = fixture()
            .file(SourceKind::Asm, "a_amd64.s", GO_ASM)
            .file(SourceKind::Asm, "b_amd64.s", GO_ASM);
        let a = fx.action();
        let exec = RecordingExecutor::new();

        let ofiles = GcToolchain::new(true)
            .asm(&test_context(), &exec, &a, &a.package.files.asm)
            .unwrap();

        assert_eq!(ofiles, vec![a.obj("a_amd64.o"), a.obj("b_amd64.o")]);
        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].flag_value("-o"), a.obj("b_amd64.o").to_str());
        assert_eq!(
            calls[1].args.last().map(String::as_str),
            fx.package.dir.join("b_amd64.s").to_str()
        );
    }

    #[test]
    fn test_pack_appends_objects() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();
        let objects = vec![a.obj("_go_.o"), PathBuf::from("x.o")];

        GcToolchain::new(true)
            .pack(&test_context(), &exec, &a, &a.archive(), &objects)
            .unwrap();

        let cmd = &exec.calls()[0];
        assert_eq!(cmd.args[..3], ["tool", "pack", "r"]);
        assert_eq!(cmd.args[3], a.archive().to_string_lossy());
        assert_eq!(cmd.args[5], a.obj("x.o").to_string_lossy());
    }

    #[test]
    fn test_ld_forwards_cgo_ldflags_and_goroot_final() {
        let fx = fixture().with(|p| p.cgo.ldflags = vec!["-lm".into(), "-lz".into()]);
        let a = fx.action();
        let exec = RecordingExecutor::new();

        GcToolchain::new(true)
            .ld(
                &test_context(),
                &exec,
                &a,
                Path::new("/out/bar"),
                Path::new("/work/importcfg.link"),
                &a.archive(),
            )
            .unwrap();

        let cmd = &exec.calls()[0];
        assert_eq!(cmd.args[..2], ["tool", "link"]);
        assert_eq!(cmd.flag_value("-o"), Some("/out/bar"));
        assert_eq!(cmd.flag_value("-importcfg"), Some("/work/importcfg.link"));
        assert_eq!(cmd.flag_value("-extldflags"), Some("-lm -lz"));
        assert_eq!(cmd.env_value("GOROOT_FINAL"), Some("go"));
    }

    #[test]
    fn test_gc_without_trimpath_keeps_package_dir() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();
        let tc = GcToolchain::new(false);

        tc.gc(
            &test_context(),
            &exec,
            &a,
            &GoCompileInput {
                importcfg: None,
                archive: None,
                symabis: None,
                asmhdr: false,
                gofiles: &a.package.files.go,
            },
        )
        .unwrap();
        tc.asm(&test_context(), &exec, &a, &[PathBuf::from("add_amd64.s")])
            .unwrap();

        let objdir_only = format!("{}=>", a.objdir.display());
        for cmd in exec.calls() {
            let rule = cmd.flag_value("-trimpath").unwrap();
            assert_eq!(rule, objdir_only);
            assert!(!rule.contains(&a.rewrite_dir()));
        }
    }

    #[test]
    fn test_ld_without_trimpath_keeps_goroot() {
        let fx = fixture();
        let a = fx.action();
        let exec = RecordingExecutor::new();

        GcToolchain::new(false)
            .ld(
                &test_context(),
                &exec,
                &a,
                Path::new("/out/bar"),
                Path::new("/work/importcfg.link"),
                &a.archive(),
            )
            .unwrap();

        let cmd = &exec.calls()[0];
        assert_eq!(cmd.env_value("GOROOT_FINAL"), None);
        assert_eq!(cmd.flag_value("-extldflags"), None);
    }
}
