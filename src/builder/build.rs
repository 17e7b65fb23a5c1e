//! Package build orchestration.
//!
//! A package build runs, in order: cgo (when the package imports "C"), the
//! symbol ABI scan, the Go compiler, the C compiler for each C file, the
//! assembler, and finally the packer. The first failing stage ends the build.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::cgo::{check_go_assembly, CgoStep, ForeignSources, FLAGS_FILE};
use crate::builder::context::{BuildMode, Context};
use crate::builder::executor::Executor;
use crate::builder::toolchain::{object_for, GoCompileInput, Toolchain, ToolchainFamily};
use crate::core::action::Action;

/// Result of building one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// The package archive
    pub archive: PathBuf,
    /// Objects packed into the archive, in order
    pub objects: Vec<PathBuf>,
    /// Go files generated by cgo and compiled with the package
    pub generated_go: Vec<PathBuf>,
}

/// Builds single packages with one toolchain.
pub struct PackageBuilder<'a> {
    ctx: &'a Context,
    mode: &'a BuildMode,
    exec: &'a dyn Executor,
    toolchain: &'a dyn Toolchain,
}

impl<'a> PackageBuilder<'a> {
    /// Create a new package builder.
    pub fn new(
        ctx: &'a Context,
        mode: &'a BuildMode,
        exec: &'a dyn Executor,
        toolchain: &'a dyn Toolchain,
    ) -> Self {
        PackageBuilder {
            ctx,
            mode,
            exec,
            toolchain,
        }
    }

    /// Build the package of `a` into its archive.
    pub fn build(&self, a: &Action) -> Result<BuildOutput> {
        let p = &a.package;
        p.check_disjoint()?;

        tracing::info!("Building {} with {}", p, self.toolchain.family());

        let mut gofiles = p.files.go.clone();
        let mut cfiles = p.files.c.clone();
        let mut sfiles = p.files.asm.clone();
        let mut cgo_objects = Vec::new();
        let mut generated_go = Vec::new();

        if p.uses_cgo() {
            // The C toolchain compiles C and assembly files of cgo packages.
            check_go_assembly(p, &sfiles)?;
            let mut gccfiles = std::mem::take(&mut cfiles);
            gccfiles.append(&mut sfiles);

            let out = CgoStep::new(self.ctx, self.mode, self.exec, self.toolchain).run(
                a,
                &ForeignSources {
                    gcc: &gccfiles,
                    cxx: &p.files.cxx,
                    objc: &p.files.objc,
                    fortran: &p.files.fortran,
                },
            )?;

            if self.toolchain.family() == ToolchainFamily::Gccgo {
                cgo_objects.push(a.obj(FLAGS_FILE));
            }
            cgo_objects.extend(out.objects);
            gofiles.extend(out.gofiles.iter().cloned());
            generated_go = out.gofiles;
        }

        let symabis = self.toolchain.symabis(self.ctx, self.exec, a, &sfiles)?;

        let archive = a.archive();
        let mut objects = Vec::new();
        tracing::debug!("compiling {} Go files", gofiles.len());
        let ofile = self.toolchain.gc(
            self.ctx,
            self.exec,
            a,
            &GoCompileInput {
                importcfg: a.importcfg.as_deref(),
                archive: Some(&archive),
                symabis: symabis.as_deref(),
                asmhdr: !sfiles.is_empty(),
                gofiles: &gofiles,
            },
        )?;
        if ofile != archive {
            objects.push(ofile);
        }

        for cfile in &cfiles {
            let ofile = object_for(a, cfile);
            self.toolchain.cc(self.ctx, self.exec, a, &ofile, cfile)?;
            objects.push(ofile);
        }

        if !sfiles.is_empty() {
            objects.extend(self.toolchain.asm(self.ctx, self.exec, a, &sfiles)?);
        }

        // On Windows the C objects must come after the Go objects.
        objects.append(&mut cgo_objects);
        objects.extend(p.abs_all(&p.files.syso));

        // A compiler that wrote the archive itself leaves nothing to pack
        // for a pure Go package.
        if !objects.is_empty() {
            tracing::debug!("packing {} objects into {}", objects.len(), archive.display());
            self.toolchain
                .pack(self.ctx, self.exec, a, &archive, &objects)?;
        }

        Ok(BuildOutput {
            archive,
            objects,
            generated_go,
        })
    }

    /// Link an executable from the main package archive.
    pub fn link(&self, a: &Action, out: &Path, importcfg: &Path, mainpkg: &Path) -> Result<()> {
        tracing::info!("Linking {}", out.display());
        self.toolchain
            .ld(self.ctx, self.exec, a, out, importcfg, mainpkg)
    }
}
