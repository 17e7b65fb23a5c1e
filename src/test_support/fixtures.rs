//! Test fixtures for common test scenarios.
//!
//! A [`PackageFixture`] lays a package out on disk in a temporary directory
//! and hands out the [`Action`] and [`Context`] to build it with.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::builder::context::Context;
use crate::core::action::Action;
use crate::core::package::{Package, SourceKind};

/// Go assembly as found in pure-Go packages.
pub const GO_ASM: &str = "#include \"textflag.h\"\n\nTEXT ·add(SB),NOSPLIT,$0-24\n\tRET\n";

/// GNU assembly acceptable to the C compiler.
pub const GAS_ASM: &str = ".text\n.globl helper\nhelper:\n\tret\n";

/// A context for a linux/amd64 target with a fake GOROOT.
pub fn test_context() -> Context {
    Context::new("/goroot", "linux", "amd64", "go")
}

/// A package laid out in a temporary directory.
#[derive(Debug)]
pub struct PackageFixture {
    tmp: TempDir,
    /// The package being built.
    pub package: Package,
}

impl PackageFixture {
    /// Create an empty package with the given import path.
    pub fn new(import_path: &str) -> Self {
        let tmp = TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let dir = tmp.path().join("src");
        std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("failed to create src: {e}"));
        PackageFixture {
            package: Package::new(import_path, dir),
            tmp,
        }
    }

    /// Add a source file of the given kind with the given contents.
    pub fn file(mut self, kind: SourceKind, name: &str, contents: &str) -> Self {
        let path = self.package.dir.join(name);
        std::fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        self.package.files.of_mut(kind).push(PathBuf::from(name));
        self
    }

    /// Add a Go file.
    pub fn go(self, name: &str) -> Self {
        let contents = format!("package {}\n", self.package.name);
        self.file(SourceKind::Go, name, &contents)
    }

    /// Add a cgo file.
    pub fn cgo(self, name: &str) -> Self {
        let contents = format!("package {}\n\n// #include <stdio.h>\nimport \"C\"\n", self.package.name);
        self.file(SourceKind::Cgo, name, &contents)
    }

    /// Set the containing module.
    pub fn module(mut self, path: &str, version: Option<&str>) -> Self {
        self.package = self.package.with_module(path, version);
        self
    }

    /// Modify the package in place.
    pub fn with(mut self, f: impl FnOnce(&mut Package)) -> Self {
        f(&mut self.package);
        self
    }

    /// The object directory for builds of this fixture.
    pub fn objdir(&self) -> PathBuf {
        self.tmp.path().join("work").join("b001")
    }

    /// Path of a file in the object directory.
    pub fn obj(&self, name: &str) -> PathBuf {
        self.objdir().join(name)
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// The action building this package.
    pub fn action(&self) -> Action {
        let objdir = self.objdir();
        std::fs::create_dir_all(&objdir)
            .unwrap_or_else(|e| panic!("failed to create objdir: {e}"));
        Action::new(self.package.clone(), objdir)
            .with_importcfg(self.tmp.path().join("work").join("importcfg"))
    }
}
