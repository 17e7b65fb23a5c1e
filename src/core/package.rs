//! Package - a resolved Go package and its classified source files.
//!
//! A Package is produced by the (external) resolution layer and handed to the
//! builder read-only. File names are relative to [`Package::dir`] unless they
//! are already absolute.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::error::BuildError;
use crate::util::fs::normalize_path;

/// The kind of a source file, i.e. which list of a [`Package`] it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Go,
    Cgo,
    C,
    Asm,
    Cxx,
    ObjC,
    Fortran,
    Syso,
}

impl SourceKind {
    /// Every kind, in the order the lists appear on a package.
    pub const ALL: [SourceKind; 8] = [
        SourceKind::Go,
        SourceKind::Cgo,
        SourceKind::C,
        SourceKind::Asm,
        SourceKind::Cxx,
        SourceKind::ObjC,
        SourceKind::Fortran,
        SourceKind::Syso,
    ];

    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Go => "go",
            SourceKind::Cgo => "cgo",
            SourceKind::C => "c",
            SourceKind::Asm => "asm",
            SourceKind::Cxx => "c++",
            SourceKind::ObjC => "objective-c",
            SourceKind::Fortran => "fortran",
            SourceKind::Syso => "syso",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source files of a package, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    /// Plain `.go` files (no `import "C"`)
    pub go: Vec<PathBuf>,
    /// `.go` files that import "C"
    pub cgo: Vec<PathBuf>,
    /// `.c` files
    pub c: Vec<PathBuf>,
    /// `.s` / `.S` files
    #[serde(alias = "s")]
    pub asm: Vec<PathBuf>,
    /// `.cc`, `.cpp`, `.cxx` files
    #[serde(alias = "cpp")]
    pub cxx: Vec<PathBuf>,
    /// `.m` files
    #[serde(alias = "m")]
    pub objc: Vec<PathBuf>,
    /// `.f`, `.F`, `.for`, `.f90` files
    #[serde(alias = "f")]
    pub fortran: Vec<PathBuf>,
    /// Precompiled `.syso` objects
    pub syso: Vec<PathBuf>,
}

impl SourceFiles {
    /// Get the file list for a kind.
    pub fn of(&self, kind: SourceKind) -> &[PathBuf] {
        match kind {
            SourceKind::Go => &self.go,
            SourceKind::Cgo => &self.cgo,
            SourceKind::C => &self.c,
            SourceKind::Asm => &self.asm,
            SourceKind::Cxx => &self.cxx,
            SourceKind::ObjC => &self.objc,
            SourceKind::Fortran => &self.fortran,
            SourceKind::Syso => &self.syso,
        }
    }

    /// Get the mutable file list for a kind.
    pub fn of_mut(&mut self, kind: SourceKind) -> &mut Vec<PathBuf> {
        match kind {
            SourceKind::Go => &mut self.go,
            SourceKind::Cgo => &mut self.cgo,
            SourceKind::C => &mut self.c,
            SourceKind::Asm => &mut self.asm,
            SourceKind::Cxx => &mut self.cxx,
            SourceKind::ObjC => &mut self.objc,
            SourceKind::Fortran => &mut self.fortran,
            SourceKind::Syso => &mut self.syso,
        }
    }

    /// Number of files that are not plain Go.
    ///
    /// When this is zero the compiler sees the whole package and may check
    /// forward declarations strictly.
    pub fn non_go_count(&self) -> usize {
        self.cgo.len()
            + self.c.len()
            + self.asm.len()
            + self.cxx.len()
            + self.objc.len()
            + self.fortran.len()
            + self.syso.len()
    }
}

/// Flags from `#cgo` directives in the package sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgoDirectives {
    pub cppflags: Vec<String>,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub fflags: Vec<String>,
    pub ldflags: Vec<String>,
}

/// Flags already obtained from pkg-config for the package's `#cgo pkg-config` lines.
///
/// These are passed through without inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkgConfigFlags {
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
}

/// A resolved Go package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    /// Package name from the `package` clause
    pub name: String,

    /// Directory containing the package sources
    pub dir: PathBuf,

    /// Import path
    pub import_path: String,

    /// Path of the module containing the package, if any
    pub module_path: Option<String>,

    /// Version of the module containing the package, if any
    pub module_version: Option<String>,

    /// Whether the package is part of the standard library
    pub standard: bool,

    /// Source files by kind
    pub files: SourceFiles,

    /// `#cgo` directive flags
    pub cgo: CgoDirectives,

    /// Resolved pkg-config flags
    pub pkg_config: PkgConfigFlags,
}

impl Package {
    /// Create a package with the given import path and directory.
    pub fn new(import_path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let import_path = import_path.into();
        let name = import_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Package {
            name,
            dir: dir.into(),
            import_path,
            ..Package::default()
        }
    }

    /// Set the containing module.
    pub fn with_module(mut self, path: impl Into<String>, version: Option<&str>) -> Self {
        self.module_path = Some(path.into());
        self.module_version = version.map(str::to_string);
        self
    }

    /// Whether this is a `main` package.
    pub fn is_main(&self) -> bool {
        self.name == "main"
    }

    /// Whether the package has files that go through cgo.
    pub fn uses_cgo(&self) -> bool {
        !self.files.cgo.is_empty()
    }

    /// Whether this is the standard-library package with the given import path.
    pub fn is_standard(&self, import_path: &str) -> bool {
        self.standard && self.import_path == import_path
    }

    /// Resolve a package file against the package directory.
    pub fn abs(&self, file: &Path) -> PathBuf {
        self.dir.join(file)
    }

    /// Resolve a list of package files against the package directory.
    pub fn abs_all(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        files.iter().map(|f| self.abs(f)).collect()
    }

    /// Check that every source file appears in exactly one kind list.
    ///
    /// Files are compared by their normalized absolute path, so `a.go`,
    /// `./a.go` and `<dir>/a.go` are the same file.
    pub fn check_disjoint(&self) -> Result<(), BuildError> {
        let mut seen: HashMap<PathBuf, SourceKind> = HashMap::new();
        for kind in SourceKind::ALL {
            for file in self.files.of(kind) {
                if let Some(first) = seen.insert(normalize_path(&self.abs(file)), kind) {
                    return Err(BuildError::DuplicateSourceFile {
                        file: self.abs(file),
                        first,
                        second: kind,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.import_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_new_derives_name() {
        let pkg = Package::new("example.com/foo/bar", "/src/bar");
        assert_eq!(pkg.name, "bar");
        assert_eq!(pkg.dir, PathBuf::from("/src/bar"));
        assert!(!pkg.is_main());
        assert!(!pkg.uses_cgo());
    }

    #[test]
    fn test_non_go_count() {
        let mut pkg = Package::new("example.com/foo", "/src/foo");
        pkg.files.go = vec!["a.go".into(), "b.go".into()];
        assert_eq!(pkg.files.non_go_count(), 0);

        pkg.files.syso = vec!["rsrc.syso".into()];
        pkg.files.asm = vec!["x.s".into()];
        assert_eq!(pkg.files.non_go_count(), 2);
    }

    #[test]
    fn test_check_disjoint_ok() {
        let mut pkg = Package::new("example.com/foo", "/src/foo");
        pkg.files.go = vec!["a.go".into()];
        pkg.files.cgo = vec!["b.go".into()];
        pkg.files.c = vec!["c.c".into()];
        assert!(pkg.check_disjoint().is_ok());
    }

    #[test]
    fn test_check_disjoint_duplicate() {
        let mut pkg = Package::new("example.com/foo", "/src/foo");
        pkg.files.go = vec!["a.go".into()];
        pkg.files.cgo = vec!["a.go".into()];

        let err = pkg.check_disjoint().unwrap_err();
        match err {
            BuildError::DuplicateSourceFile {
                file,
                first,
                second,
            } => {
                assert_eq!(file, PathBuf::from("/src/foo/a.go"));
                assert_eq!(first, SourceKind::Go);
                assert_eq!(second, SourceKind::Cgo);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_check_disjoint_aliased_paths() {
        let mut pkg = Package::new("example.com/foo", "/src/foo");
        pkg.files.go = vec!["a.go".into()];
        pkg.files.cgo = vec!["/src/foo/a.go".into()];
        assert!(matches!(
            pkg.check_disjoint(),
            Err(BuildError::DuplicateSourceFile {
                first: SourceKind::Go,
                second: SourceKind::Cgo,
                ..
            })
        ));

        pkg.files.cgo = vec!["./sub/../a.go".into()];
        assert!(pkg.check_disjoint().is_err());

        pkg.files.cgo = vec!["/src/other/a.go".into()];
        assert!(pkg.check_disjoint().is_ok());
    }

    #[test]
    fn test_package_deserialize() {
        let pkg: Package = toml::from_str(
            r#"
name = "zlib"
dir = "/src/zlib"
import_path = "example.com/zlib"
module_path = "example.com/zlib"
module_version = "v1.3.0"

[files]
go = ["zlib.go"]
cgo = ["wrap.go"]
s = ["crc.s"]

[cgo]
ldflags = ["-lz"]
"#,
        )
        .unwrap();

        assert_eq!(pkg.name, "zlib");
        assert_eq!(pkg.module_version.as_deref(), Some("v1.3.0"));
        assert_eq!(pkg.files.asm, vec![PathBuf::from("crc.s")]);
        assert_eq!(pkg.cgo.ldflags, vec!["-lz"]);
        assert!(pkg.uses_cgo());
    }
}
