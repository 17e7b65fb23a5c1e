//! Action - one package build request.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};

use crate::core::package::Package;

/// Default name of the archive the compiler writes into the object directory.
pub const ARCHIVE_NAME: &str = "_pkg_.a";

/// A single package build: what to build and where its intermediate files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Package to build
    pub package: Package,

    /// Object (staging) directory. Generated file names are joined onto it.
    pub objdir: PathBuf,

    /// Import configuration mapping import paths to built archives
    #[serde(default)]
    pub importcfg: Option<PathBuf>,
}

impl Action {
    /// Create a new action.
    pub fn new(package: Package, objdir: impl Into<PathBuf>) -> Self {
        Action {
            package,
            objdir: objdir.into(),
            importcfg: None,
        }
    }

    /// Set the import configuration file.
    pub fn with_importcfg(mut self, importcfg: impl Into<PathBuf>) -> Self {
        self.importcfg = Some(importcfg.into());
        self
    }

    /// Path of a file inside the object directory.
    pub fn obj(&self, name: impl AsRef<Path>) -> PathBuf {
        self.objdir.join(name)
    }

    /// Path of the package archive inside the object directory.
    pub fn archive(&self) -> PathBuf {
        self.obj(ARCHIVE_NAME)
    }

    /// The package path the compiler records for this package.
    ///
    /// Commands are always compiled as `main`.
    pub fn pkg_path(&self) -> &str {
        if self.package.is_main() {
            "main"
        } else {
            &self.package.import_path
        }
    }

    /// The directory name compiled output reports in place of the package directory.
    ///
    /// `<module>[@<version>]<rest of import path>` for module packages, the
    /// plain import path otherwise.
    pub fn rewrite_dir(&self) -> String {
        let p = &self.package;
        match p.module_path.as_deref().filter(|m| !m.is_empty()) {
            Some(m) => {
                let rest = p.import_path.strip_prefix(m).unwrap_or(&p.import_path);
                match p.module_version.as_deref().filter(|v| !v.is_empty()) {
                    Some(v) => format!("{m}@{v}{rest}"),
                    None => format!("{m}{rest}"),
                }
            }
            None => p.import_path.clone(),
        }
    }

    /// The `-trimpath` argument used for every tool invocation of this action.
    ///
    /// The package directory is rewritten to [`Action::rewrite_dir`] and the
    /// object directory is removed entirely.
    pub fn trimpath(&self) -> String {
        self.trimpath_rule(true)
    }

    /// The `-trimpath` argument with the package directory rewrite only when
    /// `trim_package_dir` is set. The object directory is always removed.
    pub fn trimpath_rule(&self, trim_package_dir: bool) -> String {
        let mut objdir = self.objdir.to_string_lossy().into_owned();
        if objdir.len() > 1 && objdir.ends_with(MAIN_SEPARATOR) {
            objdir.pop();
        }

        if trim_package_dir {
            format!(
                "{}=>{};{}=>",
                self.package.dir.display(),
                self.rewrite_dir(),
                objdir
            )
        } else {
            format!("{objdir}=>")
        }
    }
}
