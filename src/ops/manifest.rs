//! Action manifests.
//!
//! An action manifest is a TOML file describing one package build: the
//! package, its source files and the object directory to build it in.
//!
//! ```toml
//! objdir = "work/b001"
//! importcfg = "work/importcfg"
//!
//! [package]
//! name = "zlib"
//! dir = "src/zlib"
//! import_path = "example.com/foo/zlib"
//! module_path = "example.com/foo"
//! module_version = "v1.0.0"
//!
//! [package.files]
//! go = ["zlib.go"]
//! cgo = ["cgo.go"]
//! ```
//!
//! Relative paths are resolved against the directory of the manifest.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::action::Action;

/// Load the action described by the manifest at `path`.
pub fn load_action(path: &Path) -> Result<Action> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read action manifest: {}", path.display()))?;

    let mut action: Action = toml::from_str(&contents)
        .with_context(|| format!("failed to parse action manifest: {}", path.display()))?;

    if action.package.import_path.is_empty() {
        bail!(
            "action manifest {} has no `import_path` under [package]",
            path.display()
        );
    }
    if action.package.name.is_empty() {
        action.package.name = action
            .package
            .import_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
    }

    let base = path.parent().unwrap_or(Path::new(""));
    action.package.dir = resolve(base, &action.package.dir);
    action.objdir = resolve(base, &action.objdir);
    action.importcfg = action.importcfg.map(|cfg| resolve(base, &cfg));

    tracing::debug!(
        "loaded action for {} from {}",
        action.package,
        path.display()
    );
    Ok(action)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
