//! Source overlays.
//!
//! An overlay redirects reads of a cgo source file to another file on disk,
//! so editors and tools can build unsaved buffers. Other source kinds are
//! compiled from their original paths. The on-disk format is the
//! JSON document accepted by `go build -overlay`:
//!
//! ```json
//! { "Replace": { "/src/foo/a.go": "/tmp/edit/a.go" } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Map from original source paths to their replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(rename = "Replace", default)]
    replace: BTreeMap<PathBuf, PathBuf>,
}

impl Overlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Overlay::default()
    }

    /// Load an overlay from its JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read overlay file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse overlay file: {}", path.display()))
    }

    /// Add a replacement.
    pub fn replace(mut self, path: impl Into<PathBuf>, with: impl Into<PathBuf>) -> Self {
        self.replace.insert(path.into(), with.into());
        self
    }

    /// The replacement for `path`, if it is overlaid.
    pub fn overlay_path(&self, path: &Path) -> Option<&Path> {
        self.replace.get(path).map(PathBuf::as_path)
    }

}
