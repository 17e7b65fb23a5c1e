//! Configuration file support for gobuild.
//!
//! gobuild supports two configuration file locations:
//! - Global: `~/.gobuild/config.toml` - User-wide defaults
//! - Project: `.gobuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and the usual Go
//! environment variables (GOROOT, CC, CGO_CFLAGS, ...) take precedence over
//! both.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::builder::context::{BuildMode, CgoEnv, Context, OutputMode};
use crate::builder::toolchain::ToolchainFamily;
use crate::core::overlay::Overlay;
use crate::util::process::find_go_tool;

/// gobuild configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Go installation and target
    pub go: GoConfig,

    /// Build settings
    pub build: BuildConfig,

    /// C toolchain settings for cgo
    pub cgo: CgoConfig,
}

/// Go installation and target platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    /// Root of the Go installation
    pub goroot: Option<PathBuf>,

    /// Target operating system
    pub goos: Option<String>,

    /// Target architecture
    pub goarch: Option<String>,

    /// Path to the `go` command (default: `$GOROOT/bin/go`, then PATH)
    pub command: Option<PathBuf>,

    /// Version passed to the compiler (e.g. "go1.21.3")
    pub version: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Compiler suite (gc, gccgo)
    pub toolchain: Option<String>,

    /// Build mode (default, archive, c-archive, c-shared, exe, pie)
    pub buildmode: Option<String>,

    /// Rewrite file system paths in outputs (default: true)
    pub trimpath: Option<bool>,

    /// Build with the memory sanitizer
    #[serde(default)]
    pub msan: bool,

    /// JSON overlay file
    pub overlay: Option<PathBuf>,
}

/// C toolchain settings used by cgo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgoConfig {
    pub cc: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    pub fc: Option<PathBuf>,
    pub ar: Option<PathBuf>,
    pub gccgo: Option<PathBuf>,

    pub cppflags: Option<Vec<String>>,
    pub cflags: Option<Vec<String>>,
    pub cxxflags: Option<Vec<String>>,
    pub fflags: Option<Vec<String>>,
    pub ldflags: Option<Vec<String>>,

    /// Extra linker flags to accept (full-match regex)
    pub ldflags_allow: Option<String>,

    /// Linker flags to refuse even when otherwise allowed (full-match regex)
    pub ldflags_disallow: Option<String>,
}

/// Replace `slot` when `value` is set.
fn take<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        take(&mut self.go.goroot, other.go.goroot);
        take(&mut self.go.goos, other.go.goos);
        take(&mut self.go.goarch, other.go.goarch);
        take(&mut self.go.command, other.go.command);
        take(&mut self.go.version, other.go.version);

        take(&mut self.build.toolchain, other.build.toolchain);
        take(&mut self.build.buildmode, other.build.buildmode);
        take(&mut self.build.trimpath, other.build.trimpath);
        take(&mut self.build.overlay, other.build.overlay);
        if other.build.msan {
            self.build.msan = true;
        }

        take(&mut self.cgo.cc, other.cgo.cc);
        take(&mut self.cgo.cxx, other.cgo.cxx);
        take(&mut self.cgo.fc, other.cgo.fc);
        take(&mut self.cgo.ar, other.cgo.ar);
        take(&mut self.cgo.gccgo, other.cgo.gccgo);
        take(&mut self.cgo.cppflags, other.cgo.cppflags);
        take(&mut self.cgo.cflags, other.cgo.cflags);
        take(&mut self.cgo.cxxflags, other.cgo.cxxflags);
        take(&mut self.cgo.fflags, other.cgo.fflags);
        take(&mut self.cgo.ldflags, other.cgo.ldflags);
        take(&mut self.cgo.ldflags_allow, other.cgo.ldflags_allow);
        take(&mut self.cgo.ldflags_disallow, other.cgo.ldflags_disallow);
    }

    /// Apply environment overrides.
    ///
    /// `lookup` returns the value of an environment variable. Empty values
    /// count as unset. Flag variables are split on whitespace.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path = |key: &str| var(key).map(PathBuf::from);
        let list = |key: &str| {
            var(key).map(|v| v.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        };

        take(&mut self.go.goroot, path("GOROOT"));
        take(&mut self.go.goos, var("GOOS"));
        take(&mut self.go.goarch, var("GOARCH"));

        take(&mut self.cgo.cc, path("CC"));
        take(&mut self.cgo.cxx, path("CXX"));
        take(&mut self.cgo.fc, path("FC"));
        take(&mut self.cgo.ar, path("AR"));
        take(&mut self.cgo.gccgo, path("GCCGO"));
        take(&mut self.cgo.cppflags, list("CGO_CPPFLAGS"));
        take(&mut self.cgo.cflags, list("CGO_CFLAGS"));
        take(&mut self.cgo.cxxflags, list("CGO_CXXFLAGS"));
        take(&mut self.cgo.fflags, list("CGO_FFLAGS"));
        take(&mut self.cgo.ldflags, list("CGO_LDFLAGS"));
        take(&mut self.cgo.ldflags_allow, var("CGO_LDFLAGS_ALLOW"));
        take(&mut self.cgo.ldflags_disallow, var("CGO_LDFLAGS_DISALLOW"));
    }

    /// The toolchain environment described by this configuration.
    pub fn context(&self) -> Result<Context> {
        let go_tool = match self.go.command.clone() {
            Some(cmd) => cmd,
            None => find_go_tool(self.go.goroot.as_deref()).unwrap_or_else(|| {
                tracing::warn!("go command not found in GOROOT or PATH");
                PathBuf::from("go")
            }),
        };

        let goroot = match self.go.goroot.clone() {
            Some(root) => root,
            None => goroot_of(&go_tool).ok_or_else(|| {
                anyhow!("cannot determine GOROOT; set GOROOT or `goroot` under [go] in config")
            })?,
        };

        let mut ctx = Context::new(
            goroot,
            self.go.goos.as_deref().unwrap_or(Context::host_goos()),
            self.go.goarch.as_deref().unwrap_or(Context::host_goarch()),
            go_tool,
        );
        if let Some(version) = &self.go.version {
            ctx = ctx.with_go_version(version);
        }
        Ok(ctx)
    }

    /// The build mode described by this configuration.
    pub fn build_mode(&self) -> Result<BuildMode> {
        let toolchain = match self.build.toolchain.as_deref() {
            Some(name) => name.parse::<ToolchainFamily>()?,
            None => ToolchainFamily::default(),
        };
        let output = match self.build.buildmode.as_deref() {
            Some(mode) => mode.parse::<OutputMode>().map_err(|e| anyhow!(e))?,
            None => OutputMode::default(),
        };
        let overlay = match &self.build.overlay {
            Some(path) => Overlay::load(path)?,
            None => Overlay::default(),
        };

        Ok(BuildMode {
            toolchain,
            msan: self.build.msan,
            dry_run: false,
            trimpath: self.build.trimpath.unwrap_or(true),
            output,
            overlay,
            cgo: self.cgo_env(),
        })
    }

    /// C toolchain settings, with defaults for anything unset.
    pub fn cgo_env(&self) -> CgoEnv {
        let defaults = CgoEnv::default();
        let c = &self.cgo;
        CgoEnv {
            cc: c.cc.clone().unwrap_or(defaults.cc),
            cxx: c.cxx.clone().unwrap_or(defaults.cxx),
            fc: c.fc.clone().unwrap_or(defaults.fc),
            ar: c.ar.clone().unwrap_or(defaults.ar),
            gccgo: c.gccgo.clone().unwrap_or(defaults.gccgo),
            cppflags: c.cppflags.clone().unwrap_or(defaults.cppflags),
            cflags: c.cflags.clone().unwrap_or(defaults.cflags),
            cxxflags: c.cxxflags.clone().unwrap_or(defaults.cxxflags),
            fflags: c.fflags.clone().unwrap_or(defaults.fflags),
            ldflags: c.ldflags.clone().unwrap_or(defaults.ldflags),
            ldflags_allow: c.ldflags_allow.clone(),
            ldflags_disallow: c.ldflags_disallow.clone(),
        }
    }
}

/// GOROOT of a `go` command installed as `<root>/bin/go`.
fn goroot_of(go_tool: &Path) -> Option<PathBuf> {
    let resolved = std::fs::canonicalize(go_tool).ok()?;
    let bin = resolved.parent()?;
    if bin.file_name()? != "bin" {
        return None;
    }
    bin.parent().map(Path::to_path_buf)
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.gobuild/config.toml)
/// 2. Global config (~/.gobuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global gobuild config directory (~/.gobuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".gobuild"))
}

/// Get the global config path (~/.gobuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.gobuild/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".gobuild").join("config.toml")
}

/// Load the configuration for a build run from `project_root`.
///
/// Files are merged first, then the process environment is applied.
pub fn load_for(project_root: &Path) -> Config {
    let project = project_config_path(project_root);
    let mut config = match global_config_path() {
        Some(global) => load_config(&global, &project),
        None => load_config(Path::new(""), &project),
    };
    config.apply_env(|key| std::env::var(key).ok());
    config
}
