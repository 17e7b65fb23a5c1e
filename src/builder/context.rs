//! Build context - toolchain environment and per-build configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::builder::toolchain::ToolchainFamily;
use crate::core::overlay::Overlay;

/// Process-wide Go toolchain environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Root of the Go installation
    pub goroot: PathBuf,
    /// Target operating system
    pub goos: String,
    /// Target architecture
    pub goarch: String,
    /// Path to the `go` command
    pub go_tool: PathBuf,
    /// Version reported by the go command (e.g. "go1.21.3"), if known
    pub go_version: Option<String>,
}

impl Context {
    /// Create a context for the given target.
    pub fn new(
        goroot: impl Into<PathBuf>,
        goos: impl Into<String>,
        goarch: impl Into<String>,
        go_tool: impl Into<PathBuf>,
    ) -> Self {
        Context {
            goroot: goroot.into(),
            goos: goos.into(),
            goarch: goarch.into(),
            go_tool: go_tool.into(),
            go_version: None,
        }
    }

    /// Set the go version.
    pub fn with_go_version(mut self, version: impl Into<String>) -> Self {
        self.go_version = Some(version.into());
        self
    }

    /// Directory of the runtime headers (`textflag.h`, ...).
    pub fn include_dir(&self) -> PathBuf {
        self.goroot.join("pkg").join("include")
    }

    /// Whether the target is Windows.
    pub fn is_windows(&self) -> bool {
        self.goos == "windows"
    }

    /// Host GOOS, as Go spells it.
    pub fn host_goos() -> &'static str {
        match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        }
    }

    /// Host GOARCH, as Go spells it.
    pub fn host_goarch() -> &'static str {
        match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        }
    }
}

/// The kind of artifact the overall build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Default,
    Archive,
    CArchive,
    CShared,
    Exe,
    Pie,
}

impl OutputMode {
    /// Get the mode as spelled on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Default => "default",
            OutputMode::Archive => "archive",
            OutputMode::CArchive => "c-archive",
            OutputMode::CShared => "c-shared",
            OutputMode::Exe => "exe",
            OutputMode::Pie => "pie",
        }
    }

    /// Whether C code links against the package and needs an export header.
    pub fn exports_to_c(&self) -> bool {
        matches!(self, OutputMode::CArchive | OutputMode::CShared)
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(OutputMode::Default),
            "archive" => Ok(OutputMode::Archive),
            "c-archive" => Ok(OutputMode::CArchive),
            "c-shared" => Ok(OutputMode::CShared),
            "exe" => Ok(OutputMode::Exe),
            "pie" => Ok(OutputMode::Pie),
            _ => Err(format!("unknown buildmode `{s}`")),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// C toolchain and flag settings used by cgo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgoEnv {
    /// C compiler (CC)
    pub cc: PathBuf,
    /// C++ compiler (CXX)
    pub cxx: PathBuf,
    /// Fortran compiler (FC)
    pub fc: PathBuf,
    /// Archiver (AR), used by gccgo
    pub ar: PathBuf,
    /// gccgo driver (GCCGO)
    pub gccgo: PathBuf,
    /// CGO_CPPFLAGS
    pub cppflags: Vec<String>,
    /// CGO_CFLAGS
    pub cflags: Vec<String>,
    /// CGO_CXXFLAGS
    pub cxxflags: Vec<String>,
    /// CGO_FFLAGS
    pub fflags: Vec<String>,
    /// CGO_LDFLAGS
    pub ldflags: Vec<String>,
    /// CGO_LDFLAGS_ALLOW
    pub ldflags_allow: Option<String>,
    /// CGO_LDFLAGS_DISALLOW
    pub ldflags_disallow: Option<String>,
}

/// Flags the C compilers get when the environment does not say otherwise.
pub const DEFAULT_CGO_FLAGS: [&str; 2] = ["-g", "-O2"];

impl Default for CgoEnv {
    fn default() -> Self {
        let default_flags = || DEFAULT_CGO_FLAGS.iter().map(|s| s.to_string()).collect();
        CgoEnv {
            cc: PathBuf::from("gcc"),
            cxx: PathBuf::from("g++"),
            fc: PathBuf::from("gfortran"),
            ar: PathBuf::from("ar"),
            gccgo: PathBuf::from("gccgo"),
            cppflags: Vec::new(),
            cflags: default_flags(),
            cxxflags: default_flags(),
            fflags: default_flags(),
            ldflags: default_flags(),
            ldflags_allow: None,
            ldflags_disallow: None,
        }
    }
}

impl CgoEnv {
    /// Whether the Fortran compiler is gfortran, which needs its runtime linked in.
    pub fn fc_is_gfortran(&self) -> bool {
        self.fc.to_string_lossy().contains("gfortran")
    }
}

/// Per-build configuration, threaded explicitly through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMode {
    /// Selected compiler suite
    pub toolchain: ToolchainFamily,
    /// Build with memory sanitizer (-msan)
    pub msan: bool,
    /// Print commands instead of running them (-n)
    pub dry_run: bool,
    /// Remove file system paths from the output (-trimpath)
    pub trimpath: bool,
    /// Kind of final artifact (-buildmode)
    pub output: OutputMode,
    /// Replacements for cgo source files (-overlay)
    pub overlay: Overlay,
    /// C toolchain settings
    pub cgo: CgoEnv,
}

impl Default for BuildMode {
    fn default() -> Self {
        BuildMode {
            toolchain: ToolchainFamily::Gc,
            msan: false,
            dry_run: false,
            trimpath: true,
            output: OutputMode::Default,
            overlay: Overlay::default(),
            cgo: CgoEnv::default(),
        }
    }
}

impl BuildMode {
    /// Build mode for the given toolchain with default settings.
    pub fn for_toolchain(toolchain: ToolchainFamily) -> Self {
        BuildMode {
            toolchain,
            ..BuildMode::default()
        }
    }
}
