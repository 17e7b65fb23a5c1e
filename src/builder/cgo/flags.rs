//! Compiler and linker flags for the cgo step.

use std::fmt::Write as _;

use crate::builder::context::BuildMode;
use crate::builder::error::BuildError;
use crate::builder::security::check_linker_flags;
use crate::core::action::Action;

/// Origin reported for flags from the package's `#cgo LDFLAGS` lines.
pub const CGO_LDFLAGS_ORIGIN: &str = "#cgo LDFLAGS";

/// The merged flags a cgo package is built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgoFlags {
    pub cppflags: Vec<String>,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub fflags: Vec<String>,
    pub ldflags: Vec<String>,
}

impl CgoFlags {
    /// Merge environment, `#cgo` directive and pkg-config flags for `a`.
    ///
    /// `objc` and `fortran` say whether the package has Objective-C or
    /// Fortran files, which pull in their runtime libraries.
    pub fn derive(
        a: &Action,
        mode: &BuildMode,
        objc: bool,
        fortran: bool,
    ) -> Result<CgoFlags, BuildError> {
        let p = &a.package;
        let env = &mode.cgo;

        check_linker_flags(CGO_LDFLAGS_ORIGIN, &p.cgo.ldflags, env)?;

        let concat = |env: &[String], pkg: &[String]| -> Vec<String> {
            env.iter().chain(pkg).cloned().collect()
        };
        let mut flags = CgoFlags {
            cppflags: concat(&env.cppflags, &p.cgo.cppflags),
            cflags: concat(&env.cflags, &p.cgo.cflags),
            cxxflags: concat(&env.cxxflags, &p.cgo.cxxflags),
            fflags: concat(&env.fflags, &p.cgo.fflags),
            ldflags: concat(&env.ldflags, &p.cgo.ldflags),
        };

        flags.cppflags.extend(p.pkg_config.cflags.iter().cloned());
        flags.ldflags.extend(p.pkg_config.ldflags.iter().cloned());

        if objc {
            flags.ldflags.push("-lobjc".to_string());
        }
        // Other Fortran compilers get their runtime through CGO_LDFLAGS.
        if fortran && env.fc_is_gfortran() {
            flags.ldflags.push("-lgfortran".to_string());
        }

        if mode.msan {
            flags.cflags.insert(0, "-fsanitize=memory".to_string());
            flags.ldflags.insert(0, "-fsanitize=memory".to_string());
        }

        // Lets package C files include _cgo_export.h.
        flags.cppflags.push("-I".to_string());
        flags.cppflags.push(a.objdir.to_string_lossy().into_owned());

        Ok(flags)
    }

    /// Preprocessor flags followed by C flags.
    pub fn c(&self) -> Vec<String> {
        self.cppflags.iter().chain(&self.cflags).cloned().collect()
    }

    /// Preprocessor flags followed by C++ flags.
    pub fn cxx(&self) -> Vec<String> {
        self.cppflags.iter().chain(&self.cxxflags).cloned().collect()
    }

    /// Preprocessor flags followed by Fortran flags.
    pub fn fortran(&self) -> Vec<String> {
        self.cppflags.iter().chain(&self.fflags).cloned().collect()
    }

    /// The `CGO_LDFLAGS` value handed to the cgo tool.
    ///
    /// cgo records each flag in a `//go:cgo_ldflag` directive, so every flag
    /// is quoted separately.
    pub fn ldflags_env(&self) -> Option<String> {
        if self.ldflags.is_empty() {
            return None;
        }
        let quoted: Vec<String> = self.ldflags.iter().map(|f| go_quote(f)).collect();
        Some(quoted.join(" "))
    }
}

/// Quote a string as a Go string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
