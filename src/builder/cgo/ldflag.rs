//! `//go:cgo_ldflag` directives in cgo-generated Go files.
//!
//! The compiler copies these flags into the package object and the linker
//! hands them to the host linker, so they are checked again after cgo runs.

/// The directive cgo writes for each `CGO_LDFLAGS` entry.
pub const CGO_LDFLAG_DIRECTIVE: &str = "//go:cgo_ldflag";

/// Extract the flags of all `//go:cgo_ldflag` lines in `src`, in order.
///
/// A line counts only when its first `//` comment is the directive.
/// Block comments are not considered; cgo does not generate them around
/// directives.
pub fn scan_ldflags(src: &str) -> Vec<String> {
    let mut flags = Vec::new();
    for line in src.lines() {
        let Some(comment) = line.find("//").map(|i| &line[i..]) else {
            continue;
        };
        let Some(rest) = comment.strip_prefix(CGO_LDFLAG_DIRECTIVE) else {
            continue;
        };
        flags.push(rest.trim().trim_matches('"').to_string());
    }
    flags
}

/// Remove the first contiguous occurrence of `expected` from `flags`.
///
/// Returns whether anything was removed. An empty `expected` removes nothing.
pub fn remove_expected(flags: &mut Vec<String>, expected: &[String]) -> bool {
    if expected.is_empty() || expected.len() > flags.len() {
        return false;
    }
    match flags.windows(expected.len()).position(|w| w == expected) {
        Some(start) => {
            flags.drain(start..start + expected.len());
            true
        }
        None => false,
    }
}
