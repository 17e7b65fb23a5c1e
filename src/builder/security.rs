//! Linker flag allow-list.
//!
//! Flags that reach the host linker from package sources are untrusted: a
//! plugin flag or a response file (`@file`) would let a package run code at
//! build time. Every such flag must fully match one of the patterns below,
//! or be one of the flags that take a separate, harmless argument.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::builder::context::CgoEnv;
use crate::builder::error::BuildError;

// Wildcards in -Wl patterns exclude commas: -Wl splits its argument at
// commas and hands each piece to the linker.
const VALID_LINKER_FLAGS: &[&str] = &[
    r"-F([^@\-].*)",
    r"-l([^@\-].*)",
    r"-L([^@\-].*)",
    r"-O",
    r"-O([^@\-].*)",
    r"-f(no-)?(pic|PIC|pie|PIE)",
    r"-f(no-)?openmp(-simd)?",
    r"-fsanitize=([^@\-].*)",
    r"-flat_namespace",
    r"-g([^@\-].*)?",
    r"-headerpad_max_install_names",
    r"-m(abi|arch|cpu|fpu|tune)=([^@\-].*)",
    r"-mfloat-abi=([^@\-].*)",
    r"-mmacosx-(.+)",
    r"-mios-simulator-version-min=(.+)",
    r"-miphoneos-version-min=(.+)",
    r"-mthreads",
    r"-mwindows",
    r"-(pic|PIC|pie|PIE)",
    r"-pthread",
    r"-rdynamic",
    r"-shared",
    r"-?-static([-a-z0-9+]*)",
    r"-?-stdlib=([^@\-].*)",
    r"-v",
    r"-Wl,--(no-)?allow-multiple-definition",
    r"-Wl,--(no-)?allow-shlib-undefined",
    r"-Wl,--(no-)?as-needed",
    r"-Wl,-Bdynamic",
    r"-Wl,-berok",
    r"-Wl,-Bstatic",
    r"-Wl,-Bsymbolic-functions",
    r"-WL,-O([^@,\-][^,]*)?",
    r"-Wl,-d[ny]",
    r"-Wl,--disable-new-dtags",
    r"-Wl,-e[=,][a-zA-Z0-9]*",
    r"-Wl,--enable-new-dtags",
    r"-Wl,--end-group",
    r"-Wl,--(no-)?export-dynamic",
    r"-Wl,-E",
    r"-Wl,-framework,[^,@\-][^,]+",
    r"-Wl,--hash-style=(sysv|gnu|both)",
    r"-Wl,-headerpad_max_install_names",
    r"-Wl,--no-undefined",
    r"-Wl,-R([^@\-][^,@]*$)",
    r"-Wl,--just-symbols[=,]([^,@\-][^,@]+)",
    r"-Wl,-rpath(-link)?[=,]([^,@\-][^,]+)",
    r"-Wl,-s",
    r"-Wl,-search_paths_first",
    r"-Wl,-sectcreate,([^,@\-][^,]+),([^,@\-][^,]+),([^,@\-][^,]+)",
    r"-Wl,--start-group",
    r"-Wl,-?-static",
    r"-Wl,-?-subsystem,(native|windows|console|posix|xbox)",
    r"-Wl,-syslibroot[=,]([^,@\-][^,]+)",
    r"-Wl,-undefined[=,]([^,@\-][^,]+)",
    r"-Wl,-?-unresolved-symbols=[^,]+",
    r"-Wl,--(no-)?warn-([^,]+)",
    r"-Wl,-?-wrap[=,][^,@\-][^,]*",
    r"-Wl,-z,(no)?execstack",
    r"-Wl,-z,relro",
    // Direct linker inputs: x.o or libfoo.so, but not -foo.o or @foo.o.
    r"[a-zA-Z0-9_/].*\.(a|o|obj|dll|dylib|so|tbd)",
    r"\./.*\.(a|o|obj|dll|dylib|so|tbd)",
];

/// Flags whose argument is passed as the following list element.
const VALID_LINKER_FLAGS_WITH_NEXT_ARG: &[&str] = &[
    "-arch",
    "-F",
    "-l",
    "-L",
    "-framework",
    "-isysroot",
    "--sysroot",
    "-target",
    "-Wl,-framework",
    "-Wl,-rpath",
    "-Wl,-R",
    "-Wl,--just-symbols",
    "-Wl,-undefined",
];

static LINKER_FLAGS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(VALID_LINKER_FLAGS.iter().map(|p| anchored(p)))
        .expect("linker flag patterns are valid")
});

fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

/// Compile a user-supplied override pattern from `var`.
fn user_pattern(var: &str, pattern: Option<&str>) -> Result<Option<Regex>, BuildError> {
    match pattern.filter(|p| !p.is_empty()) {
        Some(p) => Regex::new(&anchored(p))
            .map(Some)
            .map_err(|err| BuildError::InvalidFlagPattern {
                var: var.to_string(),
                pattern: p.to_string(),
                err,
            }),
        None => Ok(None),
    }
}

/// Whether `arg` cannot be mistaken for a flag or a response file.
fn safe_arg(arg: &str) -> bool {
    match arg.chars().next() {
        Some(c) => c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/') || !c.is_ascii(),
        None => false,
    }
}

/// Check linker flags taken from `origin` (for example `#cgo LDFLAGS`).
///
/// `CGO_LDFLAGS_DISALLOW` rejects a flag outright, then `CGO_LDFLAGS_ALLOW`
/// accepts it, then the built-in list decides. Both overrides must match the
/// whole flag.
pub fn check_linker_flags(origin: &str, flags: &[String], env: &CgoEnv) -> Result<(), BuildError> {
    let allow = user_pattern("CGO_LDFLAGS_ALLOW", env.ldflags_allow.as_deref())?;
    let disallow = user_pattern("CGO_LDFLAGS_DISALLOW", env.ldflags_disallow.as_deref())?;

    let invalid = |flag: &str| BuildError::InvalidFlag {
        origin: origin.to_string(),
        flag: flag.to_string(),
    };

    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i].as_str();
        i += 1;

        if disallow.as_ref().is_some_and(|re| re.is_match(flag)) {
            return Err(invalid(flag));
        }
        if allow.as_ref().is_some_and(|re| re.is_match(flag)) {
            continue;
        }
        if LINKER_FLAGS.is_match(flag) {
            continue;
        }
        if !VALID_LINKER_FLAGS_WITH_NEXT_ARG.contains(&flag) {
            return Err(invalid(flag));
        }

        let Some(next) = flags.get(i) else {
            return Err(BuildError::MissingFlagArgument {
                origin: origin.to_string(),
                flag: flag.to_string(),
            });
        };
        if safe_arg(next) {
            i += 1;
            continue;
        }
        // -Wl,-framework -Wl,name
        if let (Some(_), Some(rest)) = (flag.strip_prefix("-Wl,"), next.strip_prefix("-Wl,")) {
            if safe_arg(rest) && !rest.contains(',') {
                i += 1;
                continue;
            }
        }
        return Err(BuildError::InvalidFlagArgument {
            origin: origin.to_string(),
            flag: flag.to_string(),
            arg: next.clone(),
        });
    }

    Ok(())
}
