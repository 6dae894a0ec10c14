//! Reserved-Name Presets
//!
//! Identifiers the transform engine must never pick as replacement names:
//! bundler-runtime intrinsics (including the hot-update API surface), the
//! CommonJS module-wrapper names and ECMAScript reserved words. Loaded once.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// Bundler runtime intrinsics and the hot-update API surface.
    pub static ref RESERVED_NAMES_PRESET_BUNDLER: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("__non_webpack_require__");
        s.insert("__resourceQuery");
        s.insert("__webpack_chunk_load__");
        s.insert("__webpack_hash__");
        s.insert("__webpack_init_sharing__");
        s.insert("__webpack_modules__");
        s.insert("__webpack_nonce__");
        s.insert("__webpack_public_path__");
        s.insert("__webpack_require__");
        s.insert("accept");
        s.insert("active");
        s.insert("addDisposeHandler");
        s.insert("addStatusHandler");
        s.insert("apply");
        s.insert("autoApply");
        s.insert("check");
        s.insert("chunkName");
        s.insert("data");
        s.insert("DEBUG");
        s.insert("decline");
        s.insert("dispose");
        s.insert("exclude");
        s.insert("exports");
        s.insert("ignoreDeclined");
        s.insert("ignoreErrored");
        s.insert("ignoreUnaccepted");
        s.insert("include");
        s.insert("mode");
        s.insert("module");
        s.insert("onAccepted");
        s.insert("onDeclined");
        s.insert("onDisposed");
        s.insert("onErrored");
        s.insert("onUnaccepted");
        s.insert("prefetch");
        s.insert("preload");
        s.insert("recursive");
        s.insert("regExp");
        s.insert("removeDisposeHandler");
        s.insert("removeStatusHandler");
        s.insert("status");
        s.insert("url");
        s.insert("webpack");
        s.insert("webpackContext");
        s.insert("webpackHot");
        s
    };

    /// CommonJS module-wrapper names.
    pub static ref RESERVED_NAMES_PRESET_CJS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("exports");
        s
    };

    /// ECMAScript reserved words, as recognized by mainstream parsers.
    pub static ref RESERVED_NAMES_PRESET_ECMASCRIPT: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("abstract");
        s.insert("arguments");
        s.insert("boolean");
        s.insert("byte");
        s.insert("char");
        s.insert("class");
        s.insert("const");
        s.insert("double");
        s.insert("enum");
        s.insert("eval");
        s.insert("export");
        s.insert("extends");
        s.insert("final");
        s.insert("float");
        s.insert("goto");
        s.insert("implements");
        s.insert("import");
        s.insert("int");
        s.insert("interface");
        s.insert("let");
        s.insert("long");
        s.insert("module");
        s.insert("native");
        s.insert("package");
        s.insert("private");
        s.insert("protected");
        s.insert("public");
        s.insert("short");
        s.insert("static");
        s.insert("super");
        s.insert("synchronized");
        s.insert("throws");
        s.insert("transient");
        s.insert("volatile");
        s.insert("yield");
        s
    };

    /// Union of every preset.
    pub static ref RESERVED_NAMES_PRESET_ALL: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.extend(RESERVED_NAMES_PRESET_BUNDLER.iter());
        s.extend(RESERVED_NAMES_PRESET_CJS.iter());
        s.extend(RESERVED_NAMES_PRESET_ECMASCRIPT.iter());
        s
    };
}

/// All reserved names as owned strings, sorted for deterministic options.
pub fn all_reserved_names() -> Vec<String> {
    let mut names: Vec<String> = RESERVED_NAMES_PRESET_ALL
        .iter()
        .map(|name| name.to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_covers_every_preset() {
        for name in RESERVED_NAMES_PRESET_BUNDLER.iter() {
            assert!(RESERVED_NAMES_PRESET_ALL.contains(name));
        }
        for name in RESERVED_NAMES_PRESET_CJS.iter() {
            assert!(RESERVED_NAMES_PRESET_ALL.contains(name));
        }
        for name in RESERVED_NAMES_PRESET_ECMASCRIPT.iter() {
            assert!(RESERVED_NAMES_PRESET_ALL.contains(name));
        }
    }

    #[test]
    fn test_all_reserved_names_sorted_and_deduplicated() {
        let names = all_reserved_names();
        assert_eq!(names.len(), RESERVED_NAMES_PRESET_ALL.len());
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        // "exports" and "module" appear in more than one preset
        assert!(names.iter().any(|n| n == "exports"));
        assert!(names.iter().any(|n| n == "module"));
    }
}
