//! Plugin construction options and asset-name filtering.

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use crate::assumptions::Assumptions;
use crate::compilation::CompilationId;
use crate::hooks::PluginHooks;
use crate::options::ObfuscatorOptionsOverrides;

lazy_static! {
    /// Script assets by extension, query string tolerated.
    pub static ref DEFAULT_TEST_REGEXP: Regex =
        Regex::new(r"(?i)\.[cm]?jsx?(?:\?.*)?$").unwrap();
}

/// Where in the host's asset-processing pipeline the plugin runs.
pub const PROCESS_ASSETS_STAGE_DEV_TOOLING: i32 = -50;

/// An inclusion/exclusion filter entry: a literal prefix or a regex.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Literal(String),
    Pattern(Regex),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Literal(prefix) => name.starts_with(prefix.as_str()),
            NamePattern::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// True when `name` matches any test pattern (default: script extensions)
/// and no exclude pattern.
pub fn matches_asset_name(
    test: Option<&[NamePattern]>,
    exclude: &[NamePattern],
    name: &str,
) -> bool {
    let included = match test {
        Some(patterns) => patterns.iter().any(|pattern| pattern.matches(name)),
        None => DEFAULT_TEST_REGEXP.is_match(name),
    };

    included && !exclude.iter().any(|pattern| pattern.matches(name))
}

/// Callback invoked once per build-run with that run's hook set.
pub type HookSetupCallback = Arc<dyn Fn(CompilationId, &Arc<PluginHooks>) + Send + Sync>;

/// Everything a collaborator can configure at construction time.
#[derive(Default)]
pub struct ObfuscatorPluginOptions {
    /// Environment-fact overrides; anything left `None` is derived.
    pub assumptions: Option<Assumptions>,
    /// Forces caching on or off; unset defers to the hot-reload assumption.
    pub cache: Option<bool>,
    pub exclude: Vec<NamePattern>,
    /// Inclusion patterns; `None` means the default script-extension test.
    pub test: Option<Vec<NamePattern>>,
    /// Transform-configuration overrides, applied last on every asset.
    pub options: Option<ObfuscatorOptionsOverrides>,
    pub setup_hooks: Option<HookSetupCallback>,
    /// Pipeline placement surfaced to the host.
    pub stage: Option<i32>,
}

impl ObfuscatorPluginOptions {
    pub fn stage(&self) -> i32 {
        self.stage.unwrap_or(PROCESS_ASSETS_STAGE_DEV_TOOLING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_test_matches_script_extensions() {
        for name in [
            "main.js",
            "main.mjs",
            "main.cjs",
            "vendor.JSX",
            "chunk.js?v=abc123",
        ] {
            assert!(
                matches_asset_name(None, &[], name),
                "{name} should match the default test"
            );
        }

        for name in ["styles.css", "index.html", "main.js.LICENSE.txt"] {
            assert!(
                !matches_asset_name(None, &[], name),
                "{name} should not match the default test"
            );
        }
    }

    #[test]
    fn test_exclude_wins_over_test() {
        let exclude = vec![NamePattern::Literal("vendor".to_string())];
        assert!(!matches_asset_name(None, &exclude, "vendor.main.js"));
        assert!(matches_asset_name(None, &exclude, "app.main.js"));
    }

    #[test]
    fn test_explicit_test_patterns_replace_default() {
        let test = vec![NamePattern::Pattern(Regex::new(r"\.worker\.js$").unwrap())];
        assert!(matches_asset_name(Some(&test), &[], "upload.worker.js"));
        assert!(!matches_asset_name(Some(&test), &[], "main.js"));
    }
}
