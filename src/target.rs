//! Runtime-target inference.
//!
//! Decides which platform the obfuscated output runs on: from the declared
//! build target, from externals presets, or from browser-compatibility
//! queries resolved through the external [`BrowserslistEnv`] boundary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::compilation::BuildConfig;

/// The transform engine's target knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObfuscatorTarget {
    Browser,
    BrowserNoEval,
    ServiceWorker,
    Node,
}

impl ObfuscatorTarget {
    /// Browser-family targets, including the no-eval and service-worker
    /// variants.
    pub fn is_browser(self) -> bool {
        matches!(
            self,
            ObfuscatorTarget::Browser
                | ObfuscatorTarget::BrowserNoEval
                | ObfuscatorTarget::ServiceWorker
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPlatform {
    Browser,
    Node,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BROWSERSLIST BOUNDARY
// ═══════════════════════════════════════════════════════════════════════════════

/// A parsed `browserslist[:<query|config>[:env]]` target entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserslistRequest {
    pub query: Option<String>,
    pub config_path: Option<String>,
    pub env: Option<String>,
}

/// External browser-compatibility resolution: turns a request into resolved
/// `"<browser> <version>"` entries. Pure input derivation, host-supplied.
pub trait BrowserslistEnv: Send + Sync {
    fn query(&self, request: &BrowserslistRequest) -> Vec<String>;
}

pub fn is_browserslist_target_entry(entry: &str) -> bool {
    entry == "browserslist" || entry.starts_with("browserslist:")
}

/// Declared target entries that are browserslist queries.
pub fn extract_browserslist_target_entries(config: &BuildConfig) -> Vec<String> {
    config
        .target
        .entries()
        .iter()
        .filter(|entry| is_browserslist_target_entry(entry))
        .cloned()
        .collect()
}

/// Splits one target entry into a resolvable request. The payload segment is
/// a config-file path when absolute, a query when it is `defaults` or
/// contains whitespace, and an environment name otherwise.
pub fn parse_browserslist_target_entry(entry: &str) -> BrowserslistRequest {
    let mut segments = entry.splitn(3, ':');
    let head = segments.next().unwrap_or_default();
    debug_assert_eq!(head, "browserslist");

    let Some(payload) = segments.next() else {
        return BrowserslistRequest::default();
    };
    let rest = segments.next();

    if Path::new(payload).is_absolute() {
        return BrowserslistRequest {
            config_path: Some(payload.to_string()),
            env: rest.map(str::to_string),
            ..BrowserslistRequest::default()
        };
    }

    if payload == "defaults" || payload.chars().any(char::is_whitespace) {
        return BrowserslistRequest {
            query: Some(payload.to_string()),
            env: rest.map(str::to_string),
            ..BrowserslistRequest::default()
        };
    }

    BrowserslistRequest {
        env: Some(payload.to_string()),
        ..BrowserslistRequest::default()
    }
}

/// Resolves every entry and classifies the platform: any resolved segment
/// for a node runtime wins, otherwise the platform is browser.
pub fn platform_from_browserslist_entries(
    entries: &[String],
    env: &dyn BrowserslistEnv,
) -> TargetPlatform {
    for entry in entries {
        let request = parse_browserslist_target_entry(entry);
        for segment in env.query(&request) {
            if segment.starts_with("node ") {
                return TargetPlatform::Node;
            }
        }
    }
    TargetPlatform::Browser
}

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET INFERENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Infers the obfuscator target from the build configuration. `None` when
/// nothing in the configuration pins a platform down.
pub fn determine_obfuscator_target(
    config: &BuildConfig,
    csp: bool,
    browserslist: Option<&dyn BrowserslistEnv>,
) -> Option<ObfuscatorTarget> {
    let presets = &config.externals_presets;

    if config.target.is("web") || config.target.is("webworker") || presets.web || presets.web_async
    {
        return Some(ObfuscatorTarget::Browser);
    }

    if config.target.is("node")
        || presets.node
        || presets.electron
        || presets.electron_main
        || presets.electron_preload
        || presets.electron_renderer
        || presets.nwjs
    {
        return Some(ObfuscatorTarget::Node);
    }

    let entries = extract_browserslist_target_entries(config);
    if entries.is_empty() {
        return None;
    }

    // Without a resolution environment the declared queries still pin the
    // platform to its default, browser.
    let platform = match browserslist {
        Some(env) => platform_from_browserslist_entries(&entries, env),
        None => TargetPlatform::Browser,
    };

    match platform {
        TargetPlatform::Node => Some(ObfuscatorTarget::Node),
        TargetPlatform::Browser if csp => Some(ObfuscatorTarget::BrowserNoEval),
        TargetPlatform::Browser => Some(ObfuscatorTarget::Browser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilation::{ExternalsPresets, TargetConfig};

    struct FixedBrowserslist(Vec<String>);

    impl BrowserslistEnv for FixedBrowserslist {
        fn query(&self, _request: &BrowserslistRequest) -> Vec<String> {
            self.0.clone()
        }
    }

    fn config_with_target(target: TargetConfig) -> BuildConfig {
        BuildConfig {
            target,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_web_targets_resolve_to_browser() {
        let config = config_with_target(TargetConfig::Single("web".to_string()));
        assert_eq!(
            determine_obfuscator_target(&config, false, None),
            Some(ObfuscatorTarget::Browser)
        );

        let config = BuildConfig {
            externals_presets: ExternalsPresets {
                web_async: true,
                ..ExternalsPresets::default()
            },
            ..BuildConfig::default()
        };
        assert_eq!(
            determine_obfuscator_target(&config, false, None),
            Some(ObfuscatorTarget::Browser)
        );
    }

    #[test]
    fn test_node_family_presets_resolve_to_node() {
        for presets in [
            ExternalsPresets {
                node: true,
                ..ExternalsPresets::default()
            },
            ExternalsPresets {
                electron_renderer: true,
                ..ExternalsPresets::default()
            },
            ExternalsPresets {
                nwjs: true,
                ..ExternalsPresets::default()
            },
        ] {
            let config = BuildConfig {
                externals_presets: presets,
                ..BuildConfig::default()
            };
            assert_eq!(
                determine_obfuscator_target(&config, false, None),
                Some(ObfuscatorTarget::Node)
            );
        }
    }

    #[test]
    fn test_unpinned_target_yields_none() {
        assert_eq!(
            determine_obfuscator_target(&BuildConfig::default(), false, None),
            None
        );

        // es-version entries are not browserslist queries
        let config = config_with_target(TargetConfig::Multiple(vec!["es2020".to_string()]));
        assert_eq!(determine_obfuscator_target(&config, false, None), None);
    }

    #[test]
    fn test_browserslist_node_segment_wins() {
        let config = config_with_target(TargetConfig::Single(
            "browserslist:maintained node versions".to_string(),
        ));
        let env = FixedBrowserslist(vec!["node 20.0.0".to_string()]);
        assert_eq!(
            determine_obfuscator_target(&config, false, Some(&env)),
            Some(ObfuscatorTarget::Node)
        );
    }

    #[test]
    fn test_browserslist_browser_refined_by_csp() {
        let config = config_with_target(TargetConfig::Single("browserslist:defaults".to_string()));
        let env = FixedBrowserslist(vec!["chrome 120".to_string()]);

        assert_eq!(
            determine_obfuscator_target(&config, true, Some(&env)),
            Some(ObfuscatorTarget::BrowserNoEval)
        );
        assert_eq!(
            determine_obfuscator_target(&config, false, Some(&env)),
            Some(ObfuscatorTarget::Browser)
        );
    }

    #[test]
    fn test_parse_entry_shapes() {
        assert_eq!(
            parse_browserslist_target_entry("browserslist"),
            BrowserslistRequest::default()
        );

        assert_eq!(
            parse_browserslist_target_entry("browserslist:defaults"),
            BrowserslistRequest {
                query: Some("defaults".to_string()),
                ..BrowserslistRequest::default()
            }
        );

        assert_eq!(
            parse_browserslist_target_entry("browserslist:last 2 versions:modern"),
            BrowserslistRequest {
                query: Some("last 2 versions".to_string()),
                env: Some("modern".to_string()),
                ..BrowserslistRequest::default()
            }
        );

        assert_eq!(
            parse_browserslist_target_entry("browserslist:/repo/.browserslistrc:ssr"),
            BrowserslistRequest {
                config_path: Some("/repo/.browserslistrc".to_string()),
                env: Some("ssr".to_string()),
                ..BrowserslistRequest::default()
            }
        );

        // A bare word is an environment name
        assert_eq!(
            parse_browserslist_target_entry("browserslist:production"),
            BrowserslistRequest {
                env: Some("production".to_string()),
                ..BrowserslistRequest::default()
            }
        );
    }

    #[test]
    fn test_serde_target_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ObfuscatorTarget::BrowserNoEval).unwrap(),
            "\"browser-no-eval\""
        );
        assert_eq!(
            serde_json::to_string(&ObfuscatorTarget::ServiceWorker).unwrap(),
            "\"service-worker\""
        );
    }
}
