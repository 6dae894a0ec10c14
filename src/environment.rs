//! Build-environment probes.
//!
//! Pure derivations over [`BuildConfig`]: effective node-env mode, whether
//! the configured devtool emits eval-wrapped code, whether trusted types are
//! enforced, and whether hot-module replacement is active.

use crate::compilation::{BuildConfig, BuildMode, DevServerHot};

pub const NODE_ENV_DEVELOPMENT: &str = "development";
pub const NODE_ENV_PRODUCTION: &str = "production";

/// The process-wide default environment: `NODE_ENV`, else `"development"`.
pub fn default_node_env() -> String {
    std::env::var("NODE_ENV")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| NODE_ENV_DEVELOPMENT.to_string())
}

/// Effective node-env mode from build mode or optimization flags, normalized
/// to `"production"` / `"development"`. `None` when neither is configured.
pub fn node_env_mode(config: &BuildConfig) -> Option<String> {
    match config.mode {
        BuildMode::Development => return Some(NODE_ENV_DEVELOPMENT.to_string()),
        BuildMode::Production => return Some(NODE_ENV_PRODUCTION.to_string()),
        BuildMode::None => {}
    }

    config.optimization_node_env.as_deref().map(|value| {
        if value == NODE_ENV_PRODUCTION {
            NODE_ENV_PRODUCTION.to_string()
        } else {
            NODE_ENV_DEVELOPMENT.to_string()
        }
    })
}

/// Whether the configured devtool wraps modules in `eval` calls, which is
/// incompatible with a CSP that forbids `unsafe-eval`.
pub fn devtool_uses_eval(config: &BuildConfig) -> bool {
    match config.devtool.as_deref() {
        Some(devtool) => {
            devtool == "eval" || devtool.starts_with("eval-") || devtool.contains("-eval-")
        }
        None => false,
    }
}

/// Whether the build output enforces a trusted-types policy.
pub fn trusted_types_enabled(config: &BuildConfig) -> bool {
    config.trusted_types
}

/// Whether hot-module replacement is active. An explicit dev-server setting
/// wins; otherwise an HMR capability registered in the plugin set counts.
pub fn hmr_enabled(config: &BuildConfig) -> bool {
    match config.dev_server_hot {
        Some(DevServerHot::On) | Some(DevServerHot::Only) => true,
        Some(DevServerHot::Off) => false,
        None => config.hmr_plugin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_env_mode_prefers_mode_over_optimization() {
        let config = BuildConfig {
            mode: BuildMode::Production,
            optimization_node_env: Some("development".to_string()),
            ..BuildConfig::default()
        };
        assert_eq!(node_env_mode(&config), Some("production".to_string()));
    }

    #[test]
    fn test_node_env_mode_falls_back_to_optimization() {
        let config = BuildConfig {
            optimization_node_env: Some("production".to_string()),
            ..BuildConfig::default()
        };
        assert_eq!(node_env_mode(&config), Some("production".to_string()));

        // Any non-production value normalizes to development
        let config = BuildConfig {
            optimization_node_env: Some("staging".to_string()),
            ..BuildConfig::default()
        };
        assert_eq!(node_env_mode(&config), Some("development".to_string()));
    }

    #[test]
    fn test_node_env_mode_unset() {
        assert_eq!(node_env_mode(&BuildConfig::default()), None);
    }

    #[test]
    fn test_devtool_uses_eval() {
        let with = |devtool: &str| BuildConfig {
            devtool: Some(devtool.to_string()),
            ..BuildConfig::default()
        };

        assert!(devtool_uses_eval(&with("eval")));
        assert!(devtool_uses_eval(&with("eval-source-map")));
        assert!(devtool_uses_eval(&with("cheap-module-eval-source-map")));
        assert!(!devtool_uses_eval(&with("source-map")));
        assert!(!devtool_uses_eval(&BuildConfig::default()));
    }

    #[test]
    fn test_hmr_explicit_setting_wins() {
        let config = BuildConfig {
            dev_server_hot: Some(DevServerHot::Off),
            hmr_plugin: true,
            ..BuildConfig::default()
        };
        assert!(!hmr_enabled(&config));

        let config = BuildConfig {
            dev_server_hot: Some(DevServerHot::Only),
            ..BuildConfig::default()
        };
        assert!(hmr_enabled(&config));
    }

    #[test]
    fn test_hmr_falls_back_to_plugin_set() {
        let config = BuildConfig {
            hmr_plugin: true,
            ..BuildConfig::default()
        };
        assert!(hmr_enabled(&config));
        assert!(!hmr_enabled(&BuildConfig::default()));
    }
}
