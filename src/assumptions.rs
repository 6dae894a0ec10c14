//! Assumption Resolver
//!
//! Derives the environment facts that guide option resolution: CSP mode,
//! hot-reload, node-env and runtime target. Computed once per build pass,
//! immutable afterwards. Pure function of the build configuration plus
//! caller overrides.

use serde::{Deserialize, Serialize};

use crate::compilation::BuildConfig;
use crate::environment::{
    default_node_env, devtool_uses_eval, hmr_enabled, node_env_mode, trusted_types_enabled,
};
use crate::options::ObfuscatorOptionsOverrides;
use crate::target::{determine_obfuscator_target, BrowserslistEnv, ObfuscatorTarget};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assumptions {
    pub csp: Option<bool>,
    pub hmr: Option<bool>,
    pub node_env: Option<String>,
    pub target: Option<ObfuscatorTarget>,
}

/// Inputs that can short-circuit derivation: explicit assumption overrides
/// and the caller's transform-option overrides (whose `target`, when set,
/// wins over everything else).
#[derive(Default)]
pub struct AssumptionsPreparationOptions<'a> {
    pub options: Option<&'a ObfuscatorOptionsOverrides>,
    pub overrides: Option<&'a Assumptions>,
}

/// Resolves every assumption for one build pass. All fields of the returned
/// record are populated.
pub fn prepare_assumptions(
    config: &BuildConfig,
    browserslist: Option<&dyn BrowserslistEnv>,
    preparation: AssumptionsPreparationOptions<'_>,
) -> Assumptions {
    let overrides = preparation.overrides.cloned().unwrap_or_default();

    let csp = overrides
        .csp
        .unwrap_or_else(|| !devtool_uses_eval(config) && trusted_types_enabled(config));

    let hmr = overrides.hmr.unwrap_or_else(|| hmr_enabled(config));

    let node_env = overrides
        .node_env
        .or_else(|| node_env_mode(config))
        .unwrap_or_else(default_node_env);

    let target = preparation
        .options
        .and_then(|options| options.target)
        .or(overrides.target)
        .or_else(|| determine_obfuscator_target(config, csp, browserslist))
        .unwrap_or(ObfuscatorTarget::Browser);

    Assumptions {
        csp: Some(csp),
        hmr: Some(hmr),
        node_env: Some(node_env),
        target: Some(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilation::{BuildMode, DevServerHot, TargetConfig};

    #[test]
    fn test_production_node_build_without_hot_reload() {
        let config = BuildConfig {
            mode: BuildMode::Production,
            dev_server_hot: Some(DevServerHot::Off),
            target: TargetConfig::Single("node".to_string()),
            ..BuildConfig::default()
        };

        let assumptions =
            prepare_assumptions(&config, None, AssumptionsPreparationOptions::default());

        assert_eq!(assumptions.node_env.as_deref(), Some("production"));
        assert_eq!(assumptions.hmr, Some(false));
        assert_eq!(assumptions.target, Some(ObfuscatorTarget::Node));
        assert_eq!(assumptions.csp, Some(false));
    }

    #[test]
    fn test_csp_requires_trusted_types_and_no_eval_devtool() {
        let config = BuildConfig {
            trusted_types: true,
            ..BuildConfig::default()
        };
        let assumptions =
            prepare_assumptions(&config, None, AssumptionsPreparationOptions::default());
        assert_eq!(assumptions.csp, Some(true));

        let config = BuildConfig {
            trusted_types: true,
            devtool: Some("eval-source-map".to_string()),
            ..BuildConfig::default()
        };
        let assumptions =
            prepare_assumptions(&config, None, AssumptionsPreparationOptions::default());
        assert_eq!(assumptions.csp, Some(false));
    }

    #[test]
    fn test_overrides_win_over_derivation() {
        let config = BuildConfig {
            mode: BuildMode::Production,
            ..BuildConfig::default()
        };
        let overrides = Assumptions {
            csp: Some(true),
            hmr: Some(true),
            node_env: Some("development".to_string()),
            target: Some(ObfuscatorTarget::ServiceWorker),
        };

        let assumptions = prepare_assumptions(
            &config,
            None,
            AssumptionsPreparationOptions {
                overrides: Some(&overrides),
                ..AssumptionsPreparationOptions::default()
            },
        );

        assert_eq!(assumptions, overrides);
    }

    #[test]
    fn test_explicit_option_target_wins_over_assumption_override() {
        let options = ObfuscatorOptionsOverrides {
            target: Some(ObfuscatorTarget::Node),
            ..ObfuscatorOptionsOverrides::default()
        };
        let overrides = Assumptions {
            target: Some(ObfuscatorTarget::Browser),
            ..Assumptions::default()
        };

        let assumptions = prepare_assumptions(
            &BuildConfig::default(),
            None,
            AssumptionsPreparationOptions {
                options: Some(&options),
                overrides: Some(&overrides),
            },
        );

        assert_eq!(assumptions.target, Some(ObfuscatorTarget::Node));
    }

    #[test]
    fn test_target_defaults_to_browser() {
        let assumptions = prepare_assumptions(
            &BuildConfig::default(),
            None,
            AssumptionsPreparationOptions::default(),
        );
        assert_eq!(assumptions.target, Some(ObfuscatorTarget::Browser));
    }
}
