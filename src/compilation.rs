//! Host build-system boundary.
//!
//! The plugin never owns the asset graph; it consumes it through the
//! [`Compilation`] trait. [`BuildConfig`] mirrors the compilation-level
//! configuration the assumption resolver inspects. [`MemoryCompilation`] is a
//! self-contained implementation for embedding and tests.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheStore, MemoryCacheStore};
use crate::target::BrowserslistEnv;

pub type CompilationId = u64;

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
    #[default]
    None,
}

/// The dev-server hot-reload setting; `Only` forces hot updates without a
/// full-page fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevServerHot {
    Off,
    On,
    Only,
}

/// The build's declared target, as configured by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetConfig {
    #[default]
    Unset,
    Single(String),
    Multiple(Vec<String>),
}

impl TargetConfig {
    /// All declared target entries, regardless of shape.
    pub fn entries(&self) -> &[String] {
        match self {
            TargetConfig::Unset => &[],
            TargetConfig::Single(entry) => std::slice::from_ref(entry),
            TargetConfig::Multiple(entries) => entries,
        }
    }

    /// True only when the target is exactly the given single entry.
    pub fn is(&self, entry: &str) -> bool {
        matches!(self, TargetConfig::Single(value) if value == entry)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalsPresets {
    pub web: bool,
    pub web_async: bool,
    pub node: bool,
    pub electron: bool,
    pub electron_main: bool,
    pub electron_preload: bool,
    pub electron_renderer: bool,
    pub nwjs: bool,
}

/// Compilation-level configuration consumed by the assumption resolver.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub mode: BuildMode,
    /// The optimization-level node-env value; `None` when unset or disabled.
    pub optimization_node_env: Option<String>,
    pub devtool: Option<String>,
    /// Whether the build output declares a trusted-types policy.
    pub trusted_types: bool,
    /// `None` when the dev-server leaves the hot setting unspecified.
    pub dev_server_hot: Option<DevServerHot>,
    /// Whether a hot-module-replacement capability is registered in the
    /// build's plugin set.
    pub hmr_plugin: bool,
    pub target: TargetConfig,
    pub externals_presets: ExternalsPresets,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// One emitted script asset: transformed text plus its source map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceWithMap {
    pub source: String,
    pub map: Option<String>,
}

impl SourceWithMap {
    pub fn new(source: impl Into<String>) -> Self {
        SourceWithMap {
            source: source.into(),
            map: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Set by the orchestrator after a successful transform; rendered as a
    /// flag in build stats.
    pub obfuscated: bool,
    /// Development-only artifacts are never obfuscated.
    pub development: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asset {
    pub source: SourceWithMap,
    pub info: AssetInfo,
}

#[derive(Debug, Error)]
#[error("failed to read asset `{name}` from the asset graph: {reason}")]
pub struct AssetGraphError {
    pub name: String,
    pub reason: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILATION TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// One build-run's view of the host: configuration plus the asset graph.
pub trait Compilation {
    fn id(&self) -> CompilationId;

    fn config(&self) -> &BuildConfig;

    /// Asset names in the order the host currently holds them. The
    /// orchestrator processes assets in exactly this order.
    fn asset_names(&self) -> Vec<String>;

    fn asset(&self, name: &str) -> Result<Option<Asset>, AssetGraphError>;

    /// Replaces an asset's source; `info` of `None` keeps the stored info.
    fn update_asset(&mut self, name: &str, source: SourceWithMap, info: Option<AssetInfo>);

    /// The host's content-addressed cache, scoped to the given plugin name.
    fn cache(&self, plugin_name: &str) -> Arc<dyn CacheStore>;

    /// Browser-compatibility resolution environment, when the host has one.
    fn browserslist(&self) -> Option<&dyn BrowserslistEnv> {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY COMPILATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A self-contained [`Compilation`] holding assets in insertion order.
pub struct MemoryCompilation {
    id: CompilationId,
    config: BuildConfig,
    assets: Vec<(String, Asset)>,
    cache: Arc<dyn CacheStore>,
}

impl MemoryCompilation {
    pub fn new(id: CompilationId, config: BuildConfig) -> Self {
        MemoryCompilation {
            id,
            config,
            assets: Vec::new(),
            cache: Arc::new(MemoryCacheStore::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn emit_asset(&mut self, name: impl Into<String>, source: SourceWithMap, info: AssetInfo) {
        let name = name.into();
        if let Some(slot) = self.assets.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = Asset { source, info };
        } else {
            self.assets.push((name, Asset { source, info }));
        }
    }

    pub fn asset_ref(&self, name: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, asset)| asset)
    }
}

impl Compilation for MemoryCompilation {
    fn id(&self) -> CompilationId {
        self.id
    }

    fn config(&self) -> &BuildConfig {
        &self.config
    }

    fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn asset(&self, name: &str) -> Result<Option<Asset>, AssetGraphError> {
        Ok(self.asset_ref(name).cloned())
    }

    fn update_asset(&mut self, name: &str, source: SourceWithMap, info: Option<AssetInfo>) {
        if let Some(slot) = self.assets.iter_mut().find(|(existing, _)| existing == name) {
            slot.1.source = source;
            if let Some(info) = info {
                slot.1.info = info;
            }
        }
    }

    fn cache(&self, _plugin_name: &str) -> Arc<dyn CacheStore> {
        Arc::clone(&self.cache)
    }
}
