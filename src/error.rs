//! Error taxonomy for the obfuscation pipeline.
//!
//! Graph-access failures are recovered locally by the orchestrator (logged,
//! asset skipped) and never surface here; everything below is fatal to the
//! processing phase.

use thiserror::Error;

use crate::obfuscator::ObfuscatorError;

#[derive(Debug, Error)]
pub enum PluginError {
    /// The external transform engine rejected an asset. No partial output is
    /// written for the asset and the whole processing phase fails.
    #[error("obfuscation failed for asset `{asset_name}`: {source}")]
    Obfuscation {
        asset_name: String,
        #[source]
        source: ObfuscatorError,
    },

    /// A cache read or write failed while processing an asset.
    #[error("cache operation failed for asset `{asset_name}`: {source}")]
    Cache {
        asset_name: String,
        #[source]
        source: CacheError,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache storage failed: {0}")]
    Storage(String),
}
