//! External transform-engine boundary.
//!
//! The actual source-to-source obfuscation is a collaborator behind the
//! [`Obfuscator`] trait: source text plus a full configuration in,
//! obfuscated text, source map and the engine's rename table out.

use thiserror::Error;

use crate::options::ObfuscatorOptions;
use crate::registry::IdentifierNamesCache;

/// Engine-side failure; fatal to the processing phase when it surfaces.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ObfuscatorError {
    pub message: String,
}

impl ObfuscatorError {
    pub fn new(message: impl Into<String>) -> Self {
        ObfuscatorError {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObfuscationResult {
    pub code: String,
    pub source_map: Option<String>,
    /// The rename table the engine used and extended for this asset. Absent
    /// only when the engine was run without a registry.
    pub identifier_names_cache: Option<IdentifierNamesCache>,
}

pub trait Obfuscator: Send + Sync {
    /// May fail on malformed input; the orchestrator propagates the failure
    /// and fails the whole processing phase.
    fn obfuscate(
        &self,
        source: &str,
        options: &ObfuscatorOptions,
    ) -> Result<ObfuscationResult, ObfuscatorError>;
}
