//! # Obfuscator Plugin Native Core
//!
//! Identifier-naming consistency and caching for a bundler obfuscation
//! plugin. The external transform engine renames identifiers one asset at a
//! time; this crate is what makes those renames agree across assets and
//! across rebuilds.
//!
//! ## Naming Invariants
//!
//! 1. **One run, one registry**: every build-run owns exactly one shared
//!    identifier-names registry. Each asset's transform is seeded with a
//!    snapshot of it and its output is merged back before the next asset.
//!
//! 2. **Append-only merges**: a merge never overwrites an existing mapping.
//!    Once `foo` renames to `_0x4f2a` inside a run, it renames to `_0x4f2a`
//!    in every later asset of that run.
//!
//! 3. **Sequential processing**: assets are processed strictly in graph
//!    order, so the registry a later asset observes always contains every
//!    earlier asset's renames.
//!
//! 4. **Cache entries carry deltas**: a cache entry stores the transformed
//!    source plus only the mappings that asset added. Replaying a hit merges
//!    the delta, which reproduces the registry a fresh transform would have
//!    produced.
//!
//! 5. **Content-addressed hits**: cache identity is `(asset name, content
//!    hash)`. Any change to an asset's source text is a miss.
//!
//! The crate talks to its host through traits: [`compilation::Compilation`]
//! for the asset graph, [`cache::CacheStore`] for persistent storage and
//! [`obfuscator::Obfuscator`] for the transform engine itself.

pub mod assumptions;
pub mod cache;
pub mod compilation;
pub mod environment;
pub mod error;
pub mod hooks;
pub mod obfuscator;
pub mod options;
pub mod plugin;
pub mod plugin_options;
pub mod registry;
pub mod reserved;
pub mod stats;
pub mod target;


pub use assumptions::{prepare_assumptions, Assumptions, AssumptionsPreparationOptions};
pub use cache::{CacheStore, FsCacheStore, ItemCacheFacade, MemoryCacheStore};
pub use compilation::{
    Asset, AssetInfo, BuildConfig, BuildMode, Compilation, CompilationId, MemoryCompilation,
    SourceWithMap,
};
pub use error::{CacheError, PluginError};
pub use hooks::PluginHooks;
pub use obfuscator::{ObfuscationResult, Obfuscator, ObfuscatorError};
pub use options::{resolve_obfuscator_options, ObfuscatorOptions, ObfuscatorOptionsOverrides};
pub use plugin::{ObfuscatorPlugin, PLUGIN_NAME};
pub use plugin_options::{NamePattern, ObfuscatorPluginOptions};
pub use registry::{merge, merge_by_reference, IdentifierNamesCache};
pub use target::ObfuscatorTarget;
