//! Asset Orchestrator
//!
//! Drives one build-run end to end: resolves assumptions once, then walks
//! the asset graph in order. For each eligible asset it seeds a per-asset
//! configuration with the current shared registry, lets pre-obfuscation
//! subscribers mutate it, consults the cache, invokes the external engine,
//! merges the resulting rename table back into the shared registry by
//! reference, and writes the transformed source into the graph. Processing
//! is strictly sequential so later assets always observe earlier renames.

use std::sync::Arc;

use crate::assumptions::{prepare_assumptions, Assumptions, AssumptionsPreparationOptions};
use crate::cache::{CacheStore, ItemCacheFacade, ObfuscationCacheData};
use crate::compilation::{AssetInfo, Compilation, CompilationId, SourceWithMap};
use crate::error::PluginError;
use crate::hooks::{PluginHooks, PluginHooksRegistry};
use crate::obfuscator::Obfuscator;
use crate::options::{resolve_obfuscator_options, ObfuscatorOptionsOverrides, SourceMapMode};
use crate::plugin_options::{matches_asset_name, ObfuscatorPluginOptions};
use crate::registry::{diff, merge, merge_by_reference, select, IdentifierNamesCache};

pub const PLUGIN_NAME: &str = "ObfuscatorPlugin";

/// Per-run mutable state. Scoped strictly to one `process_assets` call; the
/// shared registry never outlives the run that owns it.
struct RunContext {
    assumptions: Assumptions,
    cache: Option<Arc<dyn CacheStore>>,
    hooks: Arc<PluginHooks>,
    shared: IdentifierNamesCache,
}

pub struct ObfuscatorPlugin {
    options: ObfuscatorPluginOptions,
    obfuscator: Arc<dyn Obfuscator>,
    hooks: PluginHooksRegistry,
}

impl ObfuscatorPlugin {
    pub fn new(options: ObfuscatorPluginOptions, obfuscator: Arc<dyn Obfuscator>) -> Self {
        ObfuscatorPlugin {
            options,
            obfuscator,
            hooks: PluginHooksRegistry::new(),
        }
    }

    /// The hook set for a build-run, created lazily on first access and
    /// reused for the remainder of that run.
    pub fn hooks_for_run(&self, id: CompilationId) -> Arc<PluginHooks> {
        self.hooks.get_or_create(id)
    }

    /// Pipeline placement requested at construction time.
    pub fn stage(&self) -> i32 {
        self.options.stage()
    }

    fn cache_enabled(&self, assumptions: &Assumptions) -> bool {
        self.options.cache.or(assumptions.hmr).unwrap_or(false)
    }

    /// Processes every eligible asset of one build-run and returns the final
    /// shared registry snapshot, after the `done` hook has settled.
    pub async fn process_assets<C: Compilation>(
        &self,
        compilation: &mut C,
    ) -> Result<IdentifierNamesCache, PluginError> {
        let run_id = compilation.id();
        let hooks = self.hooks.get_or_create(run_id);

        if let Some(setup) = &self.options.setup_hooks {
            setup(run_id, &hooks);
        }

        let assumptions = prepare_assumptions(
            compilation.config(),
            compilation.browserslist(),
            AssumptionsPreparationOptions {
                options: self.options.options.as_ref(),
                overrides: self.options.assumptions.as_ref(),
            },
        );

        let cache = self
            .cache_enabled(&assumptions)
            .then(|| compilation.cache(PLUGIN_NAME));

        // The shared registry is reset for every run, seeded from the
        // caller's option overrides when present.
        let shared = merge(
            None,
            self.options
                .options
                .as_ref()
                .and_then(|overrides| overrides.identifier_names_cache.as_ref()),
        );

        let mut ctx = RunContext {
            assumptions,
            cache,
            hooks,
            shared,
        };

        for asset_name in compilation.asset_names() {
            if !self.should_obfuscate_asset(compilation, &ctx, &asset_name) {
                continue;
            }
            self.obfuscate_asset(compilation, &mut ctx, &asset_name)
                .await?;
        }

        ctx.hooks.done.call(&ctx.shared).await;
        self.hooks.remove(run_id);

        Ok(ctx.shared)
    }

    fn should_obfuscate_asset<C: Compilation>(
        &self,
        compilation: &C,
        ctx: &RunContext,
        asset_name: &str,
    ) -> bool {
        let asset = match compilation.asset(asset_name) {
            Ok(Some(asset)) => asset,
            Ok(None) => return false,
            Err(err) => {
                tracing::error!(
                    compilation = compilation.id(),
                    asset = asset_name,
                    error = %err,
                    "skipping unreadable asset"
                );
                return false;
            }
        };

        // With caching active a cached-as-obfuscated asset must not be
        // processed twice; without it, re-processing is the correct path.
        if asset.info.obfuscated && ctx.cache.is_some() {
            return false;
        }

        if asset.info.development {
            return false;
        }

        matches_asset_name(
            self.options.test.as_deref(),
            &self.options.exclude,
            asset_name,
        )
    }

    /// Overrides forced onto every asset's configuration: the shared
    /// registry snapshot and the per-asset file-name metadata.
    fn per_asset_overrides(
        &self,
        asset_name: &str,
        shared: &IdentifierNamesCache,
    ) -> ObfuscatorOptionsOverrides {
        let mut overrides = self.options.options.clone().unwrap_or_default();
        overrides.identifier_names_cache = Some(shared.clone());
        overrides.input_file_name = Some(asset_name.to_string());
        overrides.source_map_file_name = Some(format!("{asset_name}.map"));
        overrides.source_map_mode = Some(SourceMapMode::Separate);
        overrides
    }

    async fn obfuscate_asset<C: Compilation>(
        &self,
        compilation: &mut C,
        ctx: &mut RunContext,
        asset_name: &str,
    ) -> Result<(), PluginError> {
        let asset = match compilation.asset(asset_name) {
            Ok(Some(asset)) => asset,
            Ok(None) => return Ok(()),
            Err(err) => {
                tracing::error!(
                    compilation = compilation.id(),
                    asset = asset_name,
                    error = %err,
                    "skipping unreadable asset"
                );
                return Ok(());
            }
        };

        let item_cache = ctx.cache.as_ref().map(|store| {
            ItemCacheFacade::new(Arc::clone(store), asset_name, asset.source.source.clone())
        });

        if let Some(item_cache) = &item_cache {
            let cached = item_cache
                .get()
                .await
                .map_err(|source| PluginError::Cache {
                    asset_name: asset_name.to_string(),
                    source,
                })?;

            if let Some(cached) = cached {
                tracing::debug!(asset = asset_name, "replaying cached obfuscation result");
                compilation.update_asset(asset_name, cached.source, None);
                merge_by_reference(&mut ctx.shared, Some(&cached.added_identifier_names_cache));
                return Ok(());
            }
        }

        let overrides = self.per_asset_overrides(asset_name, &ctx.shared);
        let mut options = resolve_obfuscator_options(&ctx.assumptions, Some(&overrides));

        ctx.hooks.pre_obfuscation.call(asset_name, &mut options).await;

        if options.identifier_names_cache.is_none() {
            tracing::warn!(
                asset = asset_name,
                "the `identifierNamesCache` option is required for consistent obfuscation"
            );
        }

        // Pre-obfuscation subscribers may have added mappings of their own.
        merge_by_reference(&mut ctx.shared, options.identifier_names_cache.as_ref());

        let result = self
            .obfuscator
            .obfuscate(&asset.source.source, &options)
            .map_err(|source| PluginError::Obfuscation {
                asset_name: asset_name.to_string(),
                source,
            })?;

        let obfuscated = SourceWithMap {
            source: result.code,
            map: result.source_map,
        };

        // The delta is only worth computing when there is a cache entry to
        // persist it in.
        let added = match (&item_cache, result.identifier_names_cache.as_ref()) {
            (Some(_), Some(new_table)) => {
                Some(select(new_table, &diff(&ctx.shared, Some(new_table))))
            }
            (Some(_), None) => Some(IdentifierNamesCache::new()),
            (None, _) => None,
        };

        merge_by_reference(&mut ctx.shared, result.identifier_names_cache.as_ref());

        ctx.hooks
            .post_obfuscation
            .call(asset_name, &obfuscated, &ctx.shared)
            .await;

        if let (Some(item_cache), Some(added)) = (&item_cache, added) {
            item_cache
                .store(&ObfuscationCacheData {
                    source: obfuscated.clone(),
                    added_identifier_names_cache: added,
                })
                .await
                .map_err(|source| PluginError::Cache {
                    asset_name: asset_name.to_string(),
                    source,
                })?;
        }

        compilation.update_asset(
            asset_name,
            obfuscated,
            Some(AssetInfo {
                obfuscated: true,
                ..asset.info
            }),
        );

        Ok(())
    }
}
