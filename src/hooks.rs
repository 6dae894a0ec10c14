//! Hook Bus
//!
//! Three ordered, asynchronous extension points scoped to one build-run:
//! `pre_obfuscation` (per asset, may mutate the pending configuration),
//! `post_obfuscation` (per asset, observes the transformed source and the
//! shared registry) and `done` (once per run, observes the final registry).
//! Each phase suspends until every subscriber has settled. Subscribers run
//! in registration order; the mutating pre hook is awaited one at a time
//! because it holds an exclusive borrow, the observe-only hooks fan out and
//! are awaited together.

use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::compilation::{CompilationId, SourceWithMap};
use crate::options::ObfuscatorOptions;
use crate::registry::IdentifierNamesCache;

pub type PreObfuscationCallback =
    Arc<dyn for<'a> Fn(&'a str, &'a mut ObfuscatorOptions) -> BoxFuture<'a, ()> + Send + Sync>;

pub type PostObfuscationCallback = Arc<
    dyn for<'a> Fn(&'a str, &'a SourceWithMap, &'a IdentifierNamesCache) -> BoxFuture<'a, ()>
        + Send
        + Sync,
>;

pub type DoneCallback =
    Arc<dyn for<'a> Fn(&'a IdentifierNamesCache) -> BoxFuture<'a, ()> + Send + Sync>;

struct Tap<C> {
    #[allow(dead_code)]
    name: String,
    callback: C,
}

fn snapshot<C: Clone>(taps: &Mutex<Vec<Tap<C>>>) -> Vec<C> {
    // Clone the callback handles out so no lock is held across awaits and
    // subscribers may tap further hooks while a phase runs.
    taps.lock().iter().map(|tap| tap.callback.clone()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTENSION POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fires before the external transform for one asset; subscribers may mutate
/// the configuration in place.
#[derive(Default)]
pub struct PreObfuscationHook {
    taps: Mutex<Vec<Tap<PreObfuscationCallback>>>,
}

impl PreObfuscationHook {
    pub fn tap<F>(&self, name: impl Into<String>, callback: F)
    where
        F: for<'a> Fn(&'a str, &'a mut ObfuscatorOptions) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.taps.lock().push(Tap {
            name: name.into(),
            callback: Arc::new(callback),
        });
    }

    /// Synchronous convenience wrapper around [`PreObfuscationHook::tap`].
    pub fn tap_sync<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&str, &mut ObfuscatorOptions) + Send + Sync + 'static,
    {
        self.tap(name, move |asset_name, options| {
            callback(asset_name, options);
            Box::pin(async {})
        });
    }

    pub async fn call(&self, asset_name: &str, options: &mut ObfuscatorOptions) {
        for callback in snapshot(&self.taps) {
            callback(asset_name, &mut *options).await;
        }
    }
}

/// Fires after a successful transform, once the shared registry has absorbed
/// the new renames.
#[derive(Default)]
pub struct PostObfuscationHook {
    taps: Mutex<Vec<Tap<PostObfuscationCallback>>>,
}

impl PostObfuscationHook {
    pub fn tap<F>(&self, name: impl Into<String>, callback: F)
    where
        F: for<'a> Fn(&'a str, &'a SourceWithMap, &'a IdentifierNamesCache) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.taps.lock().push(Tap {
            name: name.into(),
            callback: Arc::new(callback),
        });
    }

    pub fn tap_sync<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&str, &SourceWithMap, &IdentifierNamesCache) + Send + Sync + 'static,
    {
        self.tap(name, move |asset_name, source, registry| {
            callback(asset_name, source, registry);
            Box::pin(async {})
        });
    }

    pub async fn call(
        &self,
        asset_name: &str,
        source: &SourceWithMap,
        registry: &IdentifierNamesCache,
    ) {
        let callbacks = snapshot(&self.taps);
        join_all(
            callbacks
                .iter()
                .map(|callback| callback(asset_name, source, registry)),
        )
        .await;
    }
}

/// Fires once per build-run after every eligible asset has been processed.
#[derive(Default)]
pub struct DoneHook {
    taps: Mutex<Vec<Tap<DoneCallback>>>,
}

impl DoneHook {
    pub fn tap<F>(&self, name: impl Into<String>, callback: F)
    where
        F: for<'a> Fn(&'a IdentifierNamesCache) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.taps.lock().push(Tap {
            name: name.into(),
            callback: Arc::new(callback),
        });
    }

    pub fn tap_sync<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&IdentifierNamesCache) + Send + Sync + 'static,
    {
        self.tap(name, move |registry| {
            callback(registry);
            Box::pin(async {})
        });
    }

    pub async fn call(&self, registry: &IdentifierNamesCache) {
        let callbacks = snapshot(&self.taps);
        join_all(callbacks.iter().map(|callback| callback(registry))).await;
    }
}

/// One build-run's set of extension points.
#[derive(Default)]
pub struct PluginHooks {
    pub pre_obfuscation: PreObfuscationHook,
    pub post_obfuscation: PostObfuscationHook,
    pub done: DoneHook,
}

impl PluginHooks {
    pub fn new() -> Self {
        PluginHooks::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-RUN REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Explicit ownership of hook sets per build-run: lazily created on first
/// access, removed when the run ends. Nothing leaks across concurrent runs.
#[derive(Default)]
pub struct PluginHooksRegistry {
    by_run: Mutex<HashMap<CompilationId, Arc<PluginHooks>>>,
}

impl PluginHooksRegistry {
    pub fn new() -> Self {
        PluginHooksRegistry::default()
    }

    pub fn get_or_create(&self, id: CompilationId) -> Arc<PluginHooks> {
        Arc::clone(
            self.by_run
                .lock()
                .entry(id)
                .or_insert_with(|| Arc::new(PluginHooks::new())),
        )
    }

    pub fn remove(&self, id: CompilationId) -> Option<Arc<PluginHooks>> {
        self.by_run.lock().remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Assumptions;
    use crate::options::resolve_obfuscator_options;
    use parking_lot::Mutex as PlMutex;

    #[tokio::test]
    async fn test_pre_hook_subscribers_run_in_registration_order() {
        let hook = PreObfuscationHook::default();
        hook.tap_sync("first", |_, options| {
            options.identifiers_prefix = "a".to_string();
        });
        hook.tap_sync("second", |_, options| {
            options.identifiers_prefix.push('b');
        });

        let mut options = resolve_obfuscator_options(&Assumptions::default(), None);
        hook.call("main.js", &mut options).await;

        assert_eq!(options.identifiers_prefix, "ab");
    }

    #[tokio::test]
    async fn test_pre_hook_async_subscriber_settles_before_phase_continues() {
        let hook = PreObfuscationHook::default();
        hook.tap("async", |_, options| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                options.compact = false;
            })
        });

        let mut options = resolve_obfuscator_options(&Assumptions::default(), None);
        hook.call("main.js", &mut options).await;

        assert!(!options.compact);
    }

    #[tokio::test]
    async fn test_done_hook_fans_out_to_every_subscriber() {
        let hook = DoneHook::default();
        let seen = Arc::new(PlMutex::new(Vec::new()));

        for tag in ["x", "y", "z"] {
            let seen = Arc::clone(&seen);
            hook.tap_sync(tag, move |_| {
                seen.lock().push(tag);
            });
        }

        hook.call(&IdentifierNamesCache::new()).await;

        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_hook_sets_are_isolated_per_run() {
        let registry = PluginHooksRegistry::new();

        let first = registry.get_or_create(1);
        let again = registry.get_or_create(1);
        let other = registry.get_or_create(2);

        assert!(Arc::ptr_eq(&first, &again), "same run reuses its hook set");
        assert!(!Arc::ptr_eq(&first, &other), "runs must not share hooks");

        assert!(registry.remove(1).is_some());
        let recreated = registry.get_or_create(1);
        assert!(!Arc::ptr_eq(&first, &recreated), "removal ends the set's life");
    }
}
