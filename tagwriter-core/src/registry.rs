//! Name → processor map.
//!
//! Expected use is setup-time registration with concurrent readers from
//! playback tasks. A session resolves each tag only when it reaches it, so a
//! registry change mid-playback affects only tags not yet reached.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use tagwriter_signal::ActionHub;

use crate::processors::markup::STYLE_TAGS;
use crate::processors::{
    ActionProcessor, AsyncTagProcessor, BreakProcessor, ClearProcessor, MarkupProcessor,
    PauseProcessor, ProcessorHandle, SpeedProcessor, SpeedRegionProcessor, TagProcessor,
};

#[derive(Debug)]
pub struct ProcessorRegistry {
    processors: RwLock<HashMap<String, ProcessorHandle>>,
    /// Hub the builtin `action` processor fires.
    hub: Arc<ActionHub>,
}

static DEFAULT_REGISTRY: OnceLock<Arc<ProcessorRegistry>> = OnceLock::new();

impl ProcessorRegistry {
    /// An empty registry bound to `hub`.
    pub fn empty(hub: Arc<ActionHub>) -> Self {
        Self {
            processors: RwLock::new(HashMap::new()),
            hub,
        }
    }

    /// Builtins wired to the process-wide action hub.
    pub fn with_builtins() -> Self {
        Self::with_hub(ActionHub::global())
    }

    /// Builtins wired to `hub`.
    pub fn with_hub(hub: Arc<ActionHub>) -> Self {
        let registry = Self::empty(hub);
        registry.reset_to_builtins();
        registry
    }

    /// Fallback shared registry, seeded on first use. Prefer constructing one
    /// at startup and passing it to each `Typewriter`.
    pub fn global() -> Arc<ProcessorRegistry> {
        DEFAULT_REGISTRY
            .get_or_init(|| Arc::new(ProcessorRegistry::with_builtins()))
            .clone()
    }

    pub fn hub(&self) -> &Arc<ActionHub> {
        &self.hub
    }

    /// Insert `handle` under its lower-cased name, replacing any previous one.
    pub fn register(&self, handle: ProcessorHandle) {
        let name = handle.name().trim().to_lowercase();
        let replaced = self
            .processors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.clone(), handle)
            .is_some();
        tracing::debug!(%name, replaced, "processor registered");
    }

    pub fn register_sync<P: TagProcessor + 'static>(&self, processor: P) {
        self.register(ProcessorHandle::sync(processor));
    }

    pub fn register_async<P: AsyncTagProcessor + 'static>(&self, processor: P) {
        self.register(ProcessorHandle::asynchronous(processor));
    }

    /// Returns false if nothing was registered under `name`.
    pub fn unregister(&self, name: &str) -> bool {
        self.processors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&normalize(name))
            .is_some()
    }

    pub fn get(&self, name: &str) -> Option<ProcessorHandle> {
        self.processors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalize(name))
            .cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.processors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&normalize(name))
    }

    /// Sorted.
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .processors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.processors.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.processors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Drop everything, then register the builtin set.
    pub fn reset_to_builtins(&self) {
        let mut builtins = vec![
            ProcessorHandle::sync(SpeedProcessor),
            ProcessorHandle::sync(SpeedRegionProcessor),
            ProcessorHandle::asynchronous(PauseProcessor),
            ProcessorHandle::sync(ClearProcessor),
            ProcessorHandle::sync(BreakProcessor::br()),
            ProcessorHandle::sync(BreakProcessor::n()),
            ProcessorHandle::sync(ActionProcessor::new(self.hub.clone())),
        ];
        builtins.extend(
            STYLE_TAGS
                .iter()
                .map(|name| ProcessorHandle::sync(MarkupProcessor::new(*name))),
        );

        let mut map = self.processors.write().unwrap_or_else(|e| e.into_inner());
        map.clear();
        for handle in builtins {
            map.insert(handle.name().to_string(), handle);
        }
        tracing::debug!(count = map.len(), "registry reset to builtins");
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
