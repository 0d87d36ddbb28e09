use std::sync::{Arc, OnceLock};

use ambit_common::{BuiltinRequestContext, ContextConfig};
use dashmap::DashMap;

/// Well-known registration slots a hosting platform may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Primary,
    /// Deprecated alias kept until every host registers under [`SlotKey::Primary`].
    Legacy,
}

impl SlotKey {
    /// Lookup priority, highest first.
    pub const LOOKUP_ORDER: [SlotKey; 2] = [SlotKey::Primary, SlotKey::Legacy];

    pub const fn symbol(self) -> &'static str {
        match self {
            SlotKey::Primary => "@next/request-context",
            SlotKey::Legacy => "@vercel/request-context",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::LOOKUP_ORDER
            .into_iter()
            .find(|key| key.symbol() == symbol)
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Registry of request context providers installed by the host.
pub struct AmbientSlots {
    slots: DashMap<SlotKey, Arc<dyn BuiltinRequestContext>>,
    legacy_fallback: bool,
}

impl AmbientSlots {
    pub fn new() -> Self {
        Self::with_legacy_fallback(true)
    }

    pub fn with_legacy_fallback(legacy_fallback: bool) -> Self {
        Self {
            slots: DashMap::new(),
            legacy_fallback,
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::with_legacy_fallback(config.legacy_fallback)
    }

    /// Process-wide registry, configured from the environment on first use.
    pub fn global() -> &'static AmbientSlots {
        static GLOBAL: OnceLock<AmbientSlots> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::from_config(&ContextConfig::from_env()))
    }

    pub fn legacy_fallback(&self) -> bool {
        self.legacy_fallback
    }

    /// Install `provider` under `key`, returning whatever it displaced.
    pub fn install(
        &self,
        key: SlotKey,
        provider: Arc<dyn BuiltinRequestContext>,
    ) -> Option<Arc<dyn BuiltinRequestContext>> {
        let previous = self.slots.insert(key, provider);
        tracing::debug!(slot=%key, replaced = previous.is_some(), "request context provider installed");
        previous
    }

    pub fn remove(&self, key: SlotKey) -> Option<Arc<dyn BuiltinRequestContext>> {
        let removed = self.slots.remove(&key).map(|(_, provider)| provider);
        if removed.is_some() {
            tracing::debug!(slot=%key, "request context provider removed");
        }
        removed
    }

    pub fn is_installed(&self, key: SlotKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn provider(&self, key: SlotKey) -> Option<Arc<dyn BuiltinRequestContext>> {
        self.slots.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// First populated slot in lookup order. The returned provider is detached
    /// from the map so callers may invoke it without holding a shard lock.
    pub fn resolve(&self) -> Option<(SlotKey, Arc<dyn BuiltinRequestContext>)> {
        SlotKey::LOOKUP_ORDER
            .into_iter()
            .filter(|key| *key == SlotKey::Primary || self.legacy_fallback)
            .find_map(|key| self.provider(key).map(|provider| (key, provider)))
    }
}

impl Default for AmbientSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AmbientSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let installed: Vec<SlotKey> = SlotKey::LOOKUP_ORDER
            .into_iter()
            .filter(|key| self.is_installed(*key))
            .collect();
        f.debug_struct("AmbientSlots")
            .field("installed", &installed)
            .field("legacy_fallback", &self.legacy_fallback)
            .finish()
    }
}
