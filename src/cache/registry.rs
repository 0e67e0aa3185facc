//! Named and cached bundle registries.

use dashmap::DashMap;

use crate::bundle::BundleState;
use crate::error::{BundleError, Result};

/// A bundle definition registered under a name.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Mode captured at registration; `render_named` always uses it.
    pub debug: bool,
    pub output: String,
    pub state: BundleState,
}

/// Process-wide name -> bundle maps, owned by a `Bundler`.
///
/// Re-registering a name replaces the previous entry.
#[derive(Default)]
pub struct RegistryStore {
    named: DashMap<String, RegistryEntry>,
    cached: DashMap<String, RegistryEntry>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_named(&self, name: &str, entry: RegistryEntry) {
        self.named.insert(name.to_string(), entry);
    }

    pub fn register_cached(&self, name: &str, entry: RegistryEntry) {
        self.cached.insert(name.to_string(), entry);
    }

    pub fn named(&self, name: &str) -> Result<RegistryEntry> {
        lookup(&self.named, name)
    }

    pub fn cached(&self, name: &str) -> Result<RegistryEntry> {
        lookup(&self.cached, name)
    }

    /// Sorted names registered with `as_named`.
    pub fn named_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.named.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Remove `name` from both registries. `true` if either held it.
    pub fn remove(&self, name: &str) -> bool {
        let named = self.named.remove(name).is_some();
        let cached = self.cached.remove(name).is_some();
        named || cached
    }

    pub fn clear(&self) {
        self.named.clear();
        self.cached.clear();
    }
}

fn lookup(map: &DashMap<String, RegistryEntry>, name: &str) -> Result<RegistryEntry> {
    map.get(name)
        .map(|entry| entry.clone())
        .ok_or_else(|| BundleError::UnregisteredName {
            name: name.to_string(),
        })
}
