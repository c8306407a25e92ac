//! Scope-isolated read model storage abstractions.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use ledgerly_core::Scope;

/// Scope-isolated key/value store abstraction for disposable read models.
pub trait ScopedStore<K, V>: Send + Sync {
    fn get(&self, scope: Scope, key: &K) -> Option<V>;
    fn upsert(&self, scope: Scope, key: K, value: V);
    fn list(&self, scope: Scope) -> Vec<V>;
    /// Clear all read-model records for a scope (rebuild support).
    fn clear_scope(&self, scope: Scope);
}

impl<K, V, S> ScopedStore<K, V> for Arc<S>
where
    S: ScopedStore<K, V> + ?Sized,
{
    fn get(&self, scope: Scope, key: &K) -> Option<V> {
        (**self).get(scope, key)
    }

    fn upsert(&self, scope: Scope, key: K, value: V) {
        (**self).upsert(scope, key, value)
    }

    fn list(&self, scope: Scope) -> Vec<V> {
        (**self).list(scope)
    }

    fn clear_scope(&self, scope: Scope) {
        (**self).clear_scope(scope)
    }
}

/// In-memory scope-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemoryScopedStore<K, V> {
    inner: RwLock<HashMap<(Scope, K), V>>,
}

impl<K, V> InMemoryScopedStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryScopedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ScopedStore<K, V> for InMemoryScopedStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, scope: Scope, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(scope, key.clone())).cloned()
    }

    fn upsert(&self, scope: Scope, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((scope, key), value);
        }
    }

    fn list(&self, scope: Scope) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((s, _k), v)| if *s == scope { Some(v.clone()) } else { None })
            .collect()
    }

    fn clear_scope(&self, scope: Scope) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(s, _k), _v| *s != scope);
        }
    }
}
