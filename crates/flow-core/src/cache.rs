//! Cache acotada `(name, identifier) -> Flow`.
//!
//! Evita un viaje al storage en llamadas repetidas a `get_flow` dentro del
//! mismo proceso. Política:
//! - deshabilitada: `get` siempre falla y `set`/`delete` no hacen nada.
//! - habilitada con capacidad N: insertar una clave nueva con N entradas
//!   residentes desaloja una entrada arbitraria (sin LRU).
//! - capacidad 0 equivale a deshabilitada.
//!
//! Lecturas concurrentes, escrituras exclusivas (`RwLock`).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::Flow;

type CacheKey = (String, String);

fn cache_key(name: &str, identifier: Option<&str>) -> CacheKey {
    (name.to_string(), identifier.unwrap_or("").to_string())
}

#[derive(Debug)]
pub struct FlowCache {
    enabled: bool,
    max_size: usize,
    entries: RwLock<HashMap<CacheKey, Flow>>,
}

impl FlowCache {
    pub fn new(enabled: bool, max_size: usize) -> Self {
        let enabled = enabled && max_size > 0;
        let capacity = if enabled { max_size.min(1024) } else { 0 };
        Self { enabled,
               max_size,
               entries: RwLock::new(HashMap::with_capacity(capacity)) }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, name: &str, identifier: Option<&str>) -> Option<Flow> {
        if !self.enabled {
            return None;
        }
        self.read().get(&cache_key(name, identifier)).cloned()
    }

    pub fn set(&self, name: &str, identifier: Option<&str>, flow: Flow) {
        if !self.enabled {
            return;
        }
        let key = cache_key(name, identifier);
        let mut entries = self.write();
        if !entries.contains_key(&key) && entries.len() >= self.max_size {
            if let Some(victim) = entries.keys().next().cloned() {
                entries.remove(&victim);
            }
        }
        entries.insert(key, flow);
    }

    pub fn delete(&self, name: &str, identifier: Option<&str>) {
        if !self.enabled {
            return;
        }
        self.write().remove(&cache_key(name, identifier));
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Envenenamiento ignorado: el mapa nunca queda a medio mutar.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Flow>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Flow>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FlowCache {
    fn default() -> Self {
        Self::disabled()
    }
}
