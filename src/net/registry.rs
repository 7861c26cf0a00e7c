// Uniform name-indexed containers shared by the four net registries
// (places, transitions, actions, conditions) -- the "ManagerBase pattern"

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{PtnError, PtnResult};

/// Anything that can be stored in a [`Registry`] carries its own name.
pub trait Named {
    fn name(&self) -> &str;
}

struct RegistryInner<T> {
    items: Vec<Arc<T>>,
    by_name: HashMap<String, usize>,
}

/// Arena-style registry for places and transitions.
///
/// Items are strongly owned here and only here: callers that need to refer
/// to an item across calls hold its `usize` index, not the `Arc` itself, so
/// the registry remains the sole owner and nothing can keep an item alive
/// past a `clear()` -- the Rust stand-in for the original engine's
/// shared/weak pointer split (see the "weak back-references" design note).
pub struct Registry<T> {
    inner: RwLock<RegistryInner<T>>,
}

impl<T: Named> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                items: Vec::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .by_name
            .contains_key(name)
    }

    /// Insert a new item, returning its stable index. Rejects an empty name
    /// or a name already present in this registry.
    pub fn insert(&self, item: T) -> PtnResult<usize> {
        let name = item.name().to_string();
        if name.is_empty() {
            return Err(PtnError::InvalidName(String::new()));
        }
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if inner.by_name.contains_key(&name) {
            return Err(PtnError::RepeatedName(name));
        }
        let index = inner.items.len();
        inner.items.push(Arc::new(item));
        inner.by_name.insert(name, index);
        Ok(index)
    }

    pub fn get_by_index(&self, index: usize) -> Arc<T> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .items
            .get(index)
            .cloned()
            .expect("PlaceId/TransitionId must always index a live registry entry")
    }

    pub fn get_by_name(&self, name: &str) -> PtnResult<Arc<T>> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let index = *inner
            .by_name
            .get(name)
            .ok_or_else(|| PtnError::InvalidName(name.to_string()))?;
        Ok(inner.items[index].clone())
    }

    pub fn index_of(&self, name: &str) -> PtnResult<usize> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| PtnError::InvalidName(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter_indices(&self) -> std::ops::Range<usize> {
        0..self.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner.items.clear();
        inner.by_name.clear();
    }
}

impl<T: Named> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain name -> callback map, used for the action and condition registries.
///
/// Unlike [`Registry`], the name here isn't derived from the item -- a
/// callback is just a closure -- so it's supplied explicitly at
/// `register_action` / `register_condition` time. Write-once during setup,
/// per the spec; a `RwLock<HashMap<_>>` is simple enough that a bespoke
/// arena buys nothing here.
pub struct NameMap<T: Clone> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T: Clone> NameMap<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().expect("name map lock poisoned").contains_key(name)
    }

    pub fn insert(&self, name: &str, item: T) -> PtnResult<()> {
        if name.is_empty() {
            return Err(PtnError::InvalidName(String::new()));
        }
        let mut inner = self.inner.write().expect("name map lock poisoned");
        if inner.contains_key(name) {
            return Err(PtnError::RepeatedName(name.to_string()));
        }
        inner.insert(name.to_string(), item);
        Ok(())
    }

    pub fn get(&self, name: &str) -> PtnResult<T> {
        self.inner
            .read()
            .expect("name map lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| PtnError::InvalidName(name.to_string()))
    }

    pub fn clear(&self) {
        self.inner.write().expect("name map lock poisoned").clear();
    }
}

impl<T: Clone> Default for NameMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
