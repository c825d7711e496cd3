//! Materialized resources by declaration name
use crate::backend::ResourceHandle;
use indexmap::IndexMap;

/// Append-only, ordered store of handles
///
/// Only names registered so far are visible to references, which is what makes resolution
/// follow document order.
#[derive(Debug, Default)]
pub struct Registry {
    handles: IndexMap<String, Box<dyn ResourceHandle>>,
}

impl Registry {
    /// Register `handle` under `name`
    ///
    /// Existing entries are never replaced, the rejected handle is returned instead.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handle: Box<dyn ResourceHandle>,
    ) -> Result<(), Box<dyn ResourceHandle>> {
        let name = name.into();
        if self.handles.contains_key(&name) {
            return Err(handle);
        }

        tracing::trace!(%name, "registered");
        self.handles.insert(name, handle);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ResourceHandle> {
        self.handles.get(name).map(|handle| &**handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ResourceHandle)> {
        self.handles
            .iter()
            .map(|(name, handle)| (name.as_str(), &**handle))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
