//! Symbolic name to engine filter id mapping for one build cycle.

use crate::error::{Error, Result};
use mvgraph_engine::FilterId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A filter the engine created for this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterInstance {
    pub symbolic_name: String,
    pub id: FilterId,
}

#[derive(Debug, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterId>,
    attached: HashSet<String>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`Error::DuplicateName`] if `name` is taken.
    pub fn ensure_vacant(&self, name: &str) -> Result<()> {
        if self.filters.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn register(&mut self, name: &str, id: FilterId) -> Result<()> {
        self.ensure_vacant(name)?;
        self.filters.insert(name.to_string(), id);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<FilterId> {
        self.filters
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownFilter(name.to_string()))
    }

    pub fn mark_attached(&mut self, name: &str) -> Result<()> {
        self.lookup(name)?;
        self.attached.insert(name.to_string());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterId> {
        self.attached.remove(name);
        self.filters.remove(name)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.attached.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Every registered filter, ordered by name.
    pub fn instances(&self) -> Vec<FilterInstance> {
        let mut instances: Vec<_> = self
            .filters
            .iter()
            .map(|(name, id)| FilterInstance {
                symbolic_name: name.clone(),
                id: *id,
            })
            .collect();
        instances.sort_by(|a, b| a.symbolic_name.cmp(&b.symbolic_name));
        instances
    }

    /// Attached filters, ordered by engine id.
    pub fn attached(&self) -> Vec<FilterInstance> {
        let mut instances: Vec<_> = self
            .attached
            .iter()
            .filter_map(|name| {
                self.filters.get(name).map(|id| FilterInstance {
                    symbolic_name: name.clone(),
                    id: *id,
                })
            })
            .collect();
        instances.sort_by_key(|f| f.id);
        instances
    }
}
