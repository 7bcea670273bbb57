use crate::error::OrmResult;
use crate::record::AnyRecord;
use std::collections::{HashMap, HashSet};

/// Per-call cache for multi-table row decoding.
///
/// Keeps one record per (table slug, identifier) so rows repeating an entity
/// share its record, and remembers which relation bindings were already
/// applied to which pair of records.
#[derive(Debug, Default)]
pub struct QueryModelsCache {
    models: HashMap<String, HashMap<Vec<String>, Option<AnyRecord>>>,
    relations: HashMap<Vec<String>, HashSet<(usize, usize)>>,
    // Records referenced by `relations`; holding them keeps addresses unique.
    keep_alive: Vec<AnyRecord>,
}

impl QueryModelsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached record for `id_parts` within `category`, or build it
    /// with `create` and cache the result. Empty `id_parts` disable caching.
    pub fn support_model_instance<F>(
        &mut self,
        category: &str,
        id_parts: &[String],
        create: F,
    ) -> OrmResult<Option<AnyRecord>>
    where
        F: FnOnce() -> OrmResult<Option<AnyRecord>>,
    {
        if id_parts.is_empty() {
            return create();
        }
        if let Some(cached) = self.models.get(category).and_then(|models| models.get(id_parts)) {
            return Ok(cached.clone());
        }
        let record = create()?;
        self.models
            .entry(category.to_string())
            .or_default()
            .insert(id_parts.to_vec(), record.clone());
        Ok(record)
    }

    /// Record that the relation `category_path` was applied to the ordered
    /// pair (`first`, `second`). Returns `true` when it already was.
    pub fn relation_exists_once(
        &mut self,
        category_path: &[&str],
        first: &AnyRecord,
        second: &AnyRecord,
    ) -> bool {
        let category = category_path.iter().map(|part| part.to_string()).collect();
        let inserted = self
            .relations
            .entry(category)
            .or_default()
            .insert((first.addr(), second.addr()));
        if inserted {
            self.keep_alive.push(first.clone());
            self.keep_alive.push(second.clone());
        }
        !inserted
    }
}
