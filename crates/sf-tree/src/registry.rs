//! Object types seen during an export, with their insert order and
//! reference flags.

use tracing::warn;

/// Registry entry for one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub sobject: String,
    pub order: usize,
    /// Ids returned when inserting this type are needed by later files.
    pub save_refs: bool,
    /// Files of this type hold references to earlier inserts.
    pub resolve_refs: bool,
}

/// Types in registration order plus the dependency edges between them.
#[derive(Debug, Default)]
pub struct ObjectTypeRegistry {
    entries: Vec<TypeEntry>,
    /// `(referencing, referenced)` entry indexes.
    edges: Vec<(usize, usize)>,
}

impl ObjectTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sobject` unless already known. Returns whether it was new.
    pub fn register(
        &mut self,
        sobject: &str,
        order: usize,
        save_refs: bool,
        resolve_refs: bool,
    ) -> bool {
        if self.contains(sobject) {
            return false;
        }
        self.entries.push(TypeEntry {
            sobject: sobject.to_string(),
            order,
            save_refs,
            resolve_refs,
        });
        true
    }

    pub fn contains(&self, sobject: &str) -> bool {
        self.index_of(sobject).is_some()
    }

    pub fn get(&self, sobject: &str) -> Option<&TypeEntry> {
        self.index_of(sobject).map(|i| &self.entries[i])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    /// Type names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.sobject.clone()).collect()
    }

    /// Record that records of `referencing` point at records of
    /// `referenced`. Unregistered types are ignored.
    pub fn add_dependency(&mut self, referencing: &str, referenced: &str) {
        let (Some(from), Some(to)) = (self.index_of(referencing), self.index_of(referenced)) else {
            return;
        };

        self.entries[to].save_refs = true;
        self.entries[from].resolve_refs = true;

        if from != to && !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
    }

    /// Raise orders until every referencing type sits above the types it
    /// references.
    ///
    /// Cycles between distinct types can never satisfy that; they are
    /// reported and relaxation stops after one round per type.
    pub fn resolve_order(&mut self) {
        for _ in 0..self.entries.len() {
            if !self.relax() {
                return;
            }
        }

        let cycle: Vec<&str> = self
            .edges
            .iter()
            .filter(|&&(from, to)| self.entries[from].order <= self.entries[to].order)
            .map(|&(from, _)| self.entries[from].sobject.as_str())
            .collect();
        if !cycle.is_empty() {
            warn!(types = ?cycle, "Circular dependency between object types; insert order may fail");
        }
    }

    fn relax(&mut self) -> bool {
        let mut changed = false;
        for &(from, to) in &self.edges {
            let required = self.entries[to].order + 1;
            if self.entries[from].order < required {
                self.entries[from].order = required;
                changed = true;
            }
        }
        changed
    }

    /// Entries by ascending order; ties keep registration order.
    pub fn sorted(&self) -> Vec<&TypeEntry> {
        let mut sorted: Vec<&TypeEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.order);
        sorted
    }

    fn index_of(&self, sobject: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.sobject == sobject)
    }
}
