//! In-memory code-mapping table.

use std::collections::BTreeMap;

use fhir_model::{MappingEntry, VariableCategory};

/// Mapping entries keyed by source variable, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    by_variable: BTreeMap<String, usize>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` unless its variable is already mapped.
    ///
    /// Returns `false` for a duplicate; the existing entry is kept.
    pub fn insert(&mut self, entry: MappingEntry) -> bool {
        if self.by_variable.contains_key(&entry.source_variable) {
            return false;
        }
        self.by_variable
            .insert(entry.source_variable.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Looks up a variable, exact match first, then ASCII case-insensitive.
    pub fn get(&self, variable: &str) -> Option<&MappingEntry> {
        if let Some(&idx) = self.by_variable.get(variable) {
            return self.entries.get(idx);
        }
        self.entries
            .iter()
            .find(|entry| entry.source_variable.eq_ignore_ascii_case(variable))
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.get(variable).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    /// Variables of one category, in file order.
    pub fn variables_in(&self, category: VariableCategory) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.source_variable.as_str())
            .collect()
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        let mut table = MappingTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}
