//! Constant extraction: public static u32 fields of a resolved type, or of
//! its nested types when the type itself declares none. The host uses both
//! layouts and never says which applies, so the builder tries both.

use serde::Serialize;

use crate::host::HostType;

use super::ResolvedType;

/// Insertion-ordered mapping from constant name to its u32 identifier.
/// Names are unique; inserting an existing name overwrites the value in
/// place (last write wins, original position kept). Values are not required
/// to be unique, so reverse lookup returns the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstantMap {
    entries: Vec<(String, u32)>,
}

impl ConstantMap {
    pub fn new() -> ConstantMap {
        ConstantMap::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: u32) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    /// Display name for an identifier, first match in insertion order.
    pub fn name_of(&self, value: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, existing)| *existing == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_fields(ty: &HostType, map: &mut ConstantMap) {
    for field in &ty.fields {
        // Fields whose value cannot be read as a u32 identifier are skipped,
        // not an error.
        if let Some(value) = field.value_as_u32() {
            map.insert(field.name.clone(), value);
        }
    }
}

/// Extract the name -> identifier map of a resolved type.
///
/// Tier 1 reads the type's own flattened static fields. Only when that
/// yields nothing does tier 2 scan each public nested type one level deep
/// and merge every usable field into a single map. Always returns a map;
/// an empty one is the universal discovery-failure signal for the category.
pub fn build_constant_map(resolved: &ResolvedType<'_>) -> ConstantMap {
    let mut map = ConstantMap::new();
    collect_fields(resolved.ty, &mut map);

    if map.is_empty() {
        for nested in &resolved.ty.nested {
            collect_fields(nested, &mut map);
        }
    }

    map
}
