//! Host boundary: the trait the core talks to, and the data model a module
//! scan yields. The real host is an opaque process; everything here is the
//! introspection view of it, not something this crate defines or validates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{ImplantRecord, SlotLayout};

pub mod fixture;
pub mod validate;

pub use fixture::{load_fixture_host, FixtureHost, DEFAULT_HOST_PATH};

/// One dynamically loaded unit of host code contributing types to the
/// runtime type universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostModule {
    pub name: String,
    /// Types visible in this module. `None` models a module that cannot be
    /// introspected at all; the resolver skips it and moves on.
    pub types: Option<Vec<HostType>>,
}

/// A type as seen through the host's introspection facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostType {
    pub name: String,
    /// Public static fields, flattened across the inheritance chain.
    #[serde(default)]
    pub fields: Vec<StaticField>,
    /// Public nested types, one level deep. The host sometimes groups
    /// identifier constants inside these instead of on the type itself.
    #[serde(default)]
    pub nested: Vec<HostType>,
}

/// A public static field and its runtime value. Values arrive dynamically
/// typed; whether one is usable as an identifier is decided at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticField {
    pub name: String,
    pub value: Value,
}

impl StaticField {
    /// The field's value as an unsigned 32-bit identifier, if it is one.
    /// Only non-negative integers within u32 range qualify; floats, strings,
    /// booleans and out-of-range integers are not identifiers.
    pub fn value_as_u32(&self) -> Option<u32> {
        self.value.as_u64().and_then(|raw| u32::try_from(raw).ok())
    }
}

/// Opaque handle to a network participant in the host's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
}

/// Everything the core needs from the running host. One trait because in the
/// host process these are all facilities of the same runtime; test fakes and
/// the JSON fixture implement it wholesale.
pub trait HostRuntime {
    /// Modules currently loaded, in host enumeration order. The order is not
    /// stable across runs; callers must not rely on it.
    fn modules(&self) -> &[HostModule];

    /// Whether the local participant holds session authority. Implementations
    /// must fail closed: if authority cannot be determined, return false.
    fn is_authoritative(&self) -> bool;

    /// Slot capacities of the host's implant record layout.
    fn slot_layout(&self) -> SlotLayout;

    /// A template-seeded base record carrying the host's defaults for the
    /// given template, or `None` when the host cannot seed it.
    fn base_record(&self, template_id: u32) -> Option<ImplantRecord>;

    /// The local network participant, when one exists.
    fn local_participant(&self) -> Option<Participant>;

    /// Hand a finished record to the host's replication primitive. The
    /// boolean is the host's verdict, passed through verbatim.
    fn sync_set_record(&mut self, participant: &Participant, record: &ImplantRecord) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: Value) -> StaticField {
        StaticField {
            name: "X".to_string(),
            value,
        }
    }

    #[test]
    fn integer_values_within_u32_range_are_identifiers() {
        assert_eq!(field(json!(0)).value_as_u32(), Some(0));
        assert_eq!(field(json!(41)).value_as_u32(), Some(41));
        assert_eq!(field(json!(u32::MAX)).value_as_u32(), Some(u32::MAX));
    }

    #[test]
    fn non_identifier_values_are_rejected() {
        assert_eq!(field(json!(-1)).value_as_u32(), None);
        assert_eq!(field(json!(u64::from(u32::MAX) + 1)).value_as_u32(), None);
        assert_eq!(field(json!(2.5)).value_as_u32(), None);
        assert_eq!(field(json!("41")).value_as_u32(), None);
        assert_eq!(field(json!(true)).value_as_u32(), None);
        assert_eq!(field(Value::Null).value_as_u32(), None);
    }
}
