//! FixtureHost: a [HostRuntime] defined by a JSON document. Used by the CLI,
//! the console server and the tests; module order in the file is the
//! enumeration order, so fixtures freeze what the real host leaves unstable.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::host::{HostModule, HostRuntime, Participant};
use crate::record::{clamp_uses, EffectSelection, EffectSlot, ImplantRecord, SlotLayout};

pub const DEFAULT_HOST_PATH: &str = "data/host.json";

const DEFAULT_SLOT_LAYOUT: SlotLayout = SlotLayout {
    effect_slots: 4,
    condition_slots: 2,
};

fn default_slot_layout() -> SlotLayout {
    DEFAULT_SLOT_LAYOUT
}

/// Host-side default composition for one template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSeed {
    pub id: u32,
    #[serde(default)]
    pub effects: Vec<EffectSelection>,
    #[serde(default)]
    pub conditions: Vec<u32>,
    #[serde(default = "default_seed_uses")]
    pub uses: i64,
}

fn default_seed_uses() -> i64 {
    1
}

/// One record the fixture accepted for replication.
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogEntry {
    pub participant: String,
    pub record: ImplantRecord,
    pub synced_at: String,
}

/// A scriptable host: module universe, authority flag, template seeds and a
/// sync switch all come from JSON; replicated records land in an in-memory
/// log instead of a network session.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureHost {
    #[serde(default)]
    authoritative: bool,
    #[serde(default)]
    local_participant: Option<String>,
    #[serde(default = "default_slot_layout")]
    slot_layout: SlotLayout,
    /// When set, sync_set_record reports failure without logging anything.
    #[serde(default)]
    reject_sync: bool,
    #[serde(default)]
    modules: Vec<HostModule>,
    #[serde(default)]
    templates: Vec<TemplateSeed>,
    #[serde(skip)]
    sync_log: Vec<SyncLogEntry>,
}

impl FixtureHost {
    /// An authoritative host with a local participant and default layout.
    /// Test helper; fixtures loaded from disk set everything explicitly.
    pub fn with_modules(modules: Vec<HostModule>) -> FixtureHost {
        FixtureHost {
            authoritative: true,
            local_participant: Some("local".to_string()),
            slot_layout: DEFAULT_SLOT_LAYOUT,
            reject_sync: false,
            modules,
            templates: Vec::new(),
            sync_log: Vec::new(),
        }
    }

    pub fn set_authoritative(&mut self, authoritative: bool) {
        self.authoritative = authoritative;
    }

    pub fn set_local_participant(&mut self, participant: Option<String>) {
        self.local_participant = participant;
    }

    pub fn set_slot_layout(&mut self, layout: SlotLayout) {
        self.slot_layout = layout;
    }

    pub fn set_reject_sync(&mut self, reject: bool) {
        self.reject_sync = reject;
    }

    pub fn add_template(&mut self, seed: TemplateSeed) {
        self.templates.push(seed);
    }

    pub fn sync_log(&self) -> &[SyncLogEntry] {
        &self.sync_log
    }
}

impl HostRuntime for FixtureHost {
    fn modules(&self) -> &[HostModule] {
        &self.modules
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn slot_layout(&self) -> SlotLayout {
        self.slot_layout
    }

    fn base_record(&self, template_id: u32) -> Option<ImplantRecord> {
        let seed = self.templates.iter().find(|seed| seed.id == template_id)?;
        let mut record = ImplantRecord::empty(template_id, self.slot_layout);

        let effect_count = seed.effects.len().min(self.slot_layout.effect_slots);
        for (slot, selection) in record.effects.iter_mut().zip(seed.effects.iter()) {
            *slot = EffectSlot {
                effect_id: selection.effect_id,
                magnitude: selection.magnitude,
            };
        }
        record.effect_count = effect_count as u32;

        let condition_count = seed.conditions.len().min(self.slot_layout.condition_slots);
        for (slot, id) in record.conditions.iter_mut().zip(seed.conditions.iter()) {
            *slot = *id;
        }
        record.condition_count = condition_count as u32;

        record.uses = clamp_uses(seed.uses);
        Some(record)
    }

    fn local_participant(&self) -> Option<Participant> {
        self.local_participant.as_ref().map(|id| Participant { id: id.clone() })
    }

    fn sync_set_record(&mut self, participant: &Participant, record: &ImplantRecord) -> bool {
        if self.reject_sync {
            return false;
        }
        self.sync_log.push(SyncLogEntry {
            participant: participant.id.clone(),
            record: record.clone(),
            synced_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        });
        true
    }
}

/// Load a fixture host from a JSON file.
pub fn load_fixture_host(
    path: impl AsRef<Path>,
) -> Result<FixtureHost, Box<dyn std::error::Error + Send + Sync>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("unable to read host file '{}': {err}", path.display()))?;
    let host: FixtureHost = serde_json::from_str(&raw)
        .map_err(|err| format!("unable to parse host file '{}': {err}", path.display()))?;
    Ok(host)
}
