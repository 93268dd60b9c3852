use std::cell::Cell;

use implantforge::host::fixture::load_fixture_host;
use implantforge::host::{HostModule, HostRuntime, Participant};
use implantforge::record::{ImplantRecord, SlotLayout};
use implantforge::session::{ApplyError, ApplyOutcome, ForgeSession};

/// Host fake that counts collaborator calls, for the fail-closed ordering
/// guarantees: a denied apply may not touch the seed provider or the sync
/// primitive at all.
struct CountingHost {
    authoritative: bool,
    base_record_calls: Cell<u32>,
    sync_calls: u32,
}

impl CountingHost {
    fn new(authoritative: bool) -> CountingHost {
        CountingHost {
            authoritative,
            base_record_calls: Cell::new(0),
            sync_calls: 0,
        }
    }
}

impl HostRuntime for CountingHost {
    fn modules(&self) -> &[HostModule] {
        &[]
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn slot_layout(&self) -> SlotLayout {
        SlotLayout {
            effect_slots: 4,
            condition_slots: 2,
        }
    }

    fn base_record(&self, template_id: u32) -> Option<ImplantRecord> {
        self.base_record_calls.set(self.base_record_calls.get() + 1);
        Some(ImplantRecord::empty(template_id, self.slot_layout()))
    }

    fn local_participant(&self) -> Option<Participant> {
        Some(Participant {
            id: "local".to_string(),
        })
    }

    fn sync_set_record(&mut self, _participant: &Participant, _record: &ImplantRecord) -> bool {
        self.sync_calls += 1;
        true
    }
}

#[test]
fn denied_authority_short_circuits_before_any_host_mutation() {
    let mut host = CountingHost::new(false);
    let mut session = ForgeSession::default();

    let outcome = session.apply(&mut host);

    assert!(matches!(
        outcome,
        ApplyOutcome::Rejected(ApplyError::AuthorityDenied)
    ));
    assert_eq!(host.base_record_calls.get(), 0);
    assert_eq!(host.sync_calls, 0);
}

#[test]
fn missing_template_is_reported_before_the_seed_is_fetched() {
    let mut host = CountingHost::new(true);
    let mut session = ForgeSession::default();

    let outcome = session.apply(&mut host);

    assert!(matches!(
        outcome,
        ApplyOutcome::Rejected(ApplyError::MissingTemplate)
    ));
    assert_eq!(host.base_record_calls.get(), 0);
    assert_eq!(host.sync_calls, 0);
}

#[test]
fn adrenaline_scenario_end_to_end() {
    // template ADRENALINE, one DAMAGE_BOOST effect at 0.3, no conditions,
    // uses over the cap.
    let mut host = load_fixture_host("data/host.json").expect("shipped fixture should parse");
    let mut session = ForgeSession::default();
    session.load_catalogs(&host);
    assert!(session.is_loaded());

    session.pick_template("ADRENALINE");
    session.add_effect("DAMAGE_BOOST", 0.3);
    session.set_uses(10);

    let ApplyOutcome::Applied(report) = session.apply(&mut host) else {
        panic!("apply should succeed: {}", session.status());
    };

    let adrenaline = session.templates().get("ADRENALINE").expect("template id");
    let damage_boost = session.effects().get("DAMAGE_BOOST").expect("effect id");

    assert_eq!(report.template_id, adrenaline);
    assert_eq!(report.record.template_id, adrenaline);
    assert_eq!(report.record.effects[0].effect_id, damage_boost);
    assert_eq!(report.record.effects[0].magnitude, 0.3);
    assert_eq!(report.record.effect_count, 1);
    assert_eq!(report.record.condition_count, 0);
    assert_eq!(report.record.uses, 3);
    assert_eq!(report.participant, "player-1");

    assert_eq!(host.sync_log().len(), 1);
    assert_eq!(host.sync_log()[0].record, report.record);
}

#[test]
fn selections_replace_template_seed_defaults() {
    // BERSERKER's seed carries a default effect and condition. The session's
    // selections are authoritative: applying with none picked zeroes the
    // seeded slots, and the seeded uses value is replaced by the session's.
    let mut host = load_fixture_host("data/host.json").expect("shipped fixture should parse");
    let mut session = ForgeSession::default();
    session.load_catalogs(&host);

    session.pick_template("BERSERKER");

    let ApplyOutcome::Applied(report) = session.apply(&mut host) else {
        panic!("apply should succeed: {}", session.status());
    };

    assert_eq!(report.record.effect_count, 0);
    assert!(report.record.effects.iter().all(|slot| slot.effect_id == 0));
    assert_eq!(report.record.condition_count, 0);
    assert!(report.record.conditions.iter().all(|id| *id == 0));
    assert_eq!(report.record.uses, 2);
}

#[test]
fn status_lines_are_the_only_failure_surface() {
    let mut host = load_fixture_host("data/host.json").expect("shipped fixture should parse");
    host.set_authoritative(false);
    let mut session = ForgeSession::default();
    session.load_catalogs(&host);
    session.pick_template("ADRENALINE");

    session.apply(&mut host);
    assert!(session.status().starts_with("Apply rejected:"));

    host.set_authoritative(true);
    host.set_reject_sync(true);
    session.apply(&mut host);
    assert!(session.status().contains("host rejected the record sync"));
}
