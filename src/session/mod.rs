//! ForgeSession: the single logical session owning the discovered catalogs,
//! the current selections and the apply action. Every public operation is
//! total: it updates the session status line and returns, never panics and
//! never lets a failure escape past this boundary.

use serde::Serialize;
use thiserror::Error;

use crate::discovery::{build_constant_map, resolve, ConstantMap};
use crate::host::HostRuntime;
use crate::record::{clamp_magnitude, clamp_uses, synthesize, EffectSelection, ImplantRecord};

/// Default use-count when nothing has been picked yet.
const DEFAULT_USES: i64 = 2;

/// Symbolic names of the three category types looked up in the host.
/// Defaults match the host this system was written against; configurable so
/// a differently named host build can be targeted without a rebuild.
#[derive(Debug, Clone)]
pub struct CategoryNames {
    pub effects: String,
    pub conditions: String,
    pub templates: String,
}

impl Default for CategoryNames {
    fn default() -> CategoryNames {
        CategoryNames {
            effects: "BoosterImplantEffect".to_string(),
            conditions: "BoosterImplantCondition".to_string(),
            templates: "BoosterImplantTemplate".to_string(),
        }
    }
}

/// Why an apply action was rejected. Rendered to the status line; the
/// interactive surface only ever sees strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("authority denied: only the session authority can grant implants")]
    AuthorityDenied,
    #[error("no template selected")]
    MissingTemplate,
    #[error("no local participant available")]
    MissingParticipant,
    #[error("host rejected the record sync")]
    SyncRejected,
    #[error("unexpected apply failure: {0}")]
    Unexpected(String),
}

/// What a successful apply did.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub participant: String,
    pub template_id: u32,
    pub template_name: Option<String>,
    pub record: ImplantRecord,
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Applied(ApplyReport),
    Rejected(ApplyError),
}

#[derive(Debug)]
pub struct ForgeSession {
    categories: CategoryNames,
    effects: ConstantMap,
    conditions: ConstantMap,
    templates: ConstantMap,
    loaded: bool,
    /// Non-reentrancy latch: a second discovery pass must not start while
    /// one is in flight (host lifecycle callbacks can re-enter).
    discovery_in_flight: bool,
    loaded_at: Option<String>,
    selected_effects: Vec<EffectSelection>,
    selected_conditions: Vec<u32>,
    picked_template: Option<u32>,
    uses: i64,
    status: String,
}

impl Default for ForgeSession {
    fn default() -> ForgeSession {
        ForgeSession::new(CategoryNames::default())
    }
}

impl ForgeSession {
    pub fn new(categories: CategoryNames) -> ForgeSession {
        ForgeSession {
            categories,
            effects: ConstantMap::new(),
            conditions: ConstantMap::new(),
            templates: ConstantMap::new(),
            loaded: false,
            discovery_in_flight: false,
            loaded_at: None,
            selected_effects: Vec::new(),
            selected_conditions: Vec::new(),
            picked_template: None,
            uses: DEFAULT_USES,
            status: "Catalogs not loaded. Run a discovery pass first.".to_string(),
        }
    }

    pub fn effects(&self) -> &ConstantMap {
        &self.effects
    }

    pub fn conditions(&self) -> &ConstantMap {
        &self.conditions
    }

    pub fn templates(&self) -> &ConstantMap {
        &self.templates
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn loaded_at(&self) -> Option<&str> {
        self.loaded_at.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn selected_effects(&self) -> &[EffectSelection] {
        &self.selected_effects
    }

    pub fn selected_conditions(&self) -> &[u32] {
        &self.selected_conditions
    }

    pub fn picked_template(&self) -> Option<u32> {
        self.picked_template
    }

    pub fn uses(&self) -> i64 {
        self.uses
    }

    /// Run a discovery pass unless one already completed. The three catalogs
    /// are rebuilt wholesale; a category that yields nothing stays an empty
    /// map and is reported in the status rather than raised as an error.
    pub fn load_catalogs(&mut self, host: &dyn HostRuntime) -> &str {
        if self.loaded {
            return &self.status;
        }
        if self.discovery_in_flight {
            self.status = "Discovery already running.".to_string();
            return &self.status;
        }

        self.discovery_in_flight = true;
        self.effects = build_category(host, &self.categories.effects);
        self.conditions = build_category(host, &self.categories.conditions);
        self.templates = build_category(host, &self.categories.templates);
        self.loaded_at = Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());

        self.loaded =
            !self.effects.is_empty() && !self.conditions.is_empty() && !self.templates.is_empty();
        self.status = if self.loaded {
            format!(
                "Catalogs loaded: {} effects, {} conditions, {} templates. Pick a template, then apply.",
                self.effects.len(),
                self.conditions.len(),
                self.templates.len()
            )
        } else {
            format!(
                "Catalog discovery incomplete: effects={}, conditions={}, templates={}. Refresh to retry.",
                self.effects.len(),
                self.conditions.len(),
                self.templates.len()
            )
        };
        self.discovery_in_flight = false;
        &self.status
    }

    /// Discard every catalog and rebuild from the host's current module set.
    /// Selections are cleared too: they index into catalogs that no longer
    /// exist.
    pub fn refresh_catalogs(&mut self, host: &dyn HostRuntime) -> &str {
        self.loaded = false;
        self.effects = ConstantMap::new();
        self.conditions = ConstantMap::new();
        self.templates = ConstantMap::new();
        self.loaded_at = None;
        self.reset_selections();
        self.load_catalogs(host)
    }

    pub fn add_effect(&mut self, name: &str, magnitude: f32) -> &str {
        match self.effects.get(name) {
            Some(effect_id) => {
                let magnitude = clamp_magnitude(magnitude);
                self.selected_effects.push(EffectSelection {
                    effect_id,
                    magnitude,
                });
                self.status =
                    format!("Added effect {name} (id {effect_id}) = {magnitude:.2}");
            }
            None => self.status = format!("Unknown effect '{name}'."),
        }
        &self.status
    }

    pub fn add_condition(&mut self, name: &str) -> &str {
        match self.conditions.get(name) {
            Some(condition_id) => {
                if self.selected_conditions.contains(&condition_id) {
                    self.status = format!("Condition {name} already selected.");
                } else {
                    self.selected_conditions.push(condition_id);
                    self.status = format!("Added condition {name} (id {condition_id})");
                }
            }
            None => self.status = format!("Unknown condition '{name}'."),
        }
        &self.status
    }

    pub fn pick_template(&mut self, name: &str) -> &str {
        match self.templates.get(name) {
            Some(template_id) => {
                self.picked_template = Some(template_id);
                self.status = format!("Picked template {name} (id {template_id})");
            }
            None => self.status = format!("Unknown template '{name}'."),
        }
        &self.status
    }

    pub fn set_uses(&mut self, uses: i64) -> &str {
        self.uses = i64::from(clamp_uses(uses));
        self.status = format!("Uses set to {}.", self.uses);
        &self.status
    }

    pub fn clear(&mut self) -> &str {
        self.reset_selections();
        self.status = "Cleared all selections.".to_string();
        &self.status
    }

    /// The apply action: gate on authority, synthesize the record from the
    /// current selections, hand it to the host's replication primitive.
    /// Always returns an outcome; the status line is updated either way.
    pub fn apply(&mut self, host: &mut dyn HostRuntime) -> ApplyOutcome {
        match self.try_apply(host) {
            Ok(report) => {
                let template = report
                    .template_name
                    .clone()
                    .unwrap_or_else(|| report.template_id.to_string());
                self.status = format!(
                    "Granted implant '{}' to {} ({} effects, {} conditions, {} uses).",
                    template,
                    report.participant,
                    report.record.effect_count,
                    report.record.condition_count,
                    report.record.uses
                );
                ApplyOutcome::Applied(report)
            }
            Err(err) => {
                self.status = format!("Apply rejected: {err}");
                ApplyOutcome::Rejected(err)
            }
        }
    }

    fn try_apply(&self, host: &mut dyn HostRuntime) -> Result<ApplyReport, ApplyError> {
        // Authority is checked before anything else touches the host; when
        // denied, no seed fetch and no sync call may happen.
        if !host.is_authoritative() {
            return Err(ApplyError::AuthorityDenied);
        }
        let template_id = self.picked_template.ok_or(ApplyError::MissingTemplate)?;
        let participant = host
            .local_participant()
            .ok_or(ApplyError::MissingParticipant)?;

        let record = synthesize(
            &*host,
            template_id,
            &self.selected_effects,
            &self.selected_conditions,
            self.uses,
        )
        .map_err(|err| ApplyError::Unexpected(err.to_string()))?;

        if !host.sync_set_record(&participant, &record) {
            return Err(ApplyError::SyncRejected);
        }

        Ok(ApplyReport {
            participant: participant.id,
            template_id,
            template_name: self.templates.name_of(template_id).map(str::to_string),
            record,
        })
    }

    fn reset_selections(&mut self) {
        self.selected_effects.clear();
        self.selected_conditions.clear();
        self.picked_template = None;
        self.uses = DEFAULT_USES;
    }
}

fn build_category(host: &dyn HostRuntime, type_name: &str) -> ConstantMap {
    match resolve(host, type_name) {
        Some(resolved) => build_constant_map(&resolved),
        None => ConstantMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fixture::{FixtureHost, TemplateSeed};
    use crate::host::{HostModule, HostType, StaticField};
    use serde_json::json;

    fn field(name: &str, id: u32) -> StaticField {
        StaticField {
            name: name.to_string(),
            value: json!(id),
        }
    }

    fn demo_host() -> FixtureHost {
        let mut host = FixtureHost::with_modules(vec![HostModule {
            name: "Implants".to_string(),
            types: Some(vec![
                HostType {
                    name: "BoosterImplantEffect".to_string(),
                    fields: vec![field("DAMAGE_BOOST", 41), field("MELEE_BOOST", 42)],
                    nested: Vec::new(),
                },
                HostType {
                    name: "BoosterImplantCondition".to_string(),
                    fields: vec![field("LOW_HEALTH", 7)],
                    nested: Vec::new(),
                },
                HostType {
                    name: "BoosterImplantTemplate".to_string(),
                    fields: vec![field("ADRENALINE", 1201)],
                    nested: Vec::new(),
                },
            ]),
        }]);
        host.add_template(TemplateSeed {
            id: 1201,
            effects: Vec::new(),
            conditions: Vec::new(),
            uses: 1,
        });
        host
    }

    #[test]
    fn load_catalogs_builds_all_three_maps() {
        let host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);

        assert!(session.is_loaded());
        assert_eq!(session.effects().len(), 2);
        assert_eq!(session.conditions().len(), 1);
        assert_eq!(session.templates().len(), 1);
        assert!(session.loaded_at().is_some());
        assert!(session.status().contains("2 effects"));
    }

    #[test]
    fn incomplete_discovery_keeps_partial_maps_and_stays_unloaded() {
        let host = FixtureHost::with_modules(vec![HostModule {
            name: "Implants".to_string(),
            types: Some(vec![HostType {
                name: "BoosterImplantEffect".to_string(),
                fields: vec![field("DAMAGE_BOOST", 41)],
                nested: Vec::new(),
            }]),
        }]);
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);

        assert!(!session.is_loaded());
        assert_eq!(session.effects().len(), 1);
        assert!(session.templates().is_empty());
        assert!(session.status().contains("incomplete"));
    }

    #[test]
    fn discovery_latch_blocks_reentry() {
        let host = demo_host();
        let mut session = ForgeSession::default();
        session.discovery_in_flight = true;
        session.load_catalogs(&host);

        assert!(!session.is_loaded());
        assert_eq!(session.status(), "Discovery already running.");

        session.discovery_in_flight = false;
        session.load_catalogs(&host);
        assert!(session.is_loaded());
    }

    #[test]
    fn selections_resolve_names_through_the_catalogs() {
        let host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);

        session.add_effect("DAMAGE_BOOST", 9.0);
        session.add_effect("NO_SUCH_EFFECT", 1.0);
        session.add_condition("LOW_HEALTH");
        session.add_condition("LOW_HEALTH");
        session.pick_template("ADRENALINE");

        assert_eq!(session.selected_effects().len(), 1);
        assert_eq!(session.selected_effects()[0].effect_id, 41);
        // Entry clamp, same rule the synthesizer applies.
        assert_eq!(session.selected_effects()[0].magnitude, 5.0);
        assert_eq!(session.selected_conditions(), &[7]);
        assert_eq!(session.picked_template(), Some(1201));
    }

    #[test]
    fn clear_resets_selections_and_uses() {
        let host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);
        session.add_effect("DAMAGE_BOOST", 1.0);
        session.pick_template("ADRENALINE");
        session.set_uses(3);

        session.clear();
        assert!(session.selected_effects().is_empty());
        assert!(session.selected_conditions().is_empty());
        assert_eq!(session.picked_template(), None);
        assert_eq!(session.uses(), 2);
    }

    #[test]
    fn refresh_rebuilds_wholesale_against_the_current_module_set() {
        let host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);
        session.pick_template("ADRENALINE");

        let empty_host = FixtureHost::with_modules(Vec::new());
        session.refresh_catalogs(&empty_host);

        assert!(!session.is_loaded());
        assert!(session.effects().is_empty());
        assert_eq!(session.picked_template(), None);
    }

    #[test]
    fn apply_fails_closed_without_authority() {
        let mut host = demo_host();
        host.set_authoritative(false);
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);
        session.pick_template("ADRENALINE");

        let outcome = session.apply(&mut host);
        assert!(matches!(
            outcome,
            ApplyOutcome::Rejected(ApplyError::AuthorityDenied)
        ));
        assert!(host.sync_log().is_empty());
        assert!(session.status().contains("authority denied"));
    }

    #[test]
    fn apply_requires_a_template_and_a_participant() {
        let mut host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);

        let outcome = session.apply(&mut host);
        assert!(matches!(
            outcome,
            ApplyOutcome::Rejected(ApplyError::MissingTemplate)
        ));

        session.pick_template("ADRENALINE");
        host.set_local_participant(None);
        let outcome = session.apply(&mut host);
        assert!(matches!(
            outcome,
            ApplyOutcome::Rejected(ApplyError::MissingParticipant)
        ));
        assert!(host.sync_log().is_empty());
    }

    #[test]
    fn apply_surfaces_sync_rejection_verbatim() {
        let mut host = demo_host();
        host.set_reject_sync(true);
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);
        session.pick_template("ADRENALINE");

        let outcome = session.apply(&mut host);
        assert!(matches!(
            outcome,
            ApplyOutcome::Rejected(ApplyError::SyncRejected)
        ));
    }

    #[test]
    fn successful_apply_replicates_the_synthesized_record() {
        let mut host = demo_host();
        let mut session = ForgeSession::default();
        session.load_catalogs(&host);
        session.pick_template("ADRENALINE");
        session.add_effect("DAMAGE_BOOST", 0.3);
        session.set_uses(10);

        let outcome = session.apply(&mut host);
        let ApplyOutcome::Applied(report) = outcome else {
            panic!("apply should succeed");
        };
        assert_eq!(report.template_id, 1201);
        assert_eq!(report.template_name.as_deref(), Some("ADRENALINE"));
        assert_eq!(report.participant, "local");
        assert_eq!(report.record.effect_count, 1);
        assert_eq!(report.record.effects[0].effect_id, 41);
        assert_eq!(report.record.condition_count, 0);
        assert_eq!(report.record.uses, 3);

        assert_eq!(host.sync_log().len(), 1);
        assert_eq!(host.sync_log()[0].record, report.record);
    }
}
