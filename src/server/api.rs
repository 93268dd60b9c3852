//! JSON payload builders for the console API. Handlers translate raw request
//! bodies into session operations and session state into payloads; the
//! session itself never sees HTTP.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::discovery::ConstantMap;
use crate::session::{ApplyError, ApplyOutcome, ApplyReport};

use super::ConsoleState;

#[derive(Debug)]
pub enum RequestError {
    Parse(serde_json::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> RequestError {
        RequestError::Parse(err)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EffectRequest {
    pub name: String,
    pub magnitude: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsesRequest {
    pub uses: i64,
}

#[derive(Debug, Clone, Serialize)]
struct ConstantEntry {
    name: String,
    id: u32,
}

fn catalog_entries(map: &ConstantMap) -> Vec<ConstantEntry> {
    map.iter()
        .map(|(name, id)| ConstantEntry {
            name: name.to_string(),
            id,
        })
        .collect()
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "implantforge-console",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Catalog view. Triggers a lazy first discovery pass, the way the original
/// surface loaded data when first opened.
pub fn catalog_payload(state: &mut ConsoleState) -> Result<String, serde_json::Error> {
    if !state.session.is_loaded() {
        state.session.load_catalogs(&state.host);
    }
    catalog_snapshot(state)
}

pub fn catalog_refresh_payload(state: &mut ConsoleState) -> Result<String, serde_json::Error> {
    state.session.refresh_catalogs(&state.host);
    catalog_snapshot(state)
}

fn catalog_snapshot(state: &ConsoleState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "loaded": state.session.is_loaded(),
        "loaded_at": state.session.loaded_at(),
        "status": state.session.status(),
        "effects": catalog_entries(state.session.effects()),
        "conditions": catalog_entries(state.session.conditions()),
        "templates": catalog_entries(state.session.templates()),
    }))
}

pub fn selection_payload(state: &ConsoleState) -> Result<String, serde_json::Error> {
    let session = &state.session;
    let effects: Vec<_> = session
        .selected_effects()
        .iter()
        .map(|selection| {
            serde_json::json!({
                "id": selection.effect_id,
                "name": session.effects().name_of(selection.effect_id),
                "magnitude": selection.magnitude,
            })
        })
        .collect();
    let conditions: Vec<_> = session
        .selected_conditions()
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": session.conditions().name_of(*id),
            })
        })
        .collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "status": session.status(),
        "template": session.picked_template().map(|id| serde_json::json!({
            "id": id,
            "name": session.templates().name_of(id),
        })),
        "effects": effects,
        "conditions": conditions,
        "uses": session.uses(),
    }))
}

pub fn add_effect_payload(state: &mut ConsoleState, body: &str) -> Result<String, RequestError> {
    let request: EffectRequest = serde_json::from_str(body)?;
    state.session.add_effect(&request.name, request.magnitude);
    Ok(selection_payload(state)?)
}

pub fn add_condition_payload(state: &mut ConsoleState, body: &str) -> Result<String, RequestError> {
    let request: NameRequest = serde_json::from_str(body)?;
    state.session.add_condition(&request.name);
    Ok(selection_payload(state)?)
}

pub fn pick_template_payload(state: &mut ConsoleState, body: &str) -> Result<String, RequestError> {
    let request: NameRequest = serde_json::from_str(body)?;
    state.session.pick_template(&request.name);
    Ok(selection_payload(state)?)
}

pub fn set_uses_payload(state: &mut ConsoleState, body: &str) -> Result<String, RequestError> {
    let request: UsesRequest = serde_json::from_str(body)?;
    state.session.set_uses(request.uses);
    Ok(selection_payload(state)?)
}

pub fn clear_payload(state: &mut ConsoleState) -> Result<String, serde_json::Error> {
    state.session.clear();
    selection_payload(state)
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ApplyReport>,
}

/// Run the apply action. The error carries the rejection so the router can
/// choose a status code; the payload is the user-facing part.
pub fn apply_payload(state: &mut ConsoleState) -> Result<String, ApplyError> {
    match state.session.apply(&mut state.host) {
        ApplyOutcome::Applied(report) => {
            let response = ApplyResponse {
                status: "applied",
                message: state.session.status().to_string(),
                report: Some(report),
            };
            Ok(serde_json::to_string_pretty(&response)
                .unwrap_or_else(|err| format!("{{\"status\":\"applied\",\"message\":\"{err}\"}}")))
        }
        ApplyOutcome::Rejected(err) => Err(err),
    }
}

pub fn sync_log_payload(state: &ConsoleState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "entries": state.host.sync_log(),
    }))
}
