//! Fixture lint: structural diagnostics for a host JSON file. Catches the
//! mistakes that would otherwise surface later as a silent empty catalog.

use std::collections::HashSet;
use std::fmt;

use crate::discovery::{build_constant_map, resolve};
use crate::host::fixture::load_fixture_host;
use crate::host::HostRuntime;
use crate::session::CategoryNames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Lint a fixture host file. Unreadable or unparseable files are an Err;
/// everything else comes back as diagnostics.
pub fn validate_host_fixture(path: &str) -> Result<ValidationReport, String> {
    let host = load_fixture_host(path).map_err(|err| err.to_string())?;
    Ok(validate_host(&host))
}

pub fn validate_host(host: &dyn HostRuntime) -> ValidationReport {
    let mut report = ValidationReport::default();

    if host.modules().is_empty() {
        report.push(
            ValidationSeverity::Error,
            "modules",
            "no modules: every discovery pass will come back empty",
        );
    }

    let mut seen_modules = HashSet::new();
    let mut seen_types: HashSet<&str> = HashSet::new();
    for (index, module) in host.modules().iter().enumerate() {
        let context = format!("modules[{index}]");
        if module.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, context.as_str(), "missing non-empty 'name'");
        } else if !seen_modules.insert(module.name.as_str()) {
            report.push(
                ValidationSeverity::Warning,
                context.as_str(),
                format!("duplicate module name '{}'", module.name),
            );
        }

        let Some(types) = module.types.as_deref() else {
            report.push(
                ValidationSeverity::Info,
                context.as_str(),
                format!("module '{}' is opaque and will be skipped", module.name),
            );
            continue;
        };

        for ty in types {
            let type_context = format!("{context} type '{}'", ty.name);
            if ty.name.trim().is_empty() {
                report.push(ValidationSeverity::Error, context.as_str(), "type with empty name");
                continue;
            }
            if !seen_types.insert(ty.name.as_str()) {
                report.push(
                    ValidationSeverity::Warning,
                    type_context.as_str(),
                    "type name defined in more than one module; resolution order is undefined",
                );
            }
            if ty.fields.is_empty() && ty.nested.iter().all(|nested| nested.fields.is_empty()) {
                report.push(
                    ValidationSeverity::Info,
                    type_context.as_str(),
                    "no static fields directly or in nested types",
                );
            }
        }
    }

    let categories = CategoryNames::default();
    for (label, type_name) in [
        ("effects", categories.effects.as_str()),
        ("conditions", categories.conditions.as_str()),
        ("templates", categories.templates.as_str()),
    ] {
        let context = format!("category '{label}'");
        match resolve(host, type_name) {
            Some(resolved) => {
                let map = build_constant_map(&resolved);
                if map.is_empty() {
                    report.push(
                        ValidationSeverity::Warning,
                        context.as_str(),
                        format!("type '{type_name}' resolves but yields zero usable constants"),
                    );
                }
            }
            None => report.push(
                ValidationSeverity::Warning,
                context.as_str(),
                format!("type '{type_name}' not found in any module"),
            ),
        }
    }

    report
}
