//! Type resolution by bare name over the host's loaded modules.

use crate::host::{HostRuntime, HostType};

/// A type located in the host's type universe. Transient: borrows the host's
/// module scan and is only held for the duration of a constant-map build.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedType<'a> {
    /// Module the match was found in. Informational only; the requested name
    /// carries no module qualifier.
    pub module: &'a str,
    pub ty: &'a HostType,
}

/// Locate a type by exact name match, searching every currently loaded
/// module in host enumeration order. First match wins; when two modules
/// define the same type name the winner depends on an enumeration order the
/// host does not keep stable, which is accepted. Modules that cannot be
/// introspected are skipped, never fatal. `None` means no module exposes the
/// name.
pub fn resolve<'a>(host: &'a dyn HostRuntime, type_name: &str) -> Option<ResolvedType<'a>> {
    for module in host.modules() {
        let Some(types) = module.types.as_deref() else {
            continue;
        };
        if let Some(ty) = types.iter().find(|ty| ty.name == type_name) {
            return Some(ResolvedType {
                module: &module.name,
                ty,
            });
        }
    }
    None
}
