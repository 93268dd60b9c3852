//! Capability discovery: locate a host type by bare name across every loaded
//! module, then extract its public static u32 constants into a stable
//! name -> identifier map. Discovery failure is always an empty result,
//! never a panic or an error that aborts the scan.

mod constants;
mod resolver;

pub use constants::{build_constant_map, ConstantMap};
pub use resolver::{resolve, ResolvedType};
