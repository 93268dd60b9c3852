//! implantforge: runtime capability discovery and implant record synthesis
//! for an opaque multiplayer host.
//!
//! The host is a closed binary with its own dynamically loaded type universe.
//! This crate locates the symbolic identifiers the host uses for implant
//! effects, conditions and templates ([discovery]), synthesizes a host-native
//! implant record honoring the host's slot and clamping rules ([record]), and
//! drives the whole flow from a single session object ([session]). The host
//! itself is only ever reached through the [host::HostRuntime] boundary.

pub mod cli;
pub mod discovery;
pub mod host;
pub mod record;
pub mod server;
pub mod session;
