//! Data carried between the controller-side holders, the command publisher
//! and the agents.
//!
//! Every type here is a plain value. Ordered maps and sets are used
//! throughout so that serialization, and therefore fingerprinting, is
//! deterministic.
mod command;
mod configs;
mod event;
mod identity;
mod topology;
pub use command::*;
pub use configs::*;
pub use event::*;
pub use identity::*;
pub use topology::*;

#[cfg(test)]
mod event_test;

/// Key a holder stores one snapshot under (a cluster id or a host id,
/// in string form)
pub type ScopeKey = String;

pub type HostId = i64;

pub type ClusterId = i64;
