//! Controller-side state synchronization for a fleet of remote agents.
//!
//! - [`TopologyHolder`] and [`ConfigHolder`] keep one snapshot per cluster
//!   or host, merge incremental updates and tell agents whether their copy
//!   (identified by a fingerprint) is stale.
//! - [`CommandPublisher`] batches agent commands per host and cluster and
//!   enriches keytab commands with secret material.
//!
//! Cluster metadata, secret storage and delivery are reached through the
//! [`ClusterRegistry`], [`SecretStore`] and [`Transport`] traits.
mod config;
mod dto;
mod errors;
mod holder;
mod metrics;
mod publisher;
mod registry;
mod secrets;
mod transport;

pub use config::*;
pub use dto::*;
pub use errors::*;
pub use holder::*;
pub use metrics::*;
pub use publisher::*;
pub use registry::*;
pub use secrets::*;
pub use transport::*;
