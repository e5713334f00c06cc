//! Scoped state holders.
//!
//! A holder owns one snapshot per scope (cluster id or host id), merges
//! incoming deltas into it under a single mutation lock, and tells agents
//! whether the copy they hold (identified by its fingerprint) is stale.
//!
//! The generic engine lives in [`StateHolder`]. What differs between
//! domains (how a snapshot is merged, what an empty snapshot looks like and
//! what is sent to agents) is supplied by a [`StateStrategy`]:
//! - [`TopologyStrategy`] / [`TopologyHolder`]: cluster topology, merged at
//!   component granularity and sanitized before leaving the controller
//! - [`ConfigsStrategy`] / [`ConfigHolder`]: per-host configuration,
//!   replaced as a whole
mod configs;
mod state_holder;
mod topology;
pub use configs::*;
pub use state_holder::*;
pub use topology::*;

#[cfg(test)]
mod configs_test;

use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::Destination;
use crate::EventType;
use crate::OutboundEvent;
use crate::Result;
use crate::ScopeKey;
use crate::StateError;
use crate::UpdateEvent;

/// Supplies authoritative snapshots. Owned by the rest of the controller.
#[cfg_attr(test, automock)]
pub trait DataSource<T: Send + Sync + 'static>: Send + Sync + 'static {
    /// Every scope the source currently knows about
    fn scopes(&self) -> Result<Vec<ScopeKey>>;

    /// Full snapshot of one scope.
    ///
    /// # Errors
    /// [`StateError::ScopeUnavailable`] if the scope cannot be resolved now.
    fn fetch(
        &self,
        scope: &str,
    ) -> Result<T>;
}

/// Outcome of merging one scope's payload
#[derive(Debug, PartialEq)]
pub enum ScopeMerge<T> {
    /// Held value left as it was
    Unchanged,
    /// Held value was mutated in place
    Changed,
    /// Scope was unknown and must be inserted with this value
    Insert(T),
    /// Scope must be dropped
    Remove,
}

impl<T> ScopeMerge<T> {
    pub fn is_change(&self) -> bool {
        !matches!(self, ScopeMerge::Unchanged)
    }
}

/// Per-domain behaviour plugged into [`StateHolder`]
pub trait StateStrategy: Send + Sync + 'static {
    type Value: Clone + Debug + Serialize + Send + Sync + 'static;

    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Payload that stands for "this whole scope" in a scope-level delete
    fn empty_value(&self) -> Self::Value;

    /// Merges `incoming` into the held value of `scope`.
    ///
    /// Runs under the holder's mutation lock. The default implementation
    /// replaces known scopes wholesale, inserts unknown ones on CREATE or
    /// UPDATE, removes known scopes on DELETE and rejects a DELETE of an
    /// unknown scope.
    fn merge_update(
        &self,
        scope: &str,
        existing: Option<&mut Self::Value>,
        incoming: &Self::Value,
        event_type: EventType,
    ) -> Result<ScopeMerge<Self::Value>> {
        replace_scope(scope, existing, incoming, event_type)
    }

    /// What to hand to the transport once `update` changed the held state.
    ///
    /// `update` already carries the holder's new fingerprint. Anything that
    /// must not reach agents has to be stripped from a copy here.
    fn outbound(
        &self,
        update: &UpdateEvent<Self::Value>,
    ) -> Result<Vec<(Destination, OutboundEvent)>>;
}

/// Whole-value merge: replace known scopes, insert unknown ones on CREATE or
/// UPDATE, drop known scopes on DELETE.
pub fn replace_scope<T: Clone>(
    scope: &str,
    existing: Option<&mut T>,
    incoming: &T,
    event_type: EventType,
) -> Result<ScopeMerge<T>> {
    match (existing, event_type) {
        (None, EventType::Delete) => Err(StateError::ScopeNotFound {
            scope: scope.to_string(),
        }
        .into()),
        (None, _) => Ok(ScopeMerge::Insert(incoming.clone())),
        (Some(_), EventType::Delete) => Ok(ScopeMerge::Remove),
        (Some(current), _) => {
            *current = incoming.clone();
            Ok(ScopeMerge::Changed)
        }
    }
}
