use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::ScopeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Create,
    Update,
    Delete,
}

/// A set of per-scope payloads plus the kind of change they describe.
///
/// The same shape is used for deltas flowing into a holder and for the
/// events a holder hands to the transport. `fingerprint` is only filled in
/// on events leaving a holder and always describes the holder's full state
/// after the change, not the delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent<T> {
    #[serde(rename = "clusters", default = "BTreeMap::new")]
    pub scopes: BTreeMap<ScopeKey, T>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl<T> UpdateEvent<T> {
    pub fn new(event_type: EventType) -> Self {
        Self {
            scopes: BTreeMap::new(),
            event_type,
            fingerprint: None,
        }
    }

    pub fn single(
        scope: impl Into<ScopeKey>,
        payload: T,
        event_type: EventType,
    ) -> Self {
        Self::new(event_type).with_scope(scope, payload)
    }

    /// Result of a change check when the caller is already up to date.
    /// Carries neither scopes nor a fingerprint.
    pub fn no_op() -> Self {
        Self::new(EventType::Update)
    }

    pub fn with_scope(
        mut self,
        scope: impl Into<ScopeKey>,
        payload: T,
    ) -> Self {
        self.scopes.insert(scope.into(), payload);
        self
    }

    pub fn with_fingerprint(
        mut self,
        fingerprint: impl Into<String>,
    ) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Only [`no_op`](Self::no_op) events qualify. A change check against an
    /// emptied holder still has a fingerprint and must reach the caller.
    pub fn is_no_op(&self) -> bool {
        self.scopes.is_empty() && self.fingerprint.is_none()
    }
}
