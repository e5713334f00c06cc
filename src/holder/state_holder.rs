use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::DataSource;
use super::ScopeMerge;
use super::StateStrategy;
use crate::metrics::HOLDER_UPDATES;
use crate::EventType;
use crate::Result;
use crate::ScopeKey;
use crate::Transport;
use crate::UpdateEvent;

/// Immutable view of everything a holder tracks.
///
/// Published through an `ArcSwap`, so readers never wait on writers and
/// always see a scope map together with the fingerprint computed for it.
#[derive(Debug, Clone)]
pub struct HeldState<T> {
    pub scopes: BTreeMap<ScopeKey, T>,
    pub fingerprint: String,
}

impl<T> Default for HeldState<T> {
    fn default() -> Self {
        Self {
            scopes: BTreeMap::new(),
            fingerprint: String::new(),
        }
    }
}

impl<T: Serialize> HeldState<T> {
    fn new(scopes: BTreeMap<ScopeKey, T>) -> Result<Self> {
        let fingerprint = fingerprint(&scopes)?;
        Ok(Self {
            scopes,
            fingerprint,
        })
    }
}

/// SHA-256 (hex) of the canonical JSON form of `scopes`.
///
/// An empty scope map always fingerprints to the empty string.
pub fn fingerprint<T: Serialize>(scopes: &BTreeMap<ScopeKey, T>) -> Result<String> {
    if scopes.is_empty() {
        return Ok(String::new());
    }
    let bytes = serde_json::to_vec(scopes)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Fingerprint of a single scope's value
pub fn scope_fingerprint<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Generic scoped state engine.
///
/// All mutations, and the decision whether a mutation changed anything,
/// happen inside `write_lock`. Data source calls are made before the lock
/// is taken.
pub struct StateHolder<S: StateStrategy> {
    strategy: S,
    source: Arc<dyn DataSource<S::Value>>,
    transport: Arc<dyn Transport>,
    write_lock: Mutex<()>,
    state: ArcSwap<HeldState<S::Value>>,
}

impl<S: StateStrategy> Debug for StateHolder<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.load();
        f.debug_struct("StateHolder")
            .field("holder", &self.strategy.name())
            .field("scopes", &state.scopes.len())
            .field("fingerprint", &state.fingerprint)
            .finish()
    }
}

impl<S: StateStrategy> StateHolder<S> {
    /// Creates an empty holder. Call [`initialize`](Self::initialize) to
    /// load the current state from the data source.
    pub fn new(
        strategy: S,
        source: Arc<dyn DataSource<S::Value>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            strategy,
            source,
            transport,
            write_lock: Mutex::new(()),
            state: ArcSwap::from_pointee(HeldState::default()),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Consistent snapshot of the held state
    pub fn snapshot(&self) -> Arc<HeldState<S::Value>> {
        self.state.load_full()
    }

    pub fn fingerprint(&self) -> String {
        self.state.load().fingerprint.clone()
    }

    /// Builds the authoritative snapshot of one scope from the data source.
    ///
    /// The held state is not touched.
    pub fn full_snapshot(
        &self,
        scope: &str,
    ) -> Result<S::Value> {
        self.source.fetch(scope)
    }

    /// Builds a CREATE event covering every scope the data source knows.
    ///
    /// Expensive; meant for agent registration and explicit resyncs.
    #[instrument(skip(self), fields(holder = self.strategy.name()))]
    pub fn current_data(&self) -> Result<UpdateEvent<S::Value>> {
        let mut event = UpdateEvent::new(EventType::Create);
        for scope in self.source.scopes()? {
            let value = self.source.fetch(&scope)?;
            event.scopes.insert(scope, value);
        }
        event.fingerprint = Some(fingerprint(&event.scopes)?);
        debug!("built current data for {} scopes", event.scopes.len());
        Ok(event)
    }

    /// Replaces the held state with a fresh build from the data source
    /// without publishing anything.
    ///
    /// Returns whether the fingerprint moved.
    pub fn initialize(&self) -> Result<bool> {
        let current = self.current_data()?;
        let _guard = self.write_lock.lock();
        self.swap_locked(current.scopes).map(|moved| moved.is_some())
    }

    /// Like [`initialize`](Self::initialize), but publishes the rebuilt
    /// state as a CREATE event when it differs from what was held.
    pub fn resync(&self) -> Result<bool> {
        let current = self.current_data()?;
        let _guard = self.write_lock.lock();
        match self.swap_locked(current.scopes.clone())? {
            Some(new_fingerprint) => {
                let event = UpdateEvent {
                    fingerprint: Some(new_fingerprint),
                    ..current
                };
                self.publish_locked(&event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn swap_locked(
        &self,
        scopes: BTreeMap<ScopeKey, S::Value>,
    ) -> Result<Option<String>> {
        let next = HeldState::new(scopes)?;
        if next.fingerprint == self.state.load().fingerprint {
            return Ok(None);
        }
        let new_fingerprint = next.fingerprint.clone();
        self.state.store(Arc::new(next));
        Ok(Some(new_fingerprint))
    }

    /// Answers whether a caller holding `prior_fingerprint` is stale.
    ///
    /// Returns a no-op event when it is not, otherwise a CREATE event with
    /// the full held state and its fingerprint.
    pub fn update_if_changed(
        &self,
        prior_fingerprint: &str,
    ) -> UpdateEvent<S::Value> {
        let state = self.state.load_full();
        if state.fingerprint == prior_fingerprint {
            trace!(
                "[{}] caller is up to date at {}",
                self.strategy.name(),
                prior_fingerprint
            );
            return UpdateEvent::no_op();
        }
        UpdateEvent {
            scopes: state.scopes.clone(),
            event_type: EventType::Create,
            fingerprint: Some(state.fingerprint.clone()),
        }
    }

    /// Same as [`update_if_changed`](Self::update_if_changed) for a single
    /// scope, compared against that scope's own fingerprint.
    ///
    /// A scope that is not held yet is loaded from the data source first.
    pub fn scope_update_if_changed(
        &self,
        scope: &str,
        prior_fingerprint: &str,
    ) -> Result<UpdateEvent<S::Value>> {
        let held = self.state.load().scopes.get(scope).cloned();
        let value = match held {
            Some(value) => value,
            None => self.load_scope(scope)?,
        };
        let current = scope_fingerprint(&value)?;
        if current == prior_fingerprint {
            return Ok(UpdateEvent::no_op());
        }
        Ok(UpdateEvent::single(scope, value, EventType::Create).with_fingerprint(current))
    }

    fn load_scope(
        &self,
        scope: &str,
    ) -> Result<S::Value> {
        let fetched = self.source.fetch(scope)?;
        let _guard = self.write_lock.lock();
        let state = self.state.load_full();
        if let Some(value) = state.scopes.get(scope) {
            // Someone else stored it while we were fetching
            return Ok(value.clone());
        }
        let mut scopes = state.scopes.clone();
        scopes.insert(scope.to_string(), fetched.clone());
        self.state.store(Arc::new(HeldState::new(scopes)?));
        debug!("[{}] loaded scope {} on demand", self.strategy.name(), scope);
        Ok(fetched)
    }

    /// Merges `update` into the held state.
    ///
    /// Either every scope of the update is applied or, on error, none is.
    /// Returns whether the held state was changed.
    ///
    /// # Errors
    /// - [`StateError::ScopeNotFound`](crate::StateError::ScopeNotFound)
    ///   for a DELETE of an unknown scope
    /// - any error raised by the strategy's merge
    pub fn apply_update(
        &self,
        update: &UpdateEvent<S::Value>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock();
        self.apply_locked(update).map(|fingerprint| fingerprint.is_some())
    }

    /// Applies `update` and, if the held state changed, publishes the
    /// strategy's outbound events stamped with the new fingerprint.
    #[instrument(skip(self, update), fields(holder = self.strategy.name(), event_type = ?update.event_type))]
    pub fn update_data(
        &self,
        mut update: UpdateEvent<S::Value>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock();
        match self.apply_locked(&update)? {
            Some(new_fingerprint) => {
                update.fingerprint = Some(new_fingerprint);
                // Still under the lock: publish order must follow apply order
                self.publish_locked(&update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply_locked(
        &self,
        update: &UpdateEvent<S::Value>,
    ) -> Result<Option<String>> {
        let current = self.state.load_full();
        let mut scopes = current.scopes.clone();
        let mut changed = false;

        for (scope, incoming) in &update.scopes {
            let outcome =
                self.strategy
                    .merge_update(scope, scopes.get_mut(scope), incoming, update.event_type)?;
            trace!(
                "[{}] merge {:?} into scope {}: {:?}",
                self.strategy.name(),
                update.event_type,
                scope,
                outcome.is_change()
            );
            match outcome {
                ScopeMerge::Unchanged => {}
                ScopeMerge::Changed => changed = true,
                ScopeMerge::Insert(value) => {
                    scopes.insert(scope.clone(), value);
                    changed = true;
                }
                ScopeMerge::Remove => {
                    scopes.remove(scope);
                    changed = true;
                }
            }
        }

        HOLDER_UPDATES
            .with_label_values(&[self.strategy.name(), if changed { "true" } else { "false" }])
            .inc();
        if !changed {
            return Ok(None);
        }

        let next = HeldState::new(scopes)?;
        let new_fingerprint = next.fingerprint.clone();
        self.state.store(Arc::new(next));
        debug!(
            "[{}] state changed, fingerprint {} -> {}",
            self.strategy.name(),
            current.fingerprint,
            new_fingerprint
        );
        Ok(Some(new_fingerprint))
    }

    fn publish_locked(
        &self,
        update: &UpdateEvent<S::Value>,
    ) -> Result<()> {
        for (destination, event) in self.strategy.outbound(update)? {
            if let Err(e) = self.transport.publish(destination, event) {
                warn!("[{}] publish failed: {:?}", self.strategy.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}
