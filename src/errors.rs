//! Agent Sync Error Hierarchy
//!
//! Defines the error types surfaced by the state holders and the command
//! publisher, categorized by the layer that produced them.
//!
//! None of these errors are retried inside the crate. Retry policy belongs to
//! the caller (heartbeat processing, scheduler, REST layer).

use std::path::PathBuf;

use config::ConfigError;

use crate::HostId;
use crate::ScopeKey;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Scoped state failures (unknown or unavailable scopes)
    #[error(transparent)]
    State(#[from] StateError),

    /// Command dispatch failures; the whole dispatch call is aborted
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Infrastructure-level failures (serialization, transport)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The data source cannot produce a snapshot for this scope right now.
    /// Recoverable; no held state has been touched.
    #[error("Scope {scope} is unavailable: {reason}")]
    ScopeUnavailable { scope: ScopeKey, reason: String },

    /// Update referenced a scope the holder does not know about
    #[error("Scope {scope} not found")]
    ScopeNotFound { scope: ScopeKey },

    /// Scope key could not be interpreted (e.g. non-numeric cluster id)
    #[error("Invalid scope key: {scope}")]
    InvalidScope { scope: ScopeKey },
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A command could not be mapped to a cluster or host
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Reading secret material failed
    #[error("Could not inject keytab into command: {0}")]
    SecretAccess(#[from] SecretAccessError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Cluster {cluster_name} not found")]
    UnknownCluster { cluster_name: String },

    #[error("No stage found owning task {task_id}")]
    UnknownTask { task_id: u64 },

    #[error("Host {host_id} not found")]
    UnknownHost { host_id: HostId },
}

#[derive(Debug, thiserror::Error)]
pub enum SecretAccessError {
    /// Disk I/O failures while opening or reading secret material
    #[error("I/O failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Identity data file contains a row that is not a valid record.
    /// `line` is 0 when the position is unknown.
    #[error("Malformed identity record at {path}:{line}")]
    Malformed {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<ResolutionError> for Error {
    fn from(e: ResolutionError) -> Self {
        Error::Dispatch(DispatchError::Resolution(e))
    }
}

impl From<SecretAccessError> for Error {
    fn from(e: SecretAccessError) -> Self {
        Error::Dispatch(DispatchError::SecretAccess(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl Error {
    /// True when the error is [`StateError::ScopeNotFound`]
    pub fn is_scope_not_found(&self) -> bool {
        matches!(self, Error::State(StateError::ScopeNotFound { .. }))
    }

    /// True when the error is [`StateError::ScopeUnavailable`]
    pub fn is_scope_unavailable(&self) -> bool {
        matches!(self, Error::State(StateError::ScopeUnavailable { .. }))
    }
}
