use std::cell::Cell;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Transport failure talking to the store.
    Network,
    /// The store refused the operation (bad secret, conflicting commit, ...).
    Rejected,
    NotFound,
    /// Operation on a node that is no longer attached to the tree.
    Detached,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn not_found(address: &str) -> Self {
        Self::new(RemoteErrorKind::NotFound, format!("no node at {address}"))
    }

    pub fn detached() -> Self {
        Self::new(RemoteErrorKind::Detached, "node is not attached")
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NextlistError {
    #[error("Nextlist has already been initialized for this element")]
    AlreadyInitialized,
    #[error("Cannot invoke method before Nextlist initialization")]
    NotInitialized,
    #[error("List has not been loaded from the remote store yet")]
    NotLoaded,
    #[error("Sortable toolkit is not available for this element")]
    ToolkitUnavailable,
    #[error("No remote session was supplied and none can be created")]
    SessionUnavailable,
    #[error("A valid remote session was not specified")]
    InvalidSession,
    #[error("A valid remote node address was not specified")]
    MissingAddress,
    #[error("A valid remote node secret was not specified")]
    MissingSecret,
    #[error("Nextlist has not been initialized for the destination list")]
    DestinationNotInitialized,
    #[error("Nextlist has not been initialized for the source list")]
    SourceNotInitialized,
    #[error("remote operation failed: {0}")]
    Remote(#[from] RemoteError),
}

impl NextlistError {
    /// Errors caught synchronously while validating options or method calls.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInitialized
                | Self::NotInitialized
                | Self::NotLoaded
                | Self::ToolkitUnavailable
                | Self::SessionUnavailable
                | Self::InvalidSession
                | Self::MissingAddress
                | Self::MissingSecret
        )
    }

    /// Errors raised while moving an item between two lists.
    pub fn is_coordination(&self) -> bool {
        matches!(
            self,
            Self::DestinationNotInitialized | Self::SourceNotInitialized
        )
    }
}

pub type NextlistResult<T> = Result<T, NextlistError>;

/// Silenceable error sink shared by every bound list.
///
/// Errors are always returned to the caller; the reporter only decides how loudly
/// they are logged.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    debug_mode: Cell<bool>,
}

impl ErrorReporter {
    pub fn set_debug_mode(&self, on: bool) {
        self.debug_mode.set(on);
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.get()
    }

    pub fn report(&self, err: NextlistError) -> NextlistError {
        if self.debug_mode.get() {
            tracing::error!("Nextlist: {err}");
        } else {
            tracing::debug!("Nextlist: {err}");
        }
        err
    }
}
