//! Provider and executor failures. Both are plain values carried back to the
//! controller, so they are `Clone` and keep only rendered messages.

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("collaborator unreachable: {0}")]
    Unreachable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied => FetchError::PermissionDenied(e.to_string()),
            io::ErrorKind::InvalidData => FetchError::Parse(e.to_string()),
            _ => FetchError::Unreachable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("cannot reach service manager: {0}")]
    Connect(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("job finished with '{0}'")]
    Failed(String),
    #[error("no completion")]
    NoCompletion,
    #[error("no such process: {0}")]
    NoSuchProcess(u32),
    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Rejected(e.to_string())
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(e: tokio::task::JoinError) -> Self {
        FetchError::Worker(e.to_string())
    }
}

impl From<tokio::task::JoinError> for CommandError {
    fn from(e: tokio::task::JoinError) -> Self {
        CommandError::Worker(e.to_string())
    }
}

/// Service-manager transport failure, kept separate from `CommandError` so the
/// executor decides whether it happened before or after submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BusError(pub String);

impl From<zbus::Error> for BusError {
    fn from(e: zbus::Error) -> Self {
        BusError(e.to_string())
    }
}

/// What a view shows inline next to stale data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Command(#[from] CommandError),
}
