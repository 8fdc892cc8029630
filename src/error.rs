//! Error types surfaced by the event loop and the runtime glue.

use crate::io::handle::{HandleId, HandleKey, HandleType};

/// Misuse of a handle key.
///
/// The loop itself never fails while ticking; these errors are returned to the caller
/// of a handle operation when the precondition of that operation does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key was never issued by this loop, or its handle has been freed.
    #[error("handle {0} is not registered with this loop")]
    InvalidHandle(HandleKey),

    /// The key refers to a handle of another kind.
    #[error("handle {key} is a {found} handle, expected {expected}")]
    WrongType {
        key: HandleKey,
        expected: HandleType,
        found: HandleType,
    },

    /// The handle is scheduled for reaping and can no longer be started or closed.
    #[error("handle #{0} is closing")]
    Closing(HandleId),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building an [`EventLoop`](crate::EventLoop).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no board provided")]
    NoBoard,
}

/// Failures reported by a [`ScriptEngine`](crate::runtime::ScriptEngine).
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("uncaught exception: {0}")]
    Runtime(String),

    /// Execution was interrupted through [`VmStop`](crate::runtime::VmStop).
    #[error("aborted")]
    Aborted,

    #[error("failed to enqueue job: {0}")]
    Spawn(#[from] futures::task::SpawnError),

    #[error(transparent)]
    Loop(#[from] Error),
}
