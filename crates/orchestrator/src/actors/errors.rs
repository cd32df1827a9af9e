//! Actor-specific error types.
//!
//! These describe failures of the message-passing substrate itself (a reply
//! that never arrived, an actor that is gone). Journey outcomes such as "no
//! actions left" are never errors.

use std::time::Duration;
use thiserror::Error;

/// Substrate errors surfaced by request/reply helpers.
#[derive(Debug, Clone, Error)]
pub enum ActorError {
    /// RPC call timed out.
    #[error("RPC timeout after {0:?}")]
    RpcTimeout(Duration),

    /// The actor is not available (stopped or not started).
    #[error("Actor not available")]
    ActorUnavailable,

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Failed to spawn an actor.
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
}

impl ActorError {
    /// Create an RPC timeout error.
    #[must_use]
    pub const fn rpc_timeout(duration: Duration) -> Self {
        Self::RpcTimeout(duration)
    }

    /// Create an actor unavailable error.
    #[must_use]
    pub const fn actor_unavailable() -> Self {
        Self::ActorUnavailable
    }

    /// Create a channel error.
    pub fn channel_error(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }

    /// Create a spawn failure.
    pub fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }
}
