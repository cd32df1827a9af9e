//! Actor-based concurrency for the simulation.
//!
//! This module provides ractor actors for the three roles of a journey and
//! the request/reply helper they talk through.
//!
//! # Architecture
//!
//! - **Message passing**: actors never touch each other's state
//! - **Process isolation**: each customer owns its record exclusively
//! - **Serialized inboxes**: each actor handles one message at a time
//! - **Suspension**: a `request` suspends only the caller until the reply
//!
//! # Components
//!
//! - `WorkflowProviderActor`: answers "which actions are available here"
//! - `CompanyActor`: acknowledges uncontrolled actions, picks controlled ones
//! - `CustomerActor`: runs one journey to completion
//! - `ActorError`: substrate failures returned from `request`
//!
//! # Example
//!
//! ```ignore
//! use journeysim_orchestrator::actors::{request, spawn_provider, ProviderMessage};
//!
//! let (provider, _handle) = spawn_provider(WorkflowProvider::permissive(catalog)).await?;
//! let actions = request(&provider, None, |reply| ProviderMessage::AvailableActions {
//!     customer_id: 1,
//!     state: "start".to_string(),
//!     reply,
//! })
//! .await?;
//! ```

use std::time::Duration;

use ractor::rpc::CallResult;
use ractor::{ActorRef, Message, RpcReplyPort};

pub mod company;
pub mod customer;
pub mod errors;
pub mod messages;
pub mod provider;
pub mod spawn;

// Re-export main types for convenience
pub use company::{CompanyActor, CompanyArguments};
pub use customer::{CustomerActor, CustomerArguments, CustomerRecord, Decision, decide};
pub use errors::ActorError;
pub use messages::{
    CompanyMessage, CustomerId, CustomerMessage, CustomerOutcome, CustomerSnapshot,
    JourneyStatus, ProviderMessage,
};
pub use provider::WorkflowProviderActor;
pub use spawn::{spawn_company, spawn_customer, spawn_provider};

/// Send a request and suspend until its reply arrives.
///
/// `timeout` of `None` waits indefinitely.
///
/// # Errors
///
/// Returns [`ActorError::RpcTimeout`] when no reply arrives in time,
/// [`ActorError::ActorUnavailable`] when the receiver dropped the reply port
/// (typically because it stopped), and [`ActorError::ChannelError`] when the
/// message could not be delivered.
pub async fn request<M, T, F>(
    actor: &ActorRef<M>,
    timeout: Option<Duration>,
    build: F,
) -> Result<T, ActorError>
where
    M: Message,
    T: Send + 'static,
    F: FnOnce(RpcReplyPort<T>) -> M + Send,
{
    match actor
        .call(build, timeout)
        .await
        .map_err(|e| ActorError::channel_error(e.to_string()))?
    {
        CallResult::Success(value) => Ok(value),
        CallResult::Timeout => Err(ActorError::rpc_timeout(timeout.unwrap_or_default())),
        CallResult::SenderError => Err(ActorError::actor_unavailable()),
    }
}
