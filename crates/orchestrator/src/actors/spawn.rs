//! Spawn helpers for the simulation actors.

use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorRef};

use crate::provider::WorkflowProvider;

use super::company::{CompanyActor, CompanyArguments};
use super::customer::{CustomerActor, CustomerArguments};
use super::errors::ActorError;
use super::messages::{CompanyMessage, CustomerMessage, ProviderMessage};

/// Spawn a workflow provider actor.
///
/// # Errors
///
/// Returns [`ActorError::SpawnFailed`] if the actor cannot start.
pub async fn spawn_provider(
    provider: WorkflowProvider,
) -> Result<(ActorRef<ProviderMessage>, JoinHandle<()>), ActorError> {
    Actor::spawn(None, super::provider::WorkflowProviderActor, provider)
        .await
        .map_err(|e| ActorError::spawn_failed(format!("Failed to spawn provider: {e}")))
}

/// Spawn a company actor.
///
/// # Errors
///
/// Returns [`ActorError::SpawnFailed`] if the actor cannot start.
pub async fn spawn_company(
    args: CompanyArguments,
) -> Result<(ActorRef<CompanyMessage>, JoinHandle<()>), ActorError> {
    Actor::spawn(None, CompanyActor, args)
        .await
        .map_err(|e| ActorError::spawn_failed(format!("Failed to spawn company: {e}")))
}

/// Spawn a customer actor. Its journey starts immediately.
///
/// # Errors
///
/// Returns [`ActorError::SpawnFailed`] if the actor cannot start.
pub async fn spawn_customer(
    args: CustomerArguments,
) -> Result<(ActorRef<CustomerMessage>, JoinHandle<()>), ActorError> {
    let id = args.id;
    Actor::spawn(None, CustomerActor, args)
        .await
        .map_err(|e| ActorError::spawn_failed(format!("Failed to spawn customer {id}: {e}")))
}
