//! WorkflowProviderActor - serves `AvailableActions` queries.

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{debug, info};

use crate::provider::WorkflowProvider;

use super::messages::ProviderMessage;

/// The workflow provider actor definition.
#[derive(Clone, Copy, Default)]
pub struct WorkflowProviderActor;

impl Actor for WorkflowProviderActor {
    type Msg = ProviderMessage;
    type State = WorkflowProvider;
    type Arguments = WorkflowProvider;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        provider: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(
            workflow = provider.catalog().variant(),
            strategy = provider.strategy_name().unwrap_or("permissive"),
            "WorkflowProviderActor starting"
        );
        Ok(provider)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        provider: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ProviderMessage::AvailableActions {
                customer_id,
                state,
                reply,
            } => {
                let actions = provider.available_actions(customer_id, &state);
                debug!(
                    customer_id,
                    state = %state,
                    controllable = actions.controllable.len(),
                    uncontrollable = actions.uncontrollable.len(),
                    "Served available actions"
                );
                let _ = reply.send(actions);
            }
        }
        Ok(())
    }
}
