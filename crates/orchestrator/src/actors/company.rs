//! CompanyActor - observes uncontrolled actions and decides controlled ones.
//!
//! The decision policy is a uniform random pick among the controllable
//! actions the provider offers. Notifications are acknowledged and otherwise
//! ignored.

use std::sync::Arc;
use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{info, trace};

use journeysim_core::TaskDefinition;

use crate::rng::{RandomSource, choose};

use super::errors::ActorError;
use super::messages::{CompanyMessage, CustomerId, ProviderMessage};
use super::request;

/// The company actor definition.
#[derive(Clone, Copy, Default)]
pub struct CompanyActor;

/// Arguments passed to the company on startup.
#[derive(Clone)]
pub struct CompanyArguments {
    /// Provider consulted for every controlled decision.
    pub provider: ActorRef<ProviderMessage>,
    /// Source of the company's random picks.
    pub rng: Arc<dyn RandomSource>,
    /// Timeout for provider calls; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl CompanyArguments {
    pub fn new(provider: ActorRef<ProviderMessage>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            provider,
            rng,
            call_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Company state. Immutable after start; the company keeps no per-customer data.
pub struct CompanyState {
    provider: ActorRef<ProviderMessage>,
    rng: Arc<dyn RandomSource>,
    call_timeout: Option<Duration>,
}

impl CompanyActor {
    async fn decide(
        state: &CompanyState,
        customer_id: CustomerId,
        current_state: String,
    ) -> Result<Option<Arc<TaskDefinition>>, ActorError> {
        let actions = request(&state.provider, state.call_timeout, |reply| {
            ProviderMessage::AvailableActions {
                customer_id,
                state: current_state,
                reply,
            }
        })
        .await?;
        Ok(choose(state.rng.as_ref(), &actions.controllable).cloned())
    }
}

impl Actor for CompanyActor {
    type Msg = CompanyMessage;
    type State = CompanyState;
    type Arguments = CompanyArguments;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("CompanyActor starting");
        Ok(CompanyState {
            provider: args.provider,
            rng: args.rng,
            call_timeout: args.call_timeout,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CompanyMessage::NotifyUncontrolledAction {
                customer_id,
                action,
                new_state,
                reply,
            } => {
                trace!(customer_id, action = %action, new_state = %new_state, "Observed uncontrolled action");
                let _ = reply.send(());
            }

            CompanyMessage::PerformControlledAction {
                customer_id,
                current_state,
                reply,
            } => {
                let decision = Self::decide(state, customer_id, current_state).await;
                match &decision {
                    Ok(Some(task)) => {
                        trace!(customer_id, action = %task.action, "Chose controlled action");
                    }
                    Ok(None) => trace!(customer_id, "No controlled action to offer"),
                    Err(e) => tracing::warn!(customer_id, error = %e, "Provider query failed"),
                }
                let _ = reply.send(decision);
            }
        }
        Ok(())
    }
}
