//! CustomerActor - one customer journey.
//!
//! The actor owns its [`CustomerRecord`] exclusively. It advances one
//! transition per `Step` message and re-enqueues `Step` to itself until no
//! action remains, so `Snapshot` queries interleave with the loop while
//! `AwaitOutcome` callers are parked until the journey finishes.

use std::sync::Arc;
use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{debug, trace};

use journeysim_core::{AvailableActions, Disobedience, TaskDefinition};

use crate::rng::{RandomSource, choose};

use super::errors::ActorError;
use super::messages::{
    CompanyMessage, CustomerId, CustomerMessage, CustomerOutcome, CustomerSnapshot,
    JourneyStatus, ProviderMessage,
};
use super::request;

/// Mutable record of one journey.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    id: CustomerId,
    state: String,
    steps: u64,
    cost: f64,
    finished: bool,
    disobedience: Disobedience,
}

impl CustomerRecord {
    pub fn new(id: CustomerId, start_state: impl Into<String>, disobedience: Disobedience) -> Self {
        Self {
            id,
            state: start_state.into(),
            steps: 0,
            cost: 0.0,
            finished: false,
            disobedience,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CustomerId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub const fn disobedience(&self) -> Disobedience {
        self.disobedience
    }

    /// Take `task`: move to its target, add its cost, count the step.
    /// Ignored once finished.
    pub fn apply(&mut self, task: &TaskDefinition) {
        if self.finished {
            return;
        }
        self.state.clone_from(&task.target);
        self.cost += task.cost;
        self.steps = self.steps.saturating_add(1);
    }

    pub const fn finish(&mut self) {
        self.finished = true;
    }

    #[must_use]
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            id: self.id,
            state: self.state.clone(),
            steps: self.steps,
            cost: self.cost,
            status: if self.finished {
                JourneyStatus::Finished
            } else {
                JourneyStatus::Running
            },
        }
    }

    /// The terminal outcome, only once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<CustomerOutcome> {
        self.finished.then(|| CustomerOutcome {
            id: self.id,
            end_state: self.state.clone(),
            steps: self.steps,
            cost: self.cost,
        })
    }
}

/// Which branch the customer takes for the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Act alone with this uncontrollable task.
    Uncontrolled(Arc<TaskDefinition>),
    /// Let the company decide.
    Controlled,
    /// Nothing left to do.
    Exhausted,
}

/// Choose a branch.
///
/// When both kinds of action exist a draw in `[0, 100)` below the
/// disobedience probability selects the uncontrolled branch. When only one
/// kind exists that branch is taken without the probability draw.
pub fn decide(
    actions: &AvailableActions,
    disobedience: Disobedience,
    rng: &dyn RandomSource,
) -> Decision {
    let pick_uncontrolled = || {
        choose(rng, &actions.uncontrollable)
            .cloned()
            .map_or(Decision::Exhausted, Decision::Uncontrolled)
    };

    match (
        actions.controllable.is_empty(),
        actions.uncontrollable.is_empty(),
    ) {
        (true, true) => Decision::Exhausted,
        (false, true) => Decision::Controlled,
        (true, false) => pick_uncontrolled(),
        (false, false) => {
            if disobedience.disobeys(rng.next_below(100)) {
                pick_uncontrolled()
            } else {
                Decision::Controlled
            }
        }
    }
}

/// The customer actor definition.
#[derive(Clone, Copy, Default)]
pub struct CustomerActor;

/// Arguments passed to a customer on startup.
#[derive(Clone)]
pub struct CustomerArguments {
    pub id: CustomerId,
    pub start_state: String,
    pub disobedience: Disobedience,
    pub provider: ActorRef<ProviderMessage>,
    pub company: ActorRef<CompanyMessage>,
    pub rng: Arc<dyn RandomSource>,
    /// Timeout for provider/company calls; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

/// Actor state: the record plus the handles it talks to.
pub struct CustomerState {
    record: CustomerRecord,
    waiters: Vec<RpcReplyPort<CustomerOutcome>>,
    provider: ActorRef<ProviderMessage>,
    company: ActorRef<CompanyMessage>,
    rng: Arc<dyn RandomSource>,
    call_timeout: Option<Duration>,
}

enum StepResult {
    Advanced,
    Finished,
}

impl CustomerActor {
    async fn step(state: &mut CustomerState) -> Result<StepResult, ActorError> {
        let customer_id = state.record.id();
        let current = state.record.state().to_string();

        let actions = request(&state.provider, state.call_timeout, |reply| {
            ProviderMessage::AvailableActions {
                customer_id,
                state: current.clone(),
                reply,
            }
        })
        .await?;

        let decision = decide(&actions, state.record.disobedience(), state.rng.as_ref());
        match decision {
            Decision::Exhausted => Ok(StepResult::Finished),

            Decision::Uncontrolled(task) => {
                request(&state.company, state.call_timeout, |reply| {
                    CompanyMessage::NotifyUncontrolledAction {
                        customer_id,
                        action: task.action.clone(),
                        new_state: task.target.clone(),
                        reply,
                    }
                })
                .await?;
                trace!(customer_id, from = %current, action = %task.action, "Uncontrolled step");
                state.record.apply(&task);
                Ok(StepResult::Advanced)
            }

            Decision::Controlled => {
                let chosen = request(&state.company, state.call_timeout, |reply| {
                    CompanyMessage::PerformControlledAction {
                        customer_id,
                        current_state: current.clone(),
                        reply,
                    }
                })
                .await??;

                match chosen {
                    Some(task) => {
                        trace!(customer_id, from = %current, action = %task.action, "Controlled step");
                        state.record.apply(&task);
                        Ok(StepResult::Advanced)
                    }
                    None => Ok(StepResult::Finished),
                }
            }
        }
    }

    fn finish(state: &mut CustomerState) {
        state.record.finish();
        debug!(
            customer_id = state.record.id(),
            end_state = %state.record.state(),
            steps = state.record.steps(),
            cost = state.record.cost(),
            "Journey finished"
        );
        if let Some(outcome) = state.record.outcome() {
            for waiter in state.waiters.drain(..) {
                let _ = waiter.send(outcome.clone());
            }
        }
    }
}

impl Actor for CustomerActor {
    type Msg = CustomerMessage;
    type State = CustomerState;
    type Arguments = CustomerArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        trace!(customer_id = args.id, start = %args.start_state, "CustomerActor starting");
        myself
            .send_message(CustomerMessage::Step)
            .map_err(|e| ActorProcessingErr::from(e.to_string()))?;

        Ok(CustomerState {
            record: CustomerRecord::new(args.id, args.start_state, args.disobedience),
            waiters: Vec::new(),
            provider: args.provider,
            company: args.company,
            rng: args.rng,
            call_timeout: args.call_timeout,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CustomerMessage::Step => {
                if state.record.is_finished() {
                    return Ok(());
                }
                match Self::step(state).await? {
                    StepResult::Advanced => myself
                        .send_message(CustomerMessage::Step)
                        .map_err(|e| ActorProcessingErr::from(e.to_string()))?,
                    StepResult::Finished => Self::finish(state),
                }
            }

            CustomerMessage::AwaitOutcome { reply } => match state.record.outcome() {
                Some(outcome) => {
                    let _ = reply.send(outcome);
                }
                None => state.waiters.push(reply),
            },

            CustomerMessage::Snapshot { reply } => {
                let _ = reply.send(state.record.snapshot());
            }
        }
        Ok(())
    }
}
