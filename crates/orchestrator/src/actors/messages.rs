//! Messages exchanged between provider, company and customer actors.
//!
//! Design principles:
//! - Every interaction is request/reply: the caller suspends on an
//!   `RpcReplyPort`, the callee keeps serving its own inbox in order.
//! - `CustomerMessage::Step` is the only fire-and-forget message; a customer
//!   sends it to itself to drive its loop one transition at a time.

use std::fmt;
use std::sync::Arc;

use ractor::RpcReplyPort;
use serde::{Deserialize, Serialize};

use journeysim_core::{AvailableActions, TaskDefinition};

use super::errors::ActorError;

/// Customer identifier, sequential from 1 within an experiment.
pub type CustomerId = u64;

/// Messages for the workflow provider actor.
#[derive(Debug)]
pub enum ProviderMessage {
    /// Actions available to a customer in a state.
    AvailableActions {
        customer_id: CustomerId,
        state: String,
        reply: RpcReplyPort<AvailableActions>,
    },
}

/// Messages for the company actor.
#[derive(Debug)]
pub enum CompanyMessage {
    /// A customer took an uncontrollable action. Acknowledged, nothing else.
    NotifyUncontrolledAction {
        customer_id: CustomerId,
        action: String,
        new_state: String,
        reply: RpcReplyPort<()>,
    },

    /// Ask the company to decide a controllable action for a customer.
    /// `Ok(None)` means the company has nothing to offer.
    PerformControlledAction {
        customer_id: CustomerId,
        current_state: String,
        reply: RpcReplyPort<Result<Option<Arc<TaskDefinition>>, ActorError>>,
    },
}

/// Messages for a customer actor.
#[derive(Debug)]
pub enum CustomerMessage {
    /// Advance the journey by one transition.
    Step,

    /// Reply with the final outcome once the journey has finished.
    /// Held until then; never answered with partial results.
    AwaitOutcome {
        reply: RpcReplyPort<CustomerOutcome>,
    },

    /// Reply immediately with the current record.
    Snapshot {
        reply: RpcReplyPort<CustomerSnapshot>,
    },
}

/// Lifecycle of a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Running,
    Finished,
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Terminal result of one journey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOutcome {
    pub id: CustomerId,
    pub end_state: String,
    pub steps: u64,
    pub cost: f64,
}

/// Point-in-time view of a customer, running or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub state: String,
    pub steps: u64,
    pub cost: f64,
    pub status: JourneyStatus,
}

impl From<&CustomerOutcome> for CustomerSnapshot {
    fn from(outcome: &CustomerOutcome) -> Self {
        Self {
            id: outcome.id,
            state: outcome.end_state.clone(),
            steps: outcome.steps,
            cost: outcome.cost,
            status: JourneyStatus::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_journey_status() {
        assert_eq!(JourneyStatus::Running.to_string(), "running");
        assert_eq!(JourneyStatus::Finished.to_string(), "finished");
    }

    #[test]
    fn snapshot_from_outcome_is_finished() {
        let outcome = CustomerOutcome {
            id: 3,
            end_state: "done".to_string(),
            steps: 4,
            cost: 7.5,
        };
        let snapshot = CustomerSnapshot::from(&outcome);
        assert_eq!(snapshot.status, JourneyStatus::Finished);
        assert_eq!(snapshot.state, "done");
        assert_eq!(snapshot.steps, 4);
    }
}
