//! Registry of customers for the live query surface.
//!
//! Keyed by (experiment label, customer id). A live customer is queried
//! through its actor's `Snapshot` message; a finished one is answered from
//! the snapshot recorded when it finished, so lookups keep working after
//! its actor has stopped.

use std::collections::BTreeSet;
use std::time::Duration;

use dashmap::DashMap;
use ractor::ActorRef;
use tracing::debug;

use crate::actors::{ActorError, CustomerId, CustomerMessage, CustomerSnapshot, request};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
enum Entry {
    Live(ActorRef<CustomerMessage>),
    Finished(CustomerSnapshot),
}

/// Concurrent map of known customers.
pub struct CustomerRegistry {
    customers: DashMap<(String, CustomerId), Entry>,
    lookup_timeout: Duration,
}

impl Default for CustomerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn register_live(&self, label: &str, id: CustomerId, actor: ActorRef<CustomerMessage>) {
        self.customers
            .insert((label.to_string(), id), Entry::Live(actor));
    }

    pub fn record_finished(&self, label: &str, snapshot: CustomerSnapshot) {
        self.customers
            .insert((label.to_string(), snapshot.id), Entry::Finished(snapshot));
    }

    /// Drop every customer of `label`. Used when a configuration aborts, so
    /// no entry keeps pointing at a stopped actor.
    pub fn forget_experiment(&self, label: &str) {
        self.customers.retain(|(experiment, _), _| experiment != label);
        debug!(experiment = label, "Forgot customers of aborted experiment");
    }

    /// Current view of one customer, `None` when unknown.
    ///
    /// # Errors
    ///
    /// Returns an [`ActorError`] when a live customer does not answer.
    pub async fn lookup(
        &self,
        label: &str,
        id: CustomerId,
    ) -> Result<Option<CustomerSnapshot>, ActorError> {
        // Clone out so no shard lock is held across the await.
        let entry = self
            .customers
            .get(&(label.to_string(), id))
            .map(|e| e.value().clone());

        match entry {
            None => Ok(None),
            Some(Entry::Finished(snapshot)) => Ok(Some(snapshot)),
            Some(Entry::Live(actor)) => {
                debug!(experiment = label, customer_id = id, "Querying live customer");
                let snapshot = request(&actor, Some(self.lookup_timeout), |reply| {
                    CustomerMessage::Snapshot { reply }
                })
                .await?;
                Ok(Some(snapshot))
            }
        }
    }

    /// Labels of every experiment with at least one registered customer.
    #[must_use]
    pub fn experiments(&self) -> Vec<String> {
        self.customers
            .iter()
            .map(|e| e.key().0.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
