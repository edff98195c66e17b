//! Query coordinator: turns filter/search input into one authoritative query.
//!
//! Input changes restart a debounce timer; only settled input issues a request.
//! Every submission takes a new generation number, and a response is committed
//! only if its generation is still the latest when it arrives.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{domain::Registration, protocol::Breakdowns};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    error::{PageError, StoreError},
    events::PortalEvent,
    filters::{QueryInput, QueryPlan},
    projection::ProjectionCache,
    session::SessionContext,
    store::RegistrationStore,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct QueryResult {
    registrations: Vec<Registration>,
    breakdowns: Option<Breakdowns>,
}

pub struct QueryCoordinator {
    task: QueryTask,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
struct QueryTask {
    store: Arc<dyn RegistrationStore>,
    session: Arc<dyn SessionContext>,
    projection: Arc<Mutex<ProjectionCache>>,
    events: broadcast::Sender<PortalEvent>,
    generation: Arc<AtomicU64>,
}

impl QueryCoordinator {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        session: Arc<dyn SessionContext>,
        projection: Arc<Mutex<ProjectionCache>>,
        events: broadcast::Sender<PortalEvent>,
        debounce: Duration,
    ) -> Self {
        Self {
            task: QueryTask {
                store,
                session,
                projection,
                events,
                generation: Arc::new(AtomicU64::new(0)),
            },
            debounce,
            pending: Mutex::new(None),
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.task.generation.load(Ordering::SeqCst)
    }

    /// Schedules a query for `input` after the debounce window, cancelling any
    /// timer that has not fired yet. Returns the generation of this request.
    pub async fn submit(&self, input: QueryInput) -> u64 {
        // Generation order and timer replacement order must agree.
        let mut pending = self.pending.lock().await;
        let generation = self.begin().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let task = self.task.clone();
        let debounce = self.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // Detached so that a newer submission cancelling this timer can
            // never abort a request that is already on the wire.
            tokio::spawn(task.run(generation, input));
        }));
        generation
    }

    async fn begin(&self) -> u64 {
        let mut cache = self.task.projection.lock().await;
        let generation = self.task.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if cache.set_loading(true) {
            self.task.emit(PortalEvent::LoadingChanged(true));
        }
        generation
    }
}

impl QueryTask {
    async fn run(self, generation: u64, input: QueryInput) {
        let plan = input.plan();
        debug!(generation, ?plan, "issuing registration query");
        let outcome = self.execute(&plan).await;

        let mut cache = self.projection.lock().await;
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            debug!(generation, current, "discarding superseded registration query response");
            return;
        }

        match outcome {
            Ok(result) => {
                let count = result.registrations.len();
                cache.commit_results(generation, result.registrations, result.breakdowns);
                debug!(generation, count, "committed registration query");
                self.emit(PortalEvent::ResultsCommitted { generation, count });
            }
            Err(err) => {
                warn!(generation, error = %err, "registration query failed");
                let page_error = PageError::from(&err);
                cache.fail(page_error.clone());
                self.emit(PortalEvent::PageError(page_error));
            }
        }
        if cache.set_loading(false) {
            self.emit(PortalEvent::LoadingChanged(false));
        }
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<QueryResult, StoreError> {
        let token = self.session.token().await.ok_or(StoreError::MissingSession)?;
        match plan {
            QueryPlan::Search(query) => Ok(QueryResult {
                registrations: self.store.search_registrations(&token, query).await?,
                breakdowns: None,
            }),
            QueryPlan::Filtered(filters) => {
                let filtered = self.store.filtered_registrations(&token, filters).await?;
                Ok(QueryResult {
                    registrations: filtered.registrations,
                    breakdowns: Some(filtered.breakdowns),
                })
            }
            QueryPlan::All => Ok(QueryResult {
                registrations: self.store.list_registrations(&token).await?,
                breakdowns: None,
            }),
        }
    }

    fn emit(&self, event: PortalEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
