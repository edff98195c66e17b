use std::{sync::Arc, time::Duration};

use shared::domain::{Registration, RegistrationId};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod checkin;
pub mod error;
pub mod events;
pub mod filters;
pub mod pagination;
pub mod projection;
pub mod qr;
pub mod query;
pub mod session;
pub mod store;

pub use checkin::{parse_scanned_id, CheckInCoordinator, CheckInOutcome};
pub use error::{CheckInError, ErrorClass, PageError, StoreError};
pub use events::{Notification, NotificationLevel, PortalEvent};
pub use filters::{FilterValue, QueryInput, QueryPlan, RegistrationFilters};
pub use pagination::{PageView, Pagination, DEFAULT_PAGE_SIZE};
pub use projection::{FilterSummary, ProjectionCache, ProjectionCommand};
pub use qr::{QrCode, QrImage};
pub use query::{QueryCoordinator, DEFAULT_DEBOUNCE};
pub use session::{SessionContext, StaticSession};
pub use store::{HttpRegistrationStore, RegistrationStore};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const QR_FAILURE_MESSAGE: &str = "Error fetching QR Code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalOptions {
    pub debounce: Duration,
    pub page_size: usize,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Registration table state as one unit: the denominator list, the current
/// filtered/search projection, the open detail record and the pagination
/// window, driven by search/filter input and check-in actions.
pub struct RegistrationPortal {
    store: Arc<dyn RegistrationStore>,
    session: Arc<dyn SessionContext>,
    projection: Arc<Mutex<ProjectionCache>>,
    queries: QueryCoordinator,
    check_ins: CheckInCoordinator,
    input: Mutex<QueryInput>,
    events: broadcast::Sender<PortalEvent>,
}

impl RegistrationPortal {
    pub fn new(store: Arc<dyn RegistrationStore>, session: Arc<dyn SessionContext>) -> Arc<Self> {
        Self::with_options(store, session, PortalOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn RegistrationStore>,
        session: Arc<dyn SessionContext>,
        options: PortalOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let projection = Arc::new(Mutex::new(ProjectionCache::new(options.page_size)));
        let queries = QueryCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&session),
            Arc::clone(&projection),
            events.clone(),
            options.debounce,
        );
        let check_ins = CheckInCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&session),
            Arc::clone(&projection),
            events.clone(),
        );
        Arc::new(Self {
            store,
            session,
            projection,
            queries,
            check_ins,
            input: Mutex::new(QueryInput::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    /// Starts the denominator fetch and the first table query. The two run
    /// independently; the denominator never blocks the table.
    pub async fn mount(self: &Arc<Self>) {
        self.spawn_denominator();
        let input = self.input.lock().await.clone();
        self.queries.submit(input).await;
    }

    fn spawn_denominator(self: &Arc<Self>) {
        let portal = Arc::clone(self);
        tokio::spawn(async move {
            portal.load_denominator().await;
        });
    }

    /// Fetches the unfiltered list used for "N of M" counts. Failures are
    /// logged and otherwise ignored.
    pub async fn load_denominator(&self) {
        let result = match self.session.token().await {
            Some(token) => self.store.list_registrations(&token).await,
            None => Err(StoreError::MissingSession),
        };
        match result {
            Ok(registrations) => {
                let total = registrations.len();
                self.projection.lock().await.replace_all(registrations);
                info!(total, "loaded registration denominator");
                self.emit(PortalEvent::DenominatorLoaded { total });
            }
            Err(err) => warn!(error = %err, "failed to load registration denominator"),
        }
    }

    pub async fn set_search(&self, search: impl Into<String>) -> u64 {
        let input = {
            let mut input = self.input.lock().await;
            input.search = search.into();
            input.clone()
        };
        self.queries.submit(input).await
    }

    pub async fn set_filters(&self, filters: RegistrationFilters) -> u64 {
        let input = {
            let mut input = self.input.lock().await;
            input.filters = filters;
            input.clone()
        };
        self.queries.submit(input).await
    }

    pub async fn clear_filters(&self) -> u64 {
        self.set_filters(RegistrationFilters::default()).await
    }

    pub async fn query_input(&self) -> QueryInput {
        self.input.lock().await.clone()
    }

    pub async fn retry(&self) -> u64 {
        let input = self.input.lock().await.clone();
        self.queries.submit(input).await
    }

    /// Refreshes the session after a "session expired" page and reloads both
    /// views; the denominator reloads in the background.
    pub async fn reauthenticate(self: &Arc<Self>) -> Result<u64, StoreError> {
        self.session.refresh().await?;
        self.spawn_denominator();
        Ok(self.retry().await)
    }

    pub async fn settle(&self) -> Result<(), PageError> {
        let mut events = self.events.subscribe();
        loop {
            {
                let cache = self.projection.lock().await;
                if !cache.loading() {
                    return match cache.error() {
                        Some(error) => Err(error.clone()),
                        None => Ok(()),
                    };
                }
            }
            if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                return Ok(());
            }
        }
    }

    pub async fn check_in(&self, id: &RegistrationId) -> Result<CheckInOutcome, CheckInError> {
        self.check_ins.check_in(id).await
    }

    pub async fn check_in_scanned(&self, raw: &str) -> Result<CheckInOutcome, CheckInError> {
        self.check_ins.check_in_scanned(raw).await
    }

    pub async fn can_check_in(&self, id: &RegistrationId) -> bool {
        self.projection.lock().await.can_check_in(id)
    }

    pub async fn view_qr(&self, id: &RegistrationId) -> Result<QrCode, StoreError> {
        let result = match self.session.token().await {
            Some(token) => self.store.qr_code(&token, id).await,
            None => Err(StoreError::MissingSession),
        };
        if let Err(err) = &result {
            warn!(registration_id = %id, error = %err, "failed to fetch qr code");
            self.emit(PortalEvent::Notification(Notification::error(
                QR_FAILURE_MESSAGE,
            )));
        }
        result
    }

    pub async fn open_detail(&self, id: &RegistrationId) -> Option<Registration> {
        self.projection.lock().await.open_detail(id).cloned()
    }

    pub async fn close_detail(&self) {
        self.projection.lock().await.close_detail();
    }

    pub async fn detail(&self) -> Option<Registration> {
        self.projection.lock().await.detail().cloned()
    }

    pub async fn registrations(&self) -> Vec<Registration> {
        self.projection.lock().await.registrations().to_vec()
    }

    pub async fn page(&self) -> PageView<Registration> {
        self.projection.lock().await.page()
    }

    pub async fn next_page(&self) -> PageView<Registration> {
        let mut cache = self.projection.lock().await;
        cache.next_page();
        cache.page()
    }

    pub async fn prev_page(&self) -> PageView<Registration> {
        let mut cache = self.projection.lock().await;
        cache.prev_page();
        cache.page()
    }

    pub async fn summary(&self) -> FilterSummary {
        self.projection.lock().await.summary()
    }

    pub async fn loading(&self) -> bool {
        self.projection.lock().await.loading()
    }

    pub async fn page_error(&self) -> Option<PageError> {
        self.projection.lock().await.error().cloned()
    }

    pub fn current_generation(&self) -> u64 {
        self.queries.current_generation()
    }

    fn emit(&self, event: PortalEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
