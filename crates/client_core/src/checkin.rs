use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::domain::RegistrationId;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    error::{CheckInError, StoreError},
    events::{Notification, PortalEvent},
    projection::{ProjectionCache, ProjectionCommand},
    session::SessionContext,
    store::RegistrationStore,
};

pub const CHECK_IN_SUCCESS_MESSAGE: &str = "Attendee checked in successfully!";
pub const CHECK_IN_FAILURE_MESSAGE: &str = "Error performing check-in";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn {
        id: RegistrationId,
        checked_in_at: DateTime<Utc>,
    },
    /// The local record is already checked in; nothing was sent.
    AlreadyCheckedIn,
}

/// Extracts a registration id from raw scanner input. QR codes may encode a
/// JSON object such as `{"id":"..."}`; anything else is taken verbatim.
pub fn parse_scanned_id(raw: &str) -> Option<RegistrationId> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(id) = value.get("id").and_then(|id| id.as_str()) {
                let id = id.trim();
                return (!id.is_empty()).then(|| RegistrationId::from(id));
            }
        } else {
            warn!("scanned input looks like JSON but failed to parse; using raw value");
        }
    }
    (!trimmed.is_empty()).then(|| RegistrationId::from(trimmed))
}

pub struct CheckInCoordinator {
    store: Arc<dyn RegistrationStore>,
    session: Arc<dyn SessionContext>,
    projection: Arc<Mutex<ProjectionCache>>,
    events: broadcast::Sender<PortalEvent>,
}

impl CheckInCoordinator {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        session: Arc<dyn SessionContext>,
        projection: Arc<Mutex<ProjectionCache>>,
        events: broadcast::Sender<PortalEvent>,
    ) -> Self {
        Self {
            store,
            session,
            projection,
            events,
        }
    }

    pub async fn check_in(&self, id: &RegistrationId) -> Result<CheckInOutcome, CheckInError> {
        if !self.projection.lock().await.can_check_in(id) {
            info!(registration_id = %id, "registration already checked in; skipping");
            return Ok(CheckInOutcome::AlreadyCheckedIn);
        }

        let requested_at = Utc::now();
        match self.send(id).await {
            Ok(()) => {
                let command = ProjectionCommand::CheckIn {
                    id: id.clone(),
                    applied_at: requested_at,
                };
                let updated = self.projection.lock().await.apply(&command);
                info!(registration_id = %id, updated, "check-in confirmed");
                self.notify(Notification::success(CHECK_IN_SUCCESS_MESSAGE));
                Ok(CheckInOutcome::CheckedIn {
                    id: id.clone(),
                    checked_in_at: requested_at,
                })
            }
            Err(err) => {
                warn!(registration_id = %id, error = %err, "check-in failed");
                self.notify(Notification::error(CHECK_IN_FAILURE_MESSAGE));
                Err(err.into())
            }
        }
    }

    pub async fn check_in_scanned(&self, raw: &str) -> Result<CheckInOutcome, CheckInError> {
        let Some(id) = parse_scanned_id(raw) else {
            self.notify(Notification::error(CHECK_IN_FAILURE_MESSAGE));
            return Err(CheckInError::EmptyScan);
        };
        self.check_in(&id).await
    }

    async fn send(&self, id: &RegistrationId) -> Result<(), StoreError> {
        let token = self.session.token().await.ok_or(StoreError::MissingSession)?;
        self.store.check_in(&token, id).await
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(PortalEvent::Notification(notification));
    }
}
