use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Network error: unable to connect to the server ({0})")]
    Network(String),
    #[error("session expired (status {status})")]
    Unauthorized { status: u16 },
    #[error("no session credential available")]
    MissingSession,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Server Error: malformed response body ({0})")]
    Parse(String),
    #[error("invalid backend url '{0}'")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    SessionExpired,
    Network,
    Operation,
    Server,
}

impl StoreError {
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        if ErrorCode::from_status(status).is_auth() {
            return StoreError::Unauthorized { status };
        }
        StoreError::Api(ApiError::from_response(status, body))
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::Unauthorized { .. } | StoreError::MissingSession => {
                ErrorClass::SessionExpired
            }
            StoreError::Network(_) => ErrorClass::Network,
            StoreError::Api(err) if err.code == ErrorCode::Internal => ErrorClass::Server,
            StoreError::Api(_) => ErrorClass::Operation,
            StoreError::Parse(_) | StoreError::InvalidBaseUrl(_) => ErrorClass::Server,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.class() == ErrorClass::SessionExpired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Your session has expired. Please log in again to view registrations.")]
    SessionExpired,
    #[error("{0}")]
    Message(String),
}

impl From<&StoreError> for PageError {
    fn from(err: &StoreError) -> Self {
        if err.requires_reauth() {
            PageError::SessionExpired
        } else {
            PageError::Message(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInError {
    #[error("scanned input does not contain a registration id")]
    EmptyScan,
    #[error(transparent)]
    Store(#[from] StoreError),
}
