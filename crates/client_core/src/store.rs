use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Registration, RegistrationId},
    protocol::{Envelope, FilteredRegistrations, QrCodePayload},
};
use tracing::debug;
use url::Url;

use crate::{error::StoreError, filters::RegistrationFilters, qr::QrCode};

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn list_registrations(&self, token: &str) -> Result<Vec<Registration>, StoreError>;
    async fn search_registrations(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<Registration>, StoreError>;
    async fn filtered_registrations(
        &self,
        token: &str,
        filters: &RegistrationFilters,
    ) -> Result<FilteredRegistrations, StoreError>;
    async fn check_in(&self, token: &str, id: &RegistrationId) -> Result<(), StoreError>;
    async fn qr_code(&self, token: &str, id: &RegistrationId) -> Result<QrCode, StoreError>;
}

pub struct HttpRegistrationStore {
    http: Client,
    base_url: Url,
}

impl HttpRegistrationStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, StoreError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|_| StoreError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "registration store request failed");
            return Err(StoreError::from_status(status.as_u16(), &body));
        }
        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let body = self.send(request).await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|err| StoreError::Parse(err.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl RegistrationStore for HttpRegistrationStore {
    async fn list_registrations(&self, token: &str) -> Result<Vec<Registration>, StoreError> {
        let url = self.endpoint(&["api", "events", "registrations"])?;
        self.fetch(self.authorized(self.http.get(url), token)).await
    }

    async fn search_registrations(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<Registration>, StoreError> {
        let url = self.endpoint(&["api", "events", "search"])?;
        let request = self.http.get(url).query(&[("search", query)]);
        self.fetch(self.authorized(request, token)).await
    }

    async fn filtered_registrations(
        &self,
        token: &str,
        filters: &RegistrationFilters,
    ) -> Result<FilteredRegistrations, StoreError> {
        let url = self.endpoint(&["api", "analytics", "filtered"])?;
        let request = self.http.get(url).query(&filters.query_pairs());
        self.fetch(self.authorized(request, token)).await
    }

    async fn check_in(&self, token: &str, id: &RegistrationId) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "events", "registrations", id.as_str(), "checkin"])?;
        self.send(self.authorized(self.http.post(url), token))
            .await
            .map(|_| ())
    }

    async fn qr_code(&self, token: &str, id: &RegistrationId) -> Result<QrCode, StoreError> {
        let url = self.endpoint(&["api", "events", "registrations", id.as_str(), "qr"])?;
        let payload: QrCodePayload = self.fetch(self.authorized(self.http.get(url), token)).await?;
        Ok(QrCode::new(payload.qr_code))
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
