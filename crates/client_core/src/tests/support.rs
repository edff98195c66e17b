use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::{
    domain::{Registration, RegistrationId, RegistrationStatus},
    error::ApiError,
    protocol::{BreakdownEntry, Breakdowns, FilteredRegistrations},
};

use crate::{
    error::StoreError,
    filters::RegistrationFilters,
    qr::QrCode,
    session::StaticSession,
    store::RegistrationStore,
};

pub(crate) fn registration(id: &str, first_name: &str, last_name: &str) -> Registration {
    Registration {
        id: RegistrationId::from(id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!(
            "{}.{}@example.com",
            first_name.to_ascii_lowercase(),
            last_name.to_ascii_lowercase()
        ),
        gender: "FEMALE".to_string(),
        location: "Lagos".to_string(),
        location_other: None,
        profession: vec!["STUDENT".to_string()],
        profession_other: None,
        referral_source: "TWITTER".to_string(),
        referral_source_other: None,
        pipeline_interest: "YES".to_string(),
        interests: None,
        open_source_knowledge: 5,
        is_community_member: false,
        community_details: None,
        newsletter_sub: false,
        event_id: None,
        event: None,
        status: RegistrationStatus::Confirmed,
        checked_in: false,
        check_in_time: None,
        created_at: "2025-03-01T09:30:00Z".parse().expect("timestamp"),
    }
}

pub(crate) fn roster() -> Vec<Registration> {
    let people = [
        ("r01", "Jane", "Doe", "FEMALE", "STUDENT", true),
        ("r02", "John", "Doe", "MALE", "FOUNDER", false),
        ("r03", "Ada", "Obi", "FEMALE", "BACKEND_DEVELOPER", true),
        ("r04", "Tunde", "Bello", "MALE", "STUDENT", true),
        ("r05", "Chi", "Eze", "OTHER", "DATA_SCIENTIST", false),
        ("r06", "Janet", "Musa", "FEMALE", "FOUNDER", false),
        ("r07", "Kemi", "Ade", "FEMALE", "STUDENT", false),
        ("r08", "Femi", "Ojo", "MALE", "DEVOPS_ENGINEER", true),
        ("r09", "Zara", "Ali", "PREFER_NOT_TO_SAY", "EDUCATOR", false),
        ("r10", "Jane", "Okafor", "FEMALE", "DATA_SCIENTIST", true),
    ];
    people
        .into_iter()
        .map(|(id, first, last, gender, profession, newsletter)| {
            let mut record = registration(id, first, last);
            record.gender = gender.to_string();
            record.profession = vec![profession.to_string()];
            record.newsletter_sub = newsletter;
            record
        })
        .collect()
}

fn filter_matches(filters: &RegistrationFilters, registration: &Registration) -> bool {
    let gender_ok = filters
        .gender
        .as_constrained()
        .map_or(true, |gender| registration.gender.eq_ignore_ascii_case(gender.as_str()));
    let profession_ok = filters
        .profession
        .as_constrained()
        .filter(|wanted| !wanted.is_empty())
        .map_or(true, |wanted| {
            registration.profession.iter().any(|tag| wanted.contains(tag))
        });
    let checked_in_ok = filters
        .checked_in
        .as_constrained()
        .map_or(true, |checked_in| registration.checked_in == *checked_in);
    let newsletter_ok = filters
        .newsletter_sub
        .as_constrained()
        .map_or(true, |subscribed| registration.newsletter_sub == *subscribed);
    gender_ok && profession_ok && checked_in_ok && newsletter_ok
}

pub(crate) fn session() -> Arc<StaticSession> {
    Arc::new(StaticSession::new("test-token"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    List,
    Search(String),
    Filtered(RegistrationFilters),
    CheckIn(RegistrationId),
    Qr(RegistrationId),
}

impl StoreCall {
    fn key(&self) -> String {
        match self {
            StoreCall::List => "list".to_string(),
            StoreCall::Search(query) => format!("search:{query}"),
            StoreCall::Filtered(_) => "filtered".to_string(),
            StoreCall::CheckIn(id) => format!("check_in:{id}"),
            StoreCall::Qr(id) => format!("qr:{id}"),
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedStore {
    records: Mutex<Vec<Registration>>,
    calls: Mutex<Vec<StoreCall>>,
    tokens: Mutex<Vec<String>>,
    latency: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<String, StoreError>>,
}

impl ScriptedStore {
    pub(crate) fn with_records(records: Vec<Registration>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Self::default()
        })
    }

    pub(crate) fn delay(&self, key: &str, latency: Duration) {
        self.latency
            .lock()
            .expect("latency lock")
            .insert(key.to_string(), latency);
    }

    pub(crate) fn fail(&self, key: &str, error: StoreError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(key.to_string(), error);
    }

    pub(crate) fn heal(&self, key: &str) {
        self.failures.lock().expect("failures lock").remove(key);
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().expect("tokens lock").clone()
    }

    pub(crate) fn record(&self, id: &str) -> Option<Registration> {
        self.records
            .lock()
            .expect("records lock")
            .iter()
            .find(|record| record.id.as_str() == id)
            .cloned()
    }

    async fn enter(&self, token: &str, call: StoreCall) -> Result<(), StoreError> {
        let key = call.key();
        self.calls.lock().expect("calls lock").push(call);
        self.tokens
            .lock()
            .expect("tokens lock")
            .push(token.to_string());
        let latency = self.latency.lock().expect("latency lock").get(&key).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.lock().expect("failures lock").get(&key).cloned();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> Vec<Registration> {
        self.records.lock().expect("records lock").clone()
    }
}

#[async_trait]
impl RegistrationStore for ScriptedStore {
    async fn list_registrations(&self, token: &str) -> Result<Vec<Registration>, StoreError> {
        self.enter(token, StoreCall::List).await?;
        Ok(self.snapshot())
    }

    async fn search_registrations(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<Registration>, StoreError> {
        self.enter(token, StoreCall::Search(query.to_string())).await?;
        let needle = query.to_ascii_lowercase();
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|record| {
                record.full_name().to_ascii_lowercase().contains(&needle)
                    || record.email.to_ascii_lowercase().contains(&needle)
            })
            .collect())
    }

    async fn filtered_registrations(
        &self,
        token: &str,
        filters: &RegistrationFilters,
    ) -> Result<FilteredRegistrations, StoreError> {
        self.enter(token, StoreCall::Filtered(filters.clone())).await?;
        let registrations: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|record| filter_matches(filters, record))
            .collect();
        let checked_in = registrations.iter().filter(|record| record.checked_in).count();
        Ok(FilteredRegistrations {
            total_count: registrations.len() as u64,
            breakdowns: Breakdowns {
                checked_in: vec![BreakdownEntry {
                    name: "true".to_string(),
                    count: checked_in as u64,
                }],
                ..Breakdowns::default()
            },
            registrations,
        })
    }

    async fn check_in(&self, token: &str, id: &RegistrationId) -> Result<(), StoreError> {
        self.enter(token, StoreCall::CheckIn(id.clone())).await?;
        let mut records = self.records.lock().expect("records lock");
        match records.iter_mut().find(|record| &record.id == id) {
            Some(record) => {
                record.mark_checked_in(chrono::Utc::now());
                Ok(())
            }
            None => Err(ApiError::new(404, "Registration not found").into()),
        }
    }

    async fn qr_code(&self, token: &str, id: &RegistrationId) -> Result<QrCode, StoreError> {
        self.enter(token, StoreCall::Qr(id.clone())).await?;
        Ok(QrCode::new(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(id.as_str())
        )))
    }
}
