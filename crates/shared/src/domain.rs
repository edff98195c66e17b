use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub String);

impl RegistrationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegistrationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
            Gender::PreferNotToSay => "PREFER_NOT_TO_SAY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gender '{0}'")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            "PREFER_NOT_TO_SAY" => Ok(Gender::PreferNotToSay),
            _ => Err(UnknownGender(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistrationStatus {
    Confirmed,
    #[default]
    Pending,
    Other(String),
}

impl RegistrationStatus {
    pub fn from_wire(value: &str) -> Self {
        match value.trim() {
            "" | "PENDING" => RegistrationStatus::Pending,
            "CONFIRMED" => RegistrationStatus::Confirmed,
            other => RegistrationStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegistrationStatus::Confirmed => "CONFIRMED",
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Other(value) => value,
        }
    }
}

impl Serialize for RegistrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegistrationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(RegistrationStatus::from_wire)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: RegistrationId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_other: Option<String>,
    #[serde(default)]
    pub profession: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession_other: Option<String>,
    #[serde(default)]
    pub referral_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_source_other: Option<String>,
    #[serde(default)]
    pub pipeline_interest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    #[serde(default)]
    pub open_source_knowledge: u8,
    #[serde(default)]
    pub is_community_member: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_details: Option<String>,
    #[serde(default)]
    pub newsletter_sub: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
    #[serde(default)]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn mark_checked_in(&mut self, at: DateTime<Utc>) -> bool {
        if self.checked_in {
            if self.check_in_time.is_none() {
                self.check_in_time = Some(at);
            }
            return false;
        }
        self.checked_in = true;
        self.check_in_time = Some(at);
        true
    }
}
