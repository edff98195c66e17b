use serde::{Deserialize, Serialize};

use crate::domain::Registration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    #[serde(default)]
    pub gender: Vec<BreakdownEntry>,
    #[serde(default)]
    pub checked_in: Vec<BreakdownEntry>,
    #[serde(default)]
    pub newsletter_sub: Vec<BreakdownEntry>,
    #[serde(default)]
    pub profession: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredRegistrations {
    pub total_count: u64,
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub breakdowns: Breakdowns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodePayload {
    pub qr_code: String,
}
