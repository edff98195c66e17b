use std::{collections::BTreeSet, str::FromStr};

use shared::domain::{Gender, UnknownGender};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue<T> {
    Unconstrained,
    Constrained(T),
}

impl<T> Default for FilterValue<T> {
    fn default() -> Self {
        FilterValue::Unconstrained
    }
}

impl<T> FilterValue<T> {
    pub fn as_constrained(&self) -> Option<&T> {
        match self {
            FilterValue::Unconstrained => None,
            FilterValue::Constrained(value) => Some(value),
        }
    }

    pub fn is_constrained(&self) -> bool {
        self.as_constrained().is_some()
    }
}

impl<T> From<Option<T>> for FilterValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Unconstrained, FilterValue::Constrained)
    }
}

const ALL_SELECTION: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("expected 'all', 'true' or 'false', got '{0}'")]
    InvalidFlag(String),
    #[error(transparent)]
    Gender(#[from] UnknownGender),
}

impl FromStr for FilterValue<bool> {
    type Err = FilterParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            ALL_SELECTION => Ok(FilterValue::Unconstrained),
            "true" => Ok(FilterValue::Constrained(true)),
            "false" => Ok(FilterValue::Constrained(false)),
            _ => Err(FilterParseError::InvalidFlag(value.to_string())),
        }
    }
}

impl FromStr for FilterValue<Gender> {
    type Err = FilterParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case(ALL_SELECTION) {
            return Ok(FilterValue::Unconstrained);
        }
        Ok(FilterValue::Constrained(value.parse()?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationFilters {
    pub gender: FilterValue<Gender>,
    pub profession: FilterValue<BTreeSet<String>>,
    pub checked_in: FilterValue<bool>,
    pub newsletter_sub: FilterValue<bool>,
}

impl RegistrationFilters {
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = FilterValue::Constrained(gender);
        self
    }

    pub fn with_professions<I, S>(mut self, professions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = professions
            .into_iter()
            .map(Into::into)
            .filter(|profession| !profession.trim().is_empty())
            .collect();
        self.profession = if set.is_empty() {
            FilterValue::Unconstrained
        } else {
            FilterValue::Constrained(set)
        };
        self
    }

    pub fn with_checked_in(mut self, checked_in: bool) -> Self {
        self.checked_in = FilterValue::Constrained(checked_in);
        self
    }

    pub fn with_newsletter_sub(mut self, subscribed: bool) -> Self {
        self.newsletter_sub = FilterValue::Constrained(subscribed);
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn professions(&self) -> Option<&BTreeSet<String>> {
        self.profession.as_constrained().filter(|set| !set.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.gender.is_constrained()
            || self.professions().is_some()
            || self.checked_in.is_constrained()
            || self.newsletter_sub.is_constrained()
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(gender) = self.gender.as_constrained() {
            pairs.push(("gender", gender.as_str().to_string()));
        }
        if let Some(professions) = self.professions() {
            let joined = professions.iter().cloned().collect::<Vec<_>>().join(",");
            pairs.push(("profession", joined));
        }
        if let Some(checked_in) = self.checked_in.as_constrained() {
            pairs.push(("checkedIn", checked_in.to_string()));
        }
        if let Some(subscribed) = self.newsletter_sub.as_constrained() {
            pairs.push(("newsletterSub", subscribed.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
    pub search: String,
    pub filters: RegistrationFilters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    All,
    Search(String),
    Filtered(RegistrationFilters),
}

impl QueryInput {
    pub fn plan(&self) -> QueryPlan {
        if !self.search.trim().is_empty() {
            QueryPlan::Search(self.search.clone())
        } else if self.filters.is_active() {
            QueryPlan::Filtered(self.filters.clone())
        } else {
            QueryPlan::All
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_takes_precedence_over_filters() {
        let input = QueryInput {
            search: "  jane ".into(),
            filters: RegistrationFilters::default()
                .with_gender(Gender::Male)
                .with_checked_in(true),
        };
        assert_eq!(input.plan(), QueryPlan::Search("  jane ".into()));
    }

    #[test]
    fn blank_search_without_filters_lists_everything() {
        let input = QueryInput {
            search: "   ".into(),
            filters: RegistrationFilters::default().with_professions(Vec::<String>::new()),
        };
        assert_eq!(input.plan(), QueryPlan::All);
    }

    #[test]
    fn gender_only_filter_emits_single_parameter() {
        let filters = RegistrationFilters::default().with_gender(Gender::Female);
        let input = QueryInput {
            search: String::new(),
            filters: filters.clone(),
        };
        assert_eq!(input.plan(), QueryPlan::Filtered(filters.clone()));
        assert_eq!(
            filters.query_pairs(),
            vec![("gender", "FEMALE".to_string())]
        );
    }

    #[test]
    fn every_dimension_serializes_when_constrained() {
        let filters = RegistrationFilters::default()
            .with_professions(["STUDENT", "FOUNDER"])
            .with_checked_in(false)
            .with_newsletter_sub(true);
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("profession", "FOUNDER,STUDENT".to_string()),
                ("checkedIn", "false".to_string()),
                ("newsletterSub", "true".to_string()),
            ]
        );
    }

    #[test]
    fn empty_constrained_profession_set_is_inactive() {
        let filters = RegistrationFilters {
            profession: FilterValue::Constrained(BTreeSet::new()),
            ..RegistrationFilters::default()
        };
        assert!(!filters.is_active());
        assert!(filters.query_pairs().is_empty());
    }

    #[test]
    fn clear_resets_every_dimension() {
        let mut filters = RegistrationFilters::default()
            .with_gender(Gender::Other)
            .with_newsletter_sub(false);
        filters.clear();
        assert_eq!(filters, RegistrationFilters::default());
    }

    #[test]
    fn parses_ui_selections() {
        assert_eq!(
            "all".parse::<FilterValue<bool>>(),
            Ok(FilterValue::Unconstrained)
        );
        assert_eq!(
            "TRUE".parse::<FilterValue<bool>>(),
            Ok(FilterValue::Constrained(true))
        );
        assert!("yes".parse::<FilterValue<bool>>().is_err());
        assert_eq!(
            "female".parse::<FilterValue<Gender>>(),
            Ok(FilterValue::Constrained(Gender::Female))
        );
        assert_eq!(
            "All".parse::<FilterValue<Gender>>(),
            Ok(FilterValue::Unconstrained)
        );
    }
}
