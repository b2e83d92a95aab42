//! Mission Request Module
//!
//! Turns a [`FilterSet`] into a conjunction of predicates plus offset/limit.
//! The same request is rendered to query parameters by remote sources and
//! evaluated directly by the in-memory source.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{QueryError, Result};
use crate::filters::filter_set::{
    DATE, DIFFICULTY_LEVEL, DURATION, ENGAGEMENT_LEVEL, FORMAT, LOCATION, NEAR, SEARCH,
};
use crate::filters::{geo, FilterSet, FilterValue};
use crate::models::{Mission, PageRequest};

// == Predicate ==
/// One condition on a mission row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    ContainsIgnoreCase { field: String, value: String },
    Equals { field: String, value: String },
    /// Disjunction, true if any inner predicate matches
    AnyOf(Vec<Predicate>),
    OnOrAfter { field: String, date: NaiveDate },
    OnOrBefore { field: String, date: NaiveDate },
    AtLeast { field: String, value: f64 },
    AtMost { field: String, value: f64 },
    WithinRadius { lat: f64, lng: f64, radius_km: f64 },
}

impl Predicate {
    fn contains(field: &str, value: &str) -> Self {
        Predicate::ContainsIgnoreCase {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn equals(field: &str, value: &str) -> Self {
        Predicate::Equals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    // == Matches ==
    /// Evaluates the predicate against a row. Missing columns never match.
    pub fn matches(&self, mission: &Mission) -> bool {
        match self {
            Predicate::ContainsIgnoreCase { field, value } => mission
                .text_field(field)
                .map(|text| text.to_lowercase().contains(&value.to_lowercase()))
                .unwrap_or(false),
            Predicate::Equals { field, value } => mission.text_field(field) == Some(value.as_str()),
            Predicate::AnyOf(inner) => inner.iter().any(|p| p.matches(mission)),
            Predicate::OnOrAfter { field, date } => {
                mission.date_field(field).is_some_and(|d| d >= *date)
            }
            Predicate::OnOrBefore { field, date } => {
                mission.date_field(field).is_some_and(|d| d <= *date)
            }
            Predicate::AtLeast { field, value } => {
                mission.number_field(field).is_some_and(|n| n >= *value)
            }
            Predicate::AtMost { field, value } => {
                mission.number_field(field).is_some_and(|n| n <= *value)
            }
            Predicate::WithinRadius {
                lat,
                lng,
                radius_km,
            } => mission
                .coordinates()
                .is_some_and(|point| geo::haversine_km((*lat, *lng), point) <= *radius_km),
        }
    }
}

// == Mission Request ==
/// Everything a source needs to list one page of missions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionRequest {
    /// All must match
    pub predicates: Vec<Predicate>,
    pub offset: u64,
    pub limit: u32,
}

impl MissionRequest {
    /// Builds the request for one page of the given filters.
    pub fn from_filters(filters: &FilterSet, page: PageRequest) -> Result<Self> {
        Ok(Self {
            predicates: compose(filters)?,
            offset: page.offset(),
            limit: page.page_size,
        })
    }

    pub fn matches(&self, mission: &Mission) -> bool {
        self.predicates.iter().all(|p| p.matches(mission))
    }

    /// Radius predicate, if any; remote sources need it for post-filtering.
    pub fn radius(&self) -> Option<(f64, f64, f64)> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::WithinRadius {
                lat,
                lng,
                radius_km,
            } => Some((*lat, *lng, *radius_km)),
            _ => None,
        })
    }
}

// == Composition ==
/// Maps every filter to its predicates, in filter-name order.
///
/// Absent filters and blank text add nothing. Unknown names and values of the
/// wrong kind are rejected.
pub fn compose(filters: &FilterSet) -> Result<Vec<Predicate>> {
    let mut predicates = Vec::with_capacity(filters.len());

    for (name, value) in filters.iter() {
        match (name, value) {
            (LOCATION, FilterValue::Text(text)) => {
                if let Some(text) = non_blank(text) {
                    predicates.push(Predicate::contains("location", text));
                }
            }
            (
                FORMAT | DIFFICULTY_LEVEL | ENGAGEMENT_LEVEL,
                FilterValue::Enum(text) | FilterValue::Text(text),
            ) => {
                if let Some(text) = non_blank(text) {
                    predicates.push(Predicate::equals(name, text));
                }
            }
            (SEARCH, FilterValue::Text(text)) => {
                if let Some(text) = non_blank(text) {
                    predicates.push(Predicate::AnyOf(vec![
                        Predicate::contains("title", text),
                        Predicate::contains("description", text),
                    ]));
                }
            }
            (DATE, FilterValue::DateRange { from, to }) => {
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(QueryError::InvalidFilter(format!(
                            "date range starts after it ends ({} > {})",
                            from, to
                        )));
                    }
                }
                if let Some(from) = from {
                    predicates.push(Predicate::OnOrAfter {
                        field: "start_date".to_string(),
                        date: *from,
                    });
                }
                if let Some(to) = to {
                    predicates.push(Predicate::OnOrBefore {
                        field: "start_date".to_string(),
                        date: *to,
                    });
                }
            }
            (DURATION, FilterValue::NumberRange { min, max }) => {
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(QueryError::InvalidFilter(format!(
                            "duration range starts after it ends ({} > {})",
                            min, max
                        )));
                    }
                }
                if let Some(min) = min {
                    predicates.push(Predicate::AtLeast {
                        field: "duration_minutes".to_string(),
                        value: *min,
                    });
                }
                if let Some(max) = max {
                    predicates.push(Predicate::AtMost {
                        field: "duration_minutes".to_string(),
                        value: *max,
                    });
                }
            }
            (
                NEAR,
                FilterValue::GeoRadius {
                    lat,
                    lng,
                    radius_km,
                },
            ) => {
                validate_radius(*lat, *lng, *radius_km)?;
                predicates.push(Predicate::WithinRadius {
                    lat: *lat,
                    lng: *lng,
                    radius_km: *radius_km,
                });
            }
            (
                LOCATION | FORMAT | DIFFICULTY_LEVEL | ENGAGEMENT_LEVEL | SEARCH | DATE | DURATION
                | NEAR,
                _,
            ) => {
                return Err(QueryError::InvalidFilter(format!(
                    "filter '{}' does not accept {:?}",
                    name, value
                )));
            }
            _ => {
                return Err(QueryError::InvalidFilter(format!(
                    "unknown filter '{}'",
                    name
                )));
            }
        }
    }

    Ok(predicates)
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn validate_radius(lat: f64, lng: f64, radius_km: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(QueryError::InvalidFilter(format!(
            "coordinates out of range ({}, {})",
            lat, lng
        )));
    }
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(QueryError::InvalidFilter(format!(
            "radius must be positive, got {}",
            radius_km
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn mission() -> Mission {
        let mut m = Mission::new(
            "m-1",
            "Jardin partagé",
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        );
        m.description = "Entretien du potager de quartier".to_string();
        m.location = "Paris 11e".to_string();
        m.format = Some("in_person".to_string());
        m.difficulty_level = Some("easy".to_string());
        m.engagement_level = Some("one_time".to_string());
        m.start_date = NaiveDate::from_ymd_opt(2024, 4, 10);
        m.duration_minutes = Some(120);
        m.latitude = Some(48.8589);
        m.longitude = Some(2.3800);
        m
    }

    fn request(filters: FilterSet) -> MissionRequest {
        MissionRequest::from_filters(&filters, PageRequest::new(1, 10)).unwrap()
    }

    #[test]
    fn test_no_filters_matches_everything() {
        let req = request(FilterSet::new());
        assert!(req.predicates.is_empty());
        assert!(req.matches(&mission()));
    }

    #[test]
    fn test_location_is_case_insensitive_substring() {
        assert!(request(FilterSet::new().with_location("paris")).matches(&mission()));
        assert!(!request(FilterSet::new().with_location("lyon")).matches(&mission()));
    }

    #[test]
    fn test_enum_filters_are_exact() {
        assert!(request(FilterSet::new().with_format("in_person")).matches(&mission()));
        assert!(!request(FilterSet::new().with_format("in_pers")).matches(&mission()));
        assert!(!request(FilterSet::new().with_difficulty_level("EASY")).matches(&mission()));
    }

    #[test]
    fn test_search_matches_title_or_description() {
        assert!(request(FilterSet::new().with_search("JARDIN")).matches(&mission()));
        assert!(request(FilterSet::new().with_search("potager")).matches(&mission()));
        assert!(!request(FilterSet::new().with_search("cuisine")).matches(&mission()));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filters = FilterSet::new().with_search("potager").with_location("Lyon");
        assert!(!request(filters).matches(&mission()));
    }

    #[test]
    fn test_blank_text_adds_no_constraint() {
        let req = request(FilterSet::new().with_search("   ").with_location(""));
        assert!(req.predicates.is_empty());
    }

    #[test]
    fn test_date_range() {
        let from = NaiveDate::from_ymd_opt(2024, 4, 1);
        let to = NaiveDate::from_ymd_opt(2024, 4, 10);
        assert!(request(FilterSet::new().with_date_range(from, to)).matches(&mission()));

        let late = NaiveDate::from_ymd_opt(2024, 4, 11);
        assert!(!request(FilterSet::new().with_date_range(late, None)).matches(&mission()));
    }

    #[test]
    fn test_inverted_date_range_is_invalid() {
        let filters = FilterSet::new().with_date_range(
            NaiveDate::from_ymd_opt(2024, 5, 1),
            NaiveDate::from_ymd_opt(2024, 4, 1),
        );
        let result = MissionRequest::from_filters(&filters, PageRequest::new(1, 10));
        assert!(matches!(result, Err(QueryError::InvalidFilter(_))));
    }

    #[test]
    fn test_duration_range() {
        assert!(request(FilterSet::new().with_duration(Some(60.0), Some(120.0))).matches(&mission()));
        assert!(!request(FilterSet::new().with_duration(None, Some(90.0))).matches(&mission()));
    }

    #[test]
    fn test_near() {
        // Place de la République, about 1 km away
        assert!(request(FilterSet::new().near(48.8675, 2.3637, 3.0)).matches(&mission()));
        assert!(!request(FilterSet::new().near(45.764, 4.8357, 50.0)).matches(&mission()));
    }

    #[test]
    fn test_near_without_coordinates_never_matches() {
        let mut m = mission();
        m.latitude = None;
        assert!(!request(FilterSet::new().near(48.8675, 2.3637, 3000.0)).matches(&m));
    }

    #[test]
    fn test_invalid_radius() {
        let filters = FilterSet::new().near(48.0, 2.0, 0.0);
        let result = MissionRequest::from_filters(&filters, PageRequest::new(1, 10));
        assert!(matches!(result, Err(QueryError::InvalidFilter(_))));
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let filters = FilterSet::new().with("colour", FilterValue::Text("blue".into()));
        let result = compose(&filters);
        assert!(matches!(result, Err(QueryError::InvalidFilter(_))));
    }

    #[test]
    fn test_wrong_value_kind_is_rejected() {
        let filters = FilterSet::new().with(SEARCH, FilterValue::NumberRange { min: None, max: None });
        assert!(compose(&filters).is_err());
    }

    #[test]
    fn test_offset_and_limit() {
        let req = MissionRequest::from_filters(&FilterSet::new(), PageRequest::new(4, 25)).unwrap();
        assert_eq!(req.offset, 75);
        assert_eq!(req.limit, 25);
    }
}
