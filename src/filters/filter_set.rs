//! Filter Set Module
//!
//! Open mapping from filter name to value. Backed by a `BTreeMap` so the
//! serialized form, and therefore the cache key, never depends on the order
//! filters were added in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

// == Filter Names ==
pub const LOCATION: &str = "location";
pub const FORMAT: &str = "format";
pub const DIFFICULTY_LEVEL: &str = "difficulty_level";
pub const ENGAGEMENT_LEVEL: &str = "engagement_level";
pub const SEARCH: &str = "search";
pub const DATE: &str = "date";
pub const DURATION: &str = "duration";
pub const NEAR: &str = "near";

// == Filter Value ==
/// Value attached to one filter name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// Free text, matched as a substring
    Text(String),
    /// One of a fixed set of values, matched exactly
    Enum(String),
    /// Inclusive date bounds, either side optional
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Inclusive numeric bounds, either side optional
    NumberRange { min: Option<f64>, max: Option<f64> },
    /// Circle around a point
    GeoRadius { lat: f64, lng: f64, radius_km: f64 },
}

// == Filter Set ==
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    // == Builders ==
    /// Adds or replaces a filter.
    pub fn with(mut self, name: impl Into<String>, value: FilterValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        self.with(LOCATION, FilterValue::Text(location.into()))
    }

    pub fn with_search(self, search: impl Into<String>) -> Self {
        self.with(SEARCH, FilterValue::Text(search.into()))
    }

    pub fn with_format(self, format: impl Into<String>) -> Self {
        self.with(FORMAT, FilterValue::Enum(format.into()))
    }

    pub fn with_difficulty_level(self, level: impl Into<String>) -> Self {
        self.with(DIFFICULTY_LEVEL, FilterValue::Enum(level.into()))
    }

    pub fn with_engagement_level(self, level: impl Into<String>) -> Self {
        self.with(ENGAGEMENT_LEVEL, FilterValue::Enum(level.into()))
    }

    pub fn with_date_range(self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.with(DATE, FilterValue::DateRange { from, to })
    }

    pub fn with_duration(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.with(DURATION, FilterValue::NumberRange { min, max })
    }

    pub fn near(self, lat: f64, lng: f64, radius_km: f64) -> Self {
        self.with(NEAR, FilterValue::GeoRadius { lat, lng, radius_km })
    }

    // == Accessors ==
    pub fn insert(&mut self, name: impl Into<String>, value: FilterValue) -> Option<FilterValue> {
        self.filters.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> {
        self.filters.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.filters.get(name)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters.iter().map(|(name, value)| (name.as_str(), value))
    }

    // == Cache Key ==
    /// Stable serialized form used to build cache keys.
    pub fn canonical(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QueryError::InvalidFilter(e.to_string()))
    }

    /// `"{prefix}:{canonical}"`; equal filter content always yields equal keys.
    pub fn cache_key(&self, prefix: &str) -> Result<String> {
        Ok(format!("{}:{}", prefix, self.canonical()?))
    }
}

impl FromIterator<(String, FilterValue)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
