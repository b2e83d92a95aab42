//! Mission row as returned by the listing endpoint

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A short volunteering mission published by an association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// "in_person", "remote" or "hybrid"
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub engagement_level: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub association_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Mission {
    /// Minimal mission, mostly useful for fixtures.
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            location: String::new(),
            format: None,
            difficulty_level: None,
            engagement_level: None,
            start_date: None,
            duration_minutes: None,
            latitude: None,
            longitude: None,
            association_id: None,
            created_at,
        }
    }

    /// Coordinates when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Reads a text column by name, used when evaluating predicates locally.
    pub fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "id" => Some(&self.id),
            "title" => Some(&self.title),
            "description" => Some(&self.description),
            "location" => Some(&self.location),
            "format" => self.format.as_deref(),
            "difficulty_level" => self.difficulty_level.as_deref(),
            "engagement_level" => self.engagement_level.as_deref(),
            "association_id" => self.association_id.as_deref(),
            _ => None,
        }
    }

    pub fn date_field(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "start_date" => self.start_date,
            "created_at" => Some(self.created_at.date_naive()),
            _ => None,
        }
    }

    pub fn number_field(&self, field: &str) -> Option<f64> {
        match field {
            "duration_minutes" => self.duration_minutes.map(f64::from),
            "latitude" => self.latitude,
            "longitude" => self.longitude,
            _ => None,
        }
    }
}
