// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ownership timeline entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What happened at a timeline point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TimelineEvent {
    Odometer {
        odometer_km: Option<f64>,
        /// Reading in the bike's unit
        odometer_value: Option<f64>,
    },
    #[serde(rename = "service")]
    ServiceCompleted {
        service_id: Option<String>,
        service_name: Option<String>,
        completed_date: Option<NaiveDate>,
    },
}

/// A point-in-time event on a bike. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub event: TimelineEvent,
    pub occurred_at: Option<DateTime<Utc>>,
    pub occurred_date: Option<NaiveDate>,
    /// Year as recorded by the backend; not recomputed locally
    pub occurred_year: Option<i32>,
}

impl TimelineEntry {
    /// Stable list key for rendering.
    pub fn key(&self) -> String {
        let (kind, subject) = match &self.event {
            TimelineEvent::Odometer { .. } => ("odometer", "odo"),
            TimelineEvent::ServiceCompleted { service_id, .. } => {
                ("service", service_id.as_deref().unwrap_or("odo"))
            }
        };
        let at = self
            .occurred_at
            .map(crate::time_utils::format_utc_rfc3339)
            .unwrap_or_default();
        format!("{}-{}-{}", kind, subject, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_service_completion() {
        let entry = TimelineEntry {
            event: TimelineEvent::ServiceCompleted {
                service_id: Some("svc-9".to_string()),
                service_name: Some("Brake fluid".to_string()),
                completed_date: None,
            },
            occurred_at: crate::time_utils::parse_timestamp("2024-04-01T08:00:00Z"),
            occurred_date: None,
            occurred_year: Some(2024),
        };
        assert_eq!(entry.key(), "service-svc-9-2024-04-01T08:00:00Z");
    }

    #[test]
    fn test_key_for_odometer_without_timestamp() {
        let entry = TimelineEntry {
            event: TimelineEvent::Odometer {
                odometer_km: Some(100.0),
                odometer_value: Some(100.0),
            },
            occurred_at: None,
            occurred_date: None,
            occurred_year: None,
        };
        assert_eq!(entry.key(), "odometer-odo-");
    }
}
