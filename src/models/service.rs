// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maintenance service model and its interval descriptor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Due status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ServiceStatus {
    Ok,
    ComingUp,
    DueNow,
    #[default]
    SetupNeeded,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Ok => "ok",
            ServiceStatus::ComingUp => "coming_up",
            ServiceStatus::DueNow => "due_now",
            ServiceStatus::SetupNeeded => "setup_needed",
        }
    }

    /// Parse the wire form; unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ok" => Some(ServiceStatus::Ok),
            "coming_up" => Some(ServiceStatus::ComingUp),
            "due_now" => Some(ServiceStatus::DueNow),
            "setup_needed" => Some(ServiceStatus::SetupNeeded),
            _ => None,
        }
    }
}

/// How a service recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IntervalType {
    Distance,
    Time,
}

impl IntervalType {
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalType::Distance => "distance",
            IntervalType::Time => "time",
        }
    }
}

impl std::str::FromStr for IntervalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(IntervalType::Distance),
            "time" => Ok(IntervalType::Time),
            other => Err(format!("Unknown interval type: {}", other)),
        }
    }
}

/// Distance-based recurrence. All values in kilometers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceInterval {
    pub interval_km: Option<f64>,
    /// How far before due to start warning
    pub reminder_km: Option<f64>,
    pub last_done_km: Option<f64>,
    pub next_due_km: Option<f64>,
    /// Server-derived
    pub remaining_km: Option<f64>,
}

/// Time-based recurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub interval_months: Option<i32>,
    /// How many days before due to start warning
    pub reminder_days: Option<i64>,
    pub last_done_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    /// Server-derived
    pub remaining_days: Option<i64>,
}

/// Recurrence rule of a service. Only the group matching the type exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "interval_type", rename_all = "lowercase")]
pub enum IntervalDescriptor {
    Distance(DistanceInterval),
    Time(TimeInterval),
    /// No interval type configured yet
    #[default]
    Unset,
}

impl IntervalDescriptor {
    pub fn interval_type(&self) -> Option<IntervalType> {
        match self {
            IntervalDescriptor::Distance(_) => Some(IntervalType::Distance),
            IntervalDescriptor::Time(_) => Some(IntervalType::Time),
            IntervalDescriptor::Unset => None,
        }
    }
}

/// Maintenance task attached to a bike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub pinned: bool,
    pub booked: bool,
    /// Status as computed by the backend
    pub status: ServiceStatus,
    pub interval: IntervalDescriptor,
    /// Opaque sort key supplied by the backend
    pub urgency_rank: i64,
    pub estimated_cost: Option<f64>,
}

/// Create or update payload for a service.
///
/// Distance values are canonical kilometers; time values are months/days.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct ServiceRecord {
    pub bike_id: String,
    /// Present when editing an existing service
    pub service_id: Option<String>,
    #[validate(length(min = 1, max = 120, message = "Service name is required."))]
    pub name: String,
    pub interval_type: IntervalType,
    #[validate(range(
        exclusive_min = 0.0,
        message = "Interval value must be greater than zero."
    ))]
    pub interval_value: f64,
    #[validate(range(min = 0.0, message = "Reminder threshold must not be negative."))]
    pub reminder_threshold: f64,
    #[validate(range(min = 0.0, message = "Estimated cost must not be negative."))]
    pub estimated_cost: Option<f64>,
    pub booked: bool,
}
