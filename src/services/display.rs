// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Display strings for statuses, intervals and timeline rows.

use crate::models::{BikeDetails, IntervalDescriptor, ServiceStatus, TimelineEntry, TimelineEvent};
use crate::services::status::Remaining;

/// Rendered in place of a value that does not exist. Never `0`.
pub const ABSENT: &str = "—";

pub fn status_label(status: ServiceStatus) -> &'static str {
    match status {
        ServiceStatus::Ok => "Ok",
        ServiceStatus::ComingUp => "Coming up",
        ServiceStatus::DueNow => "Due now",
        ServiceStatus::SetupNeeded => "Setup needed",
    }
}

/// "200 km remaining", "12 days remaining", or the absence marker.
pub fn remaining_text(remaining: Option<Remaining>) -> String {
    match remaining {
        Some(Remaining::Km(km)) => format!("{} km remaining", format_quantity(km)),
        Some(Remaining::Days(days)) => format!("{} days remaining", days),
        None => ABSENT.to_string(),
    }
}

/// Recurrence length, e.g. "6000 km" or "12 months".
pub fn interval_text(interval: &IntervalDescriptor) -> String {
    match interval {
        IntervalDescriptor::Distance(d) => d
            .interval_km
            .map(|km| format!("{} km", format_quantity(km)))
            .unwrap_or_else(|| ABSENT.to_string()),
        IntervalDescriptor::Time(t) => t
            .interval_months
            .map(|m| format!("{} months", m))
            .unwrap_or_else(|| ABSENT.to_string()),
        IntervalDescriptor::Unset => ABSENT.to_string(),
    }
}

/// Reminder threshold, e.g. "300 km" or "14 days".
pub fn reminder_text(interval: &IntervalDescriptor) -> String {
    match interval {
        IntervalDescriptor::Distance(d) => d
            .reminder_km
            .map(|km| format!("{} km", format_quantity(km)))
            .unwrap_or_else(|| ABSENT.to_string()),
        IntervalDescriptor::Time(t) => t
            .reminder_days
            .map(|days| format!("{} days", days))
            .unwrap_or_else(|| ABSENT.to_string()),
        IntervalDescriptor::Unset => ABSENT.to_string(),
    }
}

pub fn cost_text(cost: Option<f64>) -> String {
    match cost {
        Some(c) if c.fract() == 0.0 => format!("{:.0}", c),
        Some(c) => format!("{:.2}", c),
        None => ABSENT.to_string(),
    }
}

pub fn timeline_title(entry: &TimelineEntry) -> String {
    match &entry.event {
        TimelineEvent::ServiceCompleted { service_name, .. } => service_name
            .clone()
            .unwrap_or_else(|| "Service completed".to_string()),
        TimelineEvent::Odometer { .. } => "Odometer updated".to_string(),
    }
}

/// Second line of a timeline row, using the bike's display unit.
pub fn timeline_detail(entry: &TimelineEntry, bike: &BikeDetails) -> String {
    match &entry.event {
        TimelineEvent::ServiceCompleted { completed_date, .. } => format!(
            "Completed: {}",
            completed_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| ABSENT.to_string())
        ),
        TimelineEvent::Odometer { odometer_value, .. } => match odometer_value {
            Some(v) => format!("Updated: {} {}", format_quantity(*v), bike.unit),
            None => format!("Updated: {}", ABSENT),
        },
    }
}

/// "Odometer: 12,345 km"
pub fn odometer_meta(bike: &BikeDetails) -> String {
    format!(
        "Odometer: {} {}",
        format_thousands(bike.odometer_value),
        bike.unit
    )
}

/// Month and year of the last odometer update, e.g. "May 2024".
pub fn last_updated_label(bike: &BikeDetails) -> String {
    bike.last_odometer_at
        .map(|ts| ts.format("%B %Y").to_string())
        .unwrap_or_else(|| ABSENT.to_string())
}

/// Round to a whole number for display.
fn format_quantity(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        // Avoid "-0"
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

/// Whole number with comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    let digits = format_quantity(value);
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}
