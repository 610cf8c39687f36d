// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Due-status evaluation for maintenance services.
//!
//! Given a service's interval descriptor and a reference point (current
//! odometer for distance intervals, current date for time intervals), derive
//! the status and the remaining quantity. Malformed descriptors degrade to
//! `setup_needed`; nothing here returns an error.

use crate::models::service::{
    DistanceInterval, IntervalDescriptor, Service, ServiceStatus, TimeInterval,
};
use crate::time_utils::{add_months, days_between};
use chrono::NaiveDate;
use serde::Serialize;

/// Distance or time left until a service is due. Negative when overdue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Remaining {
    Km(f64),
    Days(i64),
}

/// Status plus remaining quantity for one service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub status: ServiceStatus,
    pub remaining: Option<Remaining>,
}

impl Evaluation {
    const SETUP_NEEDED: Evaluation = Evaluation {
        status: ServiceStatus::SetupNeeded,
        remaining: None,
    };
}

/// Evaluate a service against the bike's odometer and today's date.
pub fn evaluate_status(
    service: &Service,
    reference_odometer_km: f64,
    reference_date: NaiveDate,
) -> Evaluation {
    evaluate_interval(&service.interval, reference_odometer_km, reference_date)
}

/// Evaluate a bare interval descriptor.
pub fn evaluate_interval(
    interval: &IntervalDescriptor,
    reference_odometer_km: f64,
    reference_date: NaiveDate,
) -> Evaluation {
    match interval {
        IntervalDescriptor::Distance(d) => evaluate_distance(d, reference_odometer_km),
        IntervalDescriptor::Time(t) => evaluate_time(t, reference_date),
        IntervalDescriptor::Unset => Evaluation::SETUP_NEEDED,
    }
}

fn evaluate_distance(interval: &DistanceInterval, odometer_km: f64) -> Evaluation {
    let Some(next_due_km) = resolve_next_due_km(interval) else {
        return Evaluation::SETUP_NEEDED;
    };
    if !odometer_km.is_finite() {
        return Evaluation::SETUP_NEEDED;
    }

    let remaining_km = next_due_km - odometer_km;
    let reminder_km = interval.reminder_km.filter(|r| r.is_finite());

    Evaluation {
        status: classify(remaining_km, reminder_km),
        remaining: Some(Remaining::Km(remaining_km)),
    }
}

/// Next due odometer: stored value, else last done plus interval.
pub fn resolve_next_due_km(interval: &DistanceInterval) -> Option<f64> {
    if interval.last_done_km.is_none() && interval.next_due_km.is_none() {
        return None;
    }
    if interval.interval_km.is_some_and(|i| !i.is_finite() || i < 0.0) {
        return None;
    }
    match interval.next_due_km {
        Some(next) => Some(next).filter(|n| n.is_finite()),
        None => {
            let last = interval.last_done_km.filter(|l| l.is_finite())?;
            let every = interval.interval_km?;
            Some(last + every)
        }
    }
}

fn evaluate_time(interval: &TimeInterval, today: NaiveDate) -> Evaluation {
    let Some(next_due_date) = resolve_next_due_date(interval) else {
        return Evaluation::SETUP_NEEDED;
    };

    let remaining_days = days_between(today, next_due_date);
    let reminder_days = interval.reminder_days.map(|r| r as f64);

    Evaluation {
        status: classify(remaining_days as f64, reminder_days),
        remaining: Some(Remaining::Days(remaining_days)),
    }
}

/// Next due date: stored value, else last done plus interval months.
pub fn resolve_next_due_date(interval: &TimeInterval) -> Option<NaiveDate> {
    if interval.last_done_date.is_none() && interval.next_due_date.is_none() {
        return None;
    }
    if interval.interval_months.is_some_and(|m| m < 0) {
        return None;
    }
    match interval.next_due_date {
        Some(next) => Some(next),
        None => add_months(interval.last_done_date?, interval.interval_months?),
    }
}

/// Threshold rule shared by both branches.
///
/// A missing or non-positive reminder never yields `coming_up`.
fn classify(remaining: f64, reminder: Option<f64>) -> ServiceStatus {
    if remaining <= 0.0 {
        ServiceStatus::DueNow
    } else if reminder.is_some_and(|r| r > 0.0 && remaining <= r) {
        ServiceStatus::ComingUp
    } else {
        ServiceStatus::Ok
    }
}
