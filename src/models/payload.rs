// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary parsing of the bike-details aggregate.
//!
//! The backend returns loosely typed JSON rows. Each row is decoded on its
//! own so one malformed service or timeline row is flagged and skipped
//! instead of failing the whole screen. Only a missing or unusable bike
//! record rejects the payload.

use crate::error::AppError;
use crate::models::bike::{BikeDetails, Unit};
use crate::models::service::{
    DistanceInterval, IntervalDescriptor, Service, ServiceStatus, TimeInterval,
};
use crate::models::timeline::{TimelineEntry, TimelineEvent};
use crate::time_utils::{parse_date, parse_timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Aggregate payload exactly as the details RPC returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBikeDetails {
    #[serde(default)]
    pub bike: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub services: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timeline: Vec<Value>,
}

/// `json_agg` over zero rows yields `null`, not `[]`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Bike columns are read loosely and type-checked one by one so a bad
/// cosmetic field is flagged instead of failing the screen.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBike {
    id: Option<Value>,
    display_name: Option<Value>,
    make: Option<Value>,
    model: Option<Value>,
    year: Option<Value>,
    unit: Option<Value>,
    odometer_km: Option<Value>,
    odometer_value: Option<Value>,
    last_odometer_at: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServiceRow {
    id: Option<String>,
    name: Option<String>,
    pinned: Option<bool>,
    status: Option<String>,
    is_booked: Option<bool>,
    interval_type: Option<String>,
    interval_distance_km: Option<f64>,
    reminder_distance_km: Option<f64>,
    last_done_km: Option<f64>,
    next_due_km: Option<f64>,
    remaining_km: Option<f64>,
    interval_months: Option<f64>,
    reminder_days: Option<f64>,
    last_done_date: Option<String>,
    next_due_date: Option<String>,
    remaining_days: Option<f64>,
    urgency_rank: Option<f64>,
    estimated_cost: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTimelineRow {
    event_type: Option<String>,
    service_id: Option<String>,
    occurred_at: Option<String>,
    occurred_date: Option<String>,
    occurred_year: Option<Value>,
    odometer_km: Option<f64>,
    odometer_value: Option<f64>,
    service_name: Option<String>,
    completed_date: Option<String>,
}

/// Typed bike-details aggregate that derivations run on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeAggregate {
    pub bike: BikeDetails,
    pub services: Vec<Service>,
    pub timeline: Vec<TimelineEntry>,
}

impl BikeAggregate {
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    pub fn service_mut(&mut self, service_id: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.id == service_id)
    }
}

/// Part of the payload a flagged row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSection {
    Bike,
    Services,
    Timeline,
}

/// A malformed-but-tolerated detail found while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadIssue {
    pub section: PayloadSection,
    /// Row index within the section (0 for the bike)
    pub index: usize,
    /// Whether the row was dropped entirely
    pub rejected: bool,
    pub reason: String,
}

/// Parse outcome: the usable aggregate plus everything that was flagged.
#[derive(Debug, Clone)]
pub struct ParsedBikeDetails {
    pub aggregate: BikeAggregate,
    pub issues: Vec<PayloadIssue>,
}

/// Validate a raw aggregate into the typed model.
pub fn parse_bike_details(raw: RawBikeDetails) -> Result<ParsedBikeDetails, AppError> {
    let mut issues = Vec::new();

    let bike_value = raw
        .bike
        .ok_or_else(|| AppError::Payload("bike record missing".to_string()))?;
    let bike = parse_bike(bike_value, &mut issues)?;

    let services = raw
        .services
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| parse_service(index, row, &mut issues))
        .collect();

    let timeline = raw
        .timeline
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| parse_timeline_entry(index, row, &mut issues))
        .collect();

    for issue in &issues {
        tracing::warn!(
            bike_id = %bike.id,
            section = ?issue.section,
            index = issue.index,
            rejected = issue.rejected,
            reason = %issue.reason,
            "Flagged payload row"
        );
    }

    Ok(ParsedBikeDetails {
        aggregate: BikeAggregate {
            bike,
            services,
            timeline,
        },
        issues,
    })
}

fn flag(issues: &mut Vec<PayloadIssue>, section: PayloadSection, index: usize, reason: String) {
    issues.push(PayloadIssue {
        section,
        index,
        rejected: false,
        reason,
    });
}

fn reject(issues: &mut Vec<PayloadIssue>, section: PayloadSection, index: usize, reason: String) {
    issues.push(PayloadIssue {
        section,
        index,
        rejected: true,
        reason,
    });
}

fn parse_bike(value: Value, issues: &mut Vec<PayloadIssue>) -> Result<BikeDetails, AppError> {
    const SECTION: PayloadSection = PayloadSection::Bike;

    let raw: RawBike = serde_json::from_value(value)
        .map_err(|e| AppError::Payload(format!("bike record: {}", e)))?;

    let id = match raw.id {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => return Err(AppError::Payload("bike record has no id".to_string())),
    };

    let unit = match text_field(raw.unit, "unit", SECTION, 0, issues) {
        Some(u) => u.parse::<Unit>().unwrap_or_else(|e| {
            flag(issues, SECTION, 0, e);
            Unit::Km
        }),
        None => {
            flag(issues, SECTION, 0, "unit missing".to_string());
            Unit::Km
        }
    };

    let odometer_km = number_field(raw.odometer_km, "odometer_km", SECTION, 0, issues);
    let odometer_value = number_field(raw.odometer_value, "odometer_value", SECTION, 0, issues);
    let (odometer_km, odometer_value) = match (odometer_km, odometer_value) {
        (Some(km), Some(value)) => (km, value),
        (Some(km), None) => (km, unit.from_km(km)),
        (None, Some(value)) => (unit.to_km(value), value),
        (None, None) => {
            return Err(AppError::Payload(format!(
                "bike {} has no odometer reading",
                id
            )))
        }
    };

    let year = number_field(raw.year, "year", SECTION, 0, issues).and_then(|y| {
        let whole = whole_i32(y);
        if whole.is_none() {
            flag(issues, SECTION, 0, format!("year {} is not a whole number", y));
        }
        whole
    });

    let display_name = text_field(raw.display_name, "display_name", SECTION, 0, issues);
    let last_odometer_at = text_field(raw.last_odometer_at, "last_odometer_at", SECTION, 0, issues);
    let created_at = text_field(raw.created_at, "created_at", SECTION, 0, issues);
    let updated_at = text_field(raw.updated_at, "updated_at", SECTION, 0, issues);

    Ok(BikeDetails {
        display_name: display_name.unwrap_or_else(|| id.clone()),
        make: text_field(raw.make, "make", SECTION, 0, issues),
        model: text_field(raw.model, "model", SECTION, 0, issues),
        id,
        year,
        unit,
        odometer_km,
        odometer_value,
        last_odometer_at: timestamp_field(last_odometer_at, "last_odometer_at", SECTION, 0, issues),
        created_at: timestamp_field(created_at, "created_at", SECTION, 0, issues),
        updated_at: timestamp_field(updated_at, "updated_at", SECTION, 0, issues),
    })
}

/// A string column; any other JSON type is flagged and dropped.
fn text_field(
    value: Option<Value>,
    name: &str,
    section: PayloadSection,
    index: usize,
    issues: &mut Vec<PayloadIssue>,
) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => {
            flag(issues, section, index, format!("{} {} is not text", name, other));
            None
        }
    }
}

/// A numeric column. Numeric strings are accepted; anything else is flagged.
fn number_field(
    value: Option<Value>,
    name: &str,
    section: PayloadSection,
    index: usize,
    issues: &mut Vec<PayloadIssue>,
) -> Option<f64> {
    let parsed = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite());
    if parsed.is_none() {
        flag(issues, section, index, format!("{} is not a number", name));
    }
    parsed
}

fn parse_service(index: usize, value: Value, issues: &mut Vec<PayloadIssue>) -> Option<Service> {
    const SECTION: PayloadSection = PayloadSection::Services;

    let raw: RawServiceRow = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            reject(issues, SECTION, index, e.to_string());
            return None;
        }
    };

    let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
        reject(issues, SECTION, index, "service row has no id".to_string());
        return None;
    };

    let status = match raw.status.as_deref() {
        Some(s) => ServiceStatus::parse(s).unwrap_or_else(|| {
            flag(issues, SECTION, index, format!("unknown status {:?}", s));
            ServiceStatus::SetupNeeded
        }),
        None => ServiceStatus::SetupNeeded,
    };

    let has_distance_fields = raw.interval_distance_km.is_some()
        || raw.reminder_distance_km.is_some()
        || raw.last_done_km.is_some()
        || raw.next_due_km.is_some();
    let has_time_fields = raw.interval_months.is_some()
        || raw.reminder_days.is_some()
        || raw.last_done_date.is_some()
        || raw.next_due_date.is_some();

    let interval = match raw.interval_type.as_deref() {
        Some("distance") => {
            if has_time_fields {
                flag(issues, SECTION, index, "time fields on a distance service".to_string());
            }
            IntervalDescriptor::Distance(DistanceInterval {
                interval_km: raw.interval_distance_km,
                reminder_km: raw.reminder_distance_km,
                last_done_km: raw.last_done_km,
                next_due_km: raw.next_due_km,
                remaining_km: raw.remaining_km,
            })
        }
        Some("time") => {
            if has_distance_fields {
                flag(issues, SECTION, index, "distance fields on a time service".to_string());
            }
            IntervalDescriptor::Time(TimeInterval {
                interval_months: whole_field(raw.interval_months, "interval_months", index, issues),
                reminder_days: whole_field(raw.reminder_days, "reminder_days", index, issues)
                    .map(i64::from),
                last_done_date: date_field(
                    raw.last_done_date,
                    "last_done_date",
                    SECTION,
                    index,
                    issues,
                ),
                next_due_date: date_field(
                    raw.next_due_date,
                    "next_due_date",
                    SECTION,
                    index,
                    issues,
                ),
                remaining_days: raw.remaining_days.map(|d| d.round() as i64),
            })
        }
        Some(other) => {
            flag(issues, SECTION, index, format!("unknown interval type {:?}", other));
            IntervalDescriptor::Unset
        }
        None => IntervalDescriptor::Unset,
    };

    Some(Service {
        name: raw.name.unwrap_or_default(),
        id,
        pinned: raw.pinned.unwrap_or(false),
        booked: raw.is_booked.unwrap_or(false),
        status,
        interval,
        urgency_rank: raw.urgency_rank.map(|r| r as i64).unwrap_or(i64::MAX),
        estimated_cost: raw.estimated_cost,
    })
}

fn parse_timeline_entry(
    index: usize,
    value: Value,
    issues: &mut Vec<PayloadIssue>,
) -> Option<TimelineEntry> {
    const SECTION: PayloadSection = PayloadSection::Timeline;

    let raw: RawTimelineRow = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            reject(issues, SECTION, index, e.to_string());
            return None;
        }
    };

    let event = match raw.event_type.as_deref() {
        Some("odometer") => TimelineEvent::Odometer {
            odometer_km: raw.odometer_km,
            odometer_value: raw.odometer_value,
        },
        Some("service") => TimelineEvent::ServiceCompleted {
            service_id: raw.service_id,
            service_name: raw.service_name,
            completed_date: date_field(
                raw.completed_date,
                "completed_date",
                SECTION,
                index,
                issues,
            ),
        },
        other => {
            reject(issues, SECTION, index, format!("unknown event type {:?}", other));
            return None;
        }
    };

    let occurred_year = match raw.occurred_year {
        None | Some(Value::Null) => {
            flag(issues, SECTION, index, "occurred_year missing".to_string());
            None
        }
        Some(v) => {
            let year = match &v {
                Value::Number(n) => n.as_f64().and_then(whole_i32),
                Value::String(s) => s.trim().parse::<i32>().ok(),
                _ => None,
            };
            if year.is_none() {
                flag(issues, SECTION, index, format!("occurred_year {} unparseable", v));
            }
            year
        }
    };

    Some(TimelineEntry {
        event,
        occurred_at: timestamp_field(raw.occurred_at, "occurred_at", SECTION, index, issues),
        occurred_date: date_field(raw.occurred_date, "occurred_date", SECTION, index, issues),
        occurred_year,
    })
}

fn whole_i32(value: f64) -> Option<i32> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) {
        Some(value as i32)
    } else {
        None
    }
}

fn whole_field(
    value: Option<f64>,
    name: &str,
    index: usize,
    issues: &mut Vec<PayloadIssue>,
) -> Option<i32> {
    let v = value?;
    let whole = whole_i32(v);
    if whole.is_none() {
        flag(
            issues,
            PayloadSection::Services,
            index,
            format!("{} {} is not a whole number", name, v),
        );
    }
    whole
}

fn date_field(
    value: Option<String>,
    name: &str,
    section: PayloadSection,
    index: usize,
    issues: &mut Vec<PayloadIssue>,
) -> Option<chrono::NaiveDate> {
    let raw = value?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        flag(issues, section, index, format!("{} {:?} unparseable", name, raw));
    }
    parsed
}

fn timestamp_field(
    value: Option<String>,
    name: &str,
    section: PayloadSection,
    index: usize,
    issues: &mut Vec<PayloadIssue>,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = value?;
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        flag(issues, section, index, format!("{} {:?} unparseable", name, raw));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bike_json() -> Value {
        json!({
            "id": "bike-1",
            "display_name": "Tenere",
            "make": "Yamaha",
            "model": "Tenere 700",
            "year": 2021,
            "unit": "km",
            "odometer_km": 7800,
            "odometer_value": 7800,
            "last_odometer_at": "2024-05-01T10:00:00Z",
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        })
    }

    #[test]
    fn test_parse_full_aggregate() {
        let raw = RawBikeDetails {
            bike: Some(bike_json()),
            services: vec![json!({
                "id": "svc-1",
                "name": "Oil & filter",
                "pinned": true,
                "status": "coming_up",
                "is_booked": false,
                "interval_type": "distance",
                "interval_distance_km": 3000,
                "reminder_distance_km": 300,
                "last_done_km": 5000,
                "next_due_km": 8000,
                "remaining_km": 200,
                "interval_months": null,
                "urgency_rank": 2,
                "estimated_cost": 75.5
            })],
            timeline: vec![json!({
                "event_type": "odometer",
                "service_id": null,
                "occurred_at": "2024-05-01T10:00:00Z",
                "occurred_date": "2024-05-01",
                "occurred_year": 2024,
                "odometer_km": 7800,
                "odometer_value": 7800
            })],
        };

        let parsed = parse_bike_details(raw).unwrap();
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);

        let agg = parsed.aggregate;
        assert_eq!(agg.bike.year, Some(2021));
        assert_eq!(agg.services.len(), 1);
        let svc = &agg.services[0];
        assert!(svc.pinned);
        assert_eq!(svc.status, ServiceStatus::ComingUp);
        assert_eq!(svc.urgency_rank, 2);
        match &svc.interval {
            IntervalDescriptor::Distance(d) => {
                assert_eq!(d.next_due_km, Some(8000.0));
                assert_eq!(d.reminder_km, Some(300.0));
            }
            other => panic!("unexpected interval {:?}", other),
        }
        assert_eq!(agg.timeline[0].occurred_year, Some(2024));
    }

    #[test]
    fn test_missing_bike_rejects_payload() {
        let err = parse_bike_details(RawBikeDetails::default()).unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));
    }

    #[test]
    fn test_bike_odometer_derived_from_value() {
        let mut bike = bike_json();
        bike["unit"] = json!("miles");
        bike["odometer_km"] = Value::Null;
        bike["odometer_value"] = json!(100);
        let parsed = parse_bike_details(RawBikeDetails {
            bike: Some(bike),
            ..Default::default()
        })
        .unwrap();
        assert!((parsed.aggregate.bike.odometer_km - 160.934).abs() < 1e-9);
    }

    #[test]
    fn test_service_without_id_is_rejected_not_fatal() {
        let raw = RawBikeDetails {
            bike: Some(bike_json()),
            services: vec![json!({ "name": "Ghost" }), json!({ "id": "svc-2", "name": "Tyres" })],
            timeline: vec![],
        };
        let parsed = parse_bike_details(raw).unwrap();
        assert_eq!(parsed.aggregate.services.len(), 1);
        assert_eq!(parsed.aggregate.services[0].id, "svc-2");
        assert_eq!(
            parsed.aggregate.services[0].interval,
            IntervalDescriptor::Unset
        );
        assert!(parsed.issues.iter().any(|i| i.rejected && i.index == 0));
    }

    #[test]
    fn test_foreign_group_fields_are_dropped() {
        let raw = RawBikeDetails {
            bike: Some(bike_json()),
            services: vec![json!({
                "id": "svc-3",
                "name": "Coolant",
                "interval_type": "time",
                "interval_months": 24,
                "reminder_days": 30,
                "last_done_date": "2023-03-01",
                "next_due_km": 9000
            })],
            timeline: vec![],
        };
        let parsed = parse_bike_details(raw).unwrap();
        match &parsed.aggregate.services[0].interval {
            IntervalDescriptor::Time(t) => {
                assert_eq!(t.interval_months, Some(24));
                assert_eq!(t.reminder_days, Some(30));
            }
            other => panic!("unexpected interval {:?}", other),
        }
        assert_eq!(parsed.issues.len(), 1);
        assert!(!parsed.issues[0].rejected);
    }

    #[test]
    fn test_unparseable_year_is_kept_without_year() {
        let raw = RawBikeDetails {
            bike: Some(bike_json()),
            services: vec![],
            timeline: vec![
                json!({ "event_type": "odometer", "occurred_year": "twenty" }),
                json!({ "event_type": "service", "occurred_year": "2023" }),
                json!({ "event_type": "party", "occurred_year": 2023 }),
            ],
        };
        let parsed = parse_bike_details(raw).unwrap();
        assert_eq!(parsed.aggregate.timeline.len(), 2);
        assert_eq!(parsed.aggregate.timeline[0].occurred_year, None);
        assert_eq!(parsed.aggregate.timeline[1].occurred_year, Some(2023));
    }

    #[test]
    fn test_null_sections_decode_as_empty() {
        let raw: RawBikeDetails = serde_json::from_value(json!({
            "bike": bike_json(),
            "services": null,
            "timeline": null
        }))
        .unwrap();
        assert!(raw.services.is_empty());
        assert!(raw.timeline.is_empty());

        let parsed = parse_bike_details(raw).unwrap();
        assert!(parsed.aggregate.services.is_empty());
        assert!(parsed.aggregate.timeline.is_empty());
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_mistyped_bike_fields_are_flagged_not_fatal() {
        let mut bike = bike_json();
        bike["year"] = json!("2021");
        bike["make"] = json!(42);
        bike["created_at"] = json!(false);
        bike["odometer_value"] = json!("7800");
        let parsed = parse_bike_details(RawBikeDetails {
            bike: Some(bike),
            ..Default::default()
        })
        .unwrap();

        let agg = parsed.aggregate;
        assert_eq!(agg.bike.year, Some(2021));
        assert_eq!(agg.bike.make, None);
        assert_eq!(agg.bike.created_at, None);
        assert_eq!(agg.bike.odometer_value, 7800.0);
        assert_eq!(parsed.issues.len(), 2, "{:?}", parsed.issues);
        assert!(parsed
            .issues
            .iter()
            .all(|i| i.section == PayloadSection::Bike && !i.rejected));
    }

    #[test]
    fn test_bike_without_usable_id_or_odometer_is_rejected() {
        let mut bike = bike_json();
        bike["id"] = json!(17);
        let err = parse_bike_details(RawBikeDetails {
            bike: Some(bike),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));

        let mut bike = bike_json();
        bike["odometer_km"] = json!("lots");
        bike["odometer_value"] = json!({});
        let err = parse_bike_details(RawBikeDetails {
            bike: Some(bike),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));
    }
}
