// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-entered forms and their validation.
//!
//! Everything here runs before any network call. A rejected form never
//! changes local state.

use crate::error::AppError;
use crate::models::bike::{NewBike, Unit};
use crate::models::service::{IntervalType, ServiceRecord};
use validator::Validate;

/// Parse a numeric text field, rejecting blanks, garbage and non-finite values.
pub fn parse_number(raw: &str, message: &str) -> Result<f64, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

/// Validate a typed odometer value as the owner would log it.
pub fn check_odometer(value: f64) -> Result<f64, AppError> {
    if !value.is_finite() {
        return Err(AppError::Validation("Odometer must be a number.".to_string()));
    }
    if value < 0.0 {
        return Err(AppError::Validation(
            "Odometer must not be negative.".to_string(),
        ));
    }
    Ok(value)
}

/// Parse an odometer text field.
pub fn parse_odometer(raw: &str) -> Result<f64, AppError> {
    check_odometer(parse_number(raw, "Odometer must be a number.")?)
}

/// Add-bike form.
#[derive(Debug, Clone, Validate)]
pub struct AddBikeInput {
    #[validate(length(min = 1, max = 80, message = "Display name is required."))]
    pub display_name: String,
    pub make: Option<String>,
    pub model: Option<String>,
    #[validate(range(min = 1885, max = 2100, message = "Year must be between 1885 and 2100."))]
    pub year: Option<i32>,
    pub unit: Unit,
    /// Current odometer in `unit`
    pub current_odometer: f64,
}

impl AddBikeInput {
    /// Trim, validate and convert into the insert record.
    pub fn into_new_bike(self) -> Result<NewBike, AppError> {
        let input = AddBikeInput {
            display_name: self.display_name.trim().to_string(),
            make: non_blank(self.make),
            model: non_blank(self.model),
            ..self
        };
        input.validate()?;
        let odometer_value = check_odometer(input.current_odometer)?;

        Ok(NewBike {
            display_name: input.display_name,
            make: input.make,
            model: input.model,
            year: input.year,
            unit: input.unit,
            odometer_value,
            odometer_km: input.unit.to_km(odometer_value),
        })
    }
}

/// Add/edit service form, as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDraft {
    /// Present when editing an existing service
    pub service_id: Option<String>,
    pub name: String,
    pub interval_type: IntervalType,
    /// Kilometers/miles (bike unit) or months
    pub interval_value: String,
    /// Kilometers/miles (bike unit) or days
    pub reminder_threshold: String,
    pub estimated_cost: String,
    pub booked: bool,
}

impl ServiceDraft {
    /// Validate the draft for `bike_id`, converting distances from `unit` to km.
    pub fn into_record(self, bike_id: &str, unit: Unit) -> Result<ServiceRecord, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Service name is required.".to_string()));
        }

        let interval = parse_number(&self.interval_value, "Interval value must be a number.")?;
        let reminder = parse_number(
            &self.reminder_threshold,
            "Reminder threshold must be a number.",
        )?;
        let estimated_cost = if self.estimated_cost.trim().is_empty() {
            None
        } else {
            Some(parse_number(
                &self.estimated_cost,
                "Estimated cost must be a number.",
            )?)
        };

        let (interval_value, reminder_threshold) = match self.interval_type {
            IntervalType::Distance => (unit.to_km(interval), unit.to_km(reminder)),
            IntervalType::Time => {
                if interval.fract() != 0.0 || reminder.fract() != 0.0 {
                    return Err(AppError::Validation(
                        "Time intervals must be whole months and days.".to_string(),
                    ));
                }
                (interval, reminder)
            }
        };

        let record = ServiceRecord {
            bike_id: bike_id.to_string(),
            service_id: self.service_id.filter(|id| !id.is_empty()),
            name,
            interval_type: self.interval_type,
            interval_value,
            reminder_threshold,
            estimated_cost,
            booked: self.booked,
        };
        record.validate()?;
        Ok(record)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ServiceDraft {
        ServiceDraft {
            service_id: None,
            name: "  Chain clean & lube ".to_string(),
            interval_type: IntervalType::Distance,
            interval_value: "500".to_string(),
            reminder_threshold: "50".to_string(),
            estimated_cost: "".to_string(),
            booked: false,
        }
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert!(parse_number("abc", "bad").is_err());
        assert!(parse_number("   ", "bad").is_err());
        assert!(parse_number("NaN", "bad").is_err());
        assert!(parse_number("inf", "bad").is_err());
        assert_eq!(parse_number(" 42.5 ", "bad").unwrap(), 42.5);
    }

    #[test]
    fn test_parse_odometer_rejects_negative() {
        let err = parse_odometer("-5").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(parse_odometer("12000").unwrap(), 12000.0);
    }

    #[test]
    fn test_add_bike_converts_miles_to_km() {
        let input = AddBikeInput {
            display_name: " Bonnie ".to_string(),
            make: Some("Triumph".to_string()),
            model: Some("  ".to_string()),
            year: Some(2019),
            unit: Unit::Miles,
            current_odometer: 100.0,
        };
        let bike = input.into_new_bike().unwrap();
        assert_eq!(bike.display_name, "Bonnie");
        assert_eq!(bike.model, None);
        assert_eq!(bike.odometer_value, 100.0);
        assert!((bike.odometer_km - 100.0 * 1.60934).abs() < 1e-9);
    }

    #[test]
    fn test_add_bike_rejects_blank_name_and_bad_year() {
        let mut input = AddBikeInput {
            display_name: "   ".to_string(),
            make: None,
            model: None,
            year: None,
            unit: Unit::Km,
            current_odometer: 0.0,
        };
        assert!(input.clone().into_new_bike().unwrap_err().is_validation());

        input.display_name = "Scrambler".to_string();
        input.year = Some(1700);
        assert!(input.clone().into_new_bike().unwrap_err().is_validation());

        input.year = None;
        input.current_odometer = f64::NAN;
        assert!(input.into_new_bike().unwrap_err().is_validation());
    }

    #[test]
    fn test_service_draft_distance_in_miles() {
        let record = draft().into_record("bike-1", Unit::Miles).unwrap();
        assert_eq!(record.name, "Chain clean & lube");
        assert!((record.interval_value - 500.0 * 1.60934).abs() < 1e-9);
        assert!((record.reminder_threshold - 50.0 * 1.60934).abs() < 1e-9);
        assert_eq!(record.estimated_cost, None);
    }

    #[test]
    fn test_service_draft_time_requires_whole_values() {
        let mut d = draft();
        d.interval_type = IntervalType::Time;
        d.interval_value = "12".to_string();
        d.reminder_threshold = "14".to_string();
        let record = d.clone().into_record("bike-1", Unit::Miles).unwrap();
        assert_eq!(record.interval_value, 12.0);
        assert_eq!(record.reminder_threshold, 14.0);

        d.interval_value = "1.5".to_string();
        assert!(d.into_record("bike-1", Unit::Km).is_err());
    }

    #[test]
    fn test_service_draft_rejects_bad_fields() {
        let mut d = draft();
        d.interval_value = "soon".to_string();
        assert_eq!(
            d.clone().into_record("b", Unit::Km).unwrap_err().to_string(),
            "Interval value must be a number."
        );

        d = draft();
        d.estimated_cost = "cheap".to_string();
        assert!(d.into_record("b", Unit::Km).is_err());

        d = draft();
        d.interval_value = "0".to_string();
        assert!(d.into_record("b", Unit::Km).is_err());
    }
}
