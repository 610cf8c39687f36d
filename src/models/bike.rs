// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bike model, measurement units and odometer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kilometers in one statute mile.
pub const KM_PER_MILE: f64 = 1.60934;

/// Distance unit an owner reads their odometer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Unit {
    #[default]
    Km,
    Miles,
}

impl Unit {
    /// Convert a value in this unit to canonical kilometers.
    pub fn to_km(self, value: f64) -> f64 {
        match self {
            Unit::Km => value,
            Unit::Miles => value * KM_PER_MILE,
        }
    }

    /// Convert canonical kilometers into this unit.
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Unit::Km => km,
            Unit::Miles => km / KM_PER_MILE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Km => "km",
            Unit::Miles => "miles",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" => Ok(Unit::Km),
            "mi" | "mile" | "miles" => Ok(Unit::Miles),
            other => Err(format!("Unknown unit: {}", other)),
        }
    }
}

/// Bike record as returned in the details aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeDetails {
    pub id: String,
    pub display_name: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub unit: Unit,
    /// Canonical odometer reading
    pub odometer_km: f64,
    /// Odometer reading expressed in `unit`
    pub odometer_value: f64,
    pub last_odometer_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the bike list, computed upstream and only rendered here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BikePillRow {
    pub bike_id: String,
    pub display_name: String,
    /// Preformatted odometer text, e.g. "12,400 km"
    #[serde(default)]
    pub odometer_display: String,
    #[serde(default)]
    pub due_now_count: u32,
    #[serde(default)]
    pub coming_up_count: u32,
    pub most_urgent_service_line: Option<String>,
}

/// Insert payload for a new bike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBike {
    pub display_name: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub unit: Unit,
    /// Initial odometer in `unit`
    pub odometer_value: f64,
    /// Initial odometer in canonical kilometers
    pub odometer_km: f64,
}

/// Odometer log entry written for a bike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OdometerReading {
    pub bike_id: String,
    /// Value as the owner typed it
    pub value: f64,
    pub unit: Unit,
    pub odometer_km: f64,
}

impl OdometerReading {
    pub fn new(bike_id: impl Into<String>, value: f64, unit: Unit) -> Self {
        Self {
            bike_id: bike_id.into(),
            value,
            unit,
            odometer_km: unit.to_km(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miles_to_km() {
        let km = Unit::Miles.to_km(100.0);
        assert!((km - 160.934).abs() < 1e-9);
        assert!((Unit::Miles.from_km(km) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_km_is_identity() {
        assert_eq!(Unit::Km.to_km(4321.5), 4321.5);
        assert_eq!(Unit::Km.from_km(4321.5), 4321.5);
    }

    #[test]
    fn test_unit_parse_and_serde() {
        assert_eq!("Miles".parse::<Unit>(), Ok(Unit::Miles));
        assert_eq!("km".parse::<Unit>(), Ok(Unit::Km));
        assert!("furlongs".parse::<Unit>().is_err());
        assert_eq!(serde_json::to_string(&Unit::Miles).unwrap(), "\"miles\"");
    }

    #[test]
    fn test_odometer_reading_carries_canonical_km() {
        let reading = OdometerReading::new("bike-1", 250.0, Unit::Miles);
        assert!((reading.odometer_km - 402.335).abs() < 1e-9);
        assert_eq!(reading.value, 250.0);
    }
}
