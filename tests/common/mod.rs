// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use moto_maintenance::db::MaintenanceStore;
use moto_maintenance::error::AppError;
use moto_maintenance::models::{
    BikePillRow, NewBike, OdometerReading, RawBikeDetails, ServiceRecord,
};
use moto_maintenance::services::{BikeDetailsController, GarageController, RefreshPolicy};
use moto_maintenance::time_utils::FixedClock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const BIKE_ID: &str = "bike-1";

/// Seconds after which the test controllers consider data stale.
pub const STALE_AFTER_SECS: i64 = 30;

/// Aggregate payload for `bike-1`, a miles bike at 10,000 mi.
pub fn details_fixture() -> Value {
    serde_json::from_str(include_str!("../fixtures/bike_details.json"))
        .expect("Failed to parse bike details fixture")
}

/// Mid-June 2024, after the tires came due.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// In-memory store with call counters, failure injection and an optional
/// gate that holds every write until released.
#[derive(Default)]
pub struct MockStore {
    pub details: Mutex<Value>,
    pub summaries: Mutex<Vec<BikePillRow>>,

    /// Make every fetch fail with this message
    pub fetch_error: Mutex<Option<String>>,
    /// Make every write fail with this message
    pub write_error: Mutex<Option<String>>,
    /// Writes wait on this before completing
    pub gate: Option<Arc<Notify>>,
    /// Set when the first gated write is waiting
    pub write_started: AtomicBool,

    pub fetch_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub write_calls: AtomicUsize,

    pub pin_writes: Mutex<Vec<(String, bool)>>,
    pub completions: Mutex<Vec<String>>,
    pub odometer_writes: Mutex<Vec<OdometerReading>>,
    pub service_writes: Mutex<Vec<ServiceRecord>>,
    pub bike_writes: Mutex<Vec<NewBike>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self {
            details: Mutex::new(details_fixture()),
            ..Default::default()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn fail_fetches(&self, message: &str) {
        *self.fetch_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_writes(&self, message: &str) {
        *self.write_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn fetch_result(&self) -> Result<(), AppError> {
        match self.fetch_error.lock().unwrap().clone() {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    async fn begin_write(&self) -> Result<(), AppError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            self.write_started.store(true, Ordering::SeqCst);
            gate.notified().await;
        }
        match self.write_error.lock().unwrap().clone() {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    fn update_service(&self, service_id: &str, field: &str, value: Value) {
        let mut details = self.details.lock().unwrap();
        if let Some(services) = details["services"].as_array_mut() {
            for service in services.iter_mut() {
                if service["id"] == service_id {
                    service[field] = value.clone();
                }
            }
        }
    }
}

#[async_trait]
impl MaintenanceStore for MockStore {
    async fn fetch_bike_summaries(&self) -> Result<Vec<BikePillRow>, AppError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_result()?;
        Ok(self.summaries.lock().unwrap().clone())
    }

    async fn fetch_bike_details(&self, bike_id: &str) -> Result<RawBikeDetails, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_result()?;
        if bike_id != BIKE_ID {
            return Err(AppError::NotFound(format!("Bike {}", bike_id)));
        }
        let details = self.details.lock().unwrap().clone();
        serde_json::from_value(details).map_err(|e| AppError::Internal(e.into()))
    }

    async fn set_service_pinned(&self, service_id: &str, pinned: bool) -> Result<(), AppError> {
        self.begin_write().await?;
        self.pin_writes
            .lock()
            .unwrap()
            .push((service_id.to_string(), pinned));
        self.update_service(service_id, "pinned", Value::Bool(pinned));
        Ok(())
    }

    async fn mark_service_completed(&self, service_id: &str) -> Result<(), AppError> {
        self.begin_write().await?;
        self.completions.lock().unwrap().push(service_id.to_string());
        Ok(())
    }

    async fn log_odometer(&self, reading: &OdometerReading) -> Result<(), AppError> {
        self.begin_write().await?;
        self.odometer_writes.lock().unwrap().push(reading.clone());
        let mut details = self.details.lock().unwrap();
        details["bike"]["odometer_km"] = serde_json::json!(reading.odometer_km);
        details["bike"]["odometer_value"] = serde_json::json!(reading.value);
        Ok(())
    }

    async fn upsert_service(&self, record: &ServiceRecord) -> Result<(), AppError> {
        self.begin_write().await?;
        self.service_writes.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn add_bike(&self, bike: &NewBike) -> Result<(), AppError> {
        self.begin_write().await?;
        self.bike_writes.lock().unwrap().push(bike.clone());
        self.summaries.lock().unwrap().push(BikePillRow {
            bike_id: format!("bike-{}", self.bike_writes.lock().unwrap().len() + 1),
            display_name: bike.display_name.clone(),
            odometer_display: String::new(),
            due_now_count: 0,
            coming_up_count: 0,
            most_urgent_service_line: None,
        });
        Ok(())
    }
}

/// Bike controller over `store` with a clock pinned to `test_now()`.
#[allow(dead_code)]
pub fn bike_controller(store: Arc<MockStore>) -> (BikeDetailsController, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(test_now()));
    let controller = BikeDetailsController::new(
        store,
        clock.clone(),
        BIKE_ID,
        RefreshPolicy::new(STALE_AFTER_SECS),
    );
    (controller, clock)
}

/// Bike controller that has already completed its first load.
#[allow(dead_code)]
pub async fn loaded_bike_controller(
    store: Arc<MockStore>,
) -> (BikeDetailsController, Arc<FixedClock>) {
    let (controller, clock) = bike_controller(store);
    controller.initial_load().await;
    assert!(controller.aggregate().await.is_some(), "fixture should load");
    (controller, clock)
}

#[allow(dead_code)]
pub fn garage_controller(store: Arc<MockStore>) -> (GarageController, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(test_now()));
    let controller =
        GarageController::new(store, clock.clone(), RefreshPolicy::new(STALE_AFTER_SECS));
    (controller, clock)
}
