// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data access layer (hosted Postgres via PostgREST).

pub mod supabase;

pub use supabase::SupabaseStore;

use crate::error::AppError;
use crate::models::{BikePillRow, NewBike, OdometerReading, RawBikeDetails, ServiceRecord};
use async_trait::async_trait;

/// Table, view and RPC names as constants.
pub mod tables {
    pub const BIKE_PILLS_VIEW: &str = "maintenance_bike_pills_v1";
    pub const BIKE_DETAILS_RPC: &str = "maintenance_get_bike_details_v1";
    pub const BIKES: &str = "maintenance_bikes";
    pub const SERVICES: &str = "maintenance_services";
    pub const SERVICE_COMPLETIONS: &str = "maintenance_service_completions";
    pub const ODOMETER_LOG: &str = "maintenance_odometer_log";
}

/// Reads and writes the maintenance core depends on.
///
/// Every failure is reported as an `AppError`; callers treat any error from
/// a write as "write failed".
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Per-bike list rows, ordered by display name.
    async fn fetch_bike_summaries(&self) -> Result<Vec<BikePillRow>, AppError>;

    /// The aggregate `{ bike, services, timeline }` payload for one bike.
    async fn fetch_bike_details(&self, bike_id: &str) -> Result<RawBikeDetails, AppError>;

    async fn set_service_pinned(&self, service_id: &str, pinned: bool) -> Result<(), AppError>;

    async fn mark_service_completed(&self, service_id: &str) -> Result<(), AppError>;

    async fn log_odometer(&self, reading: &OdometerReading) -> Result<(), AppError>;

    /// Create (no `service_id`) or update a service.
    async fn upsert_service(&self, record: &ServiceRecord) -> Result<(), AppError>;

    async fn add_bike(&self, bike: &NewBike) -> Result<(), AppError>;
}
