// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST client for the hosted maintenance backend.
//!
//! Handles:
//! - Bike list and bike-details reads
//! - Service pin, completion and upsert writes
//! - Odometer logging and bike creation
//! - Mapping PostgREST error bodies to `AppError`

use crate::config::Config;
use crate::db::{tables, MaintenanceStore};
use crate::error::AppError;
use crate::models::{
    BikePillRow, IntervalType, NewBike, OdometerReading, RawBikeDetails, ServiceRecord,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostgrestError {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

/// Backend client authenticated as the signed-in owner.
#[derive(Clone)]
pub struct SupabaseStore {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    bearer_token: String,
}

impl SupabaseStore {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.bearer_token(),
        )
    }

    /// Create a client against an explicit project URL.
    pub fn with_base_url(project_url: &str, api_key: &str, bearer_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }

    /// URL of a table or view.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// URL of a table filtered to a single row by id.
    pub fn row_url(&self, table: &str, id: &str) -> String {
        format!(
            "{}/{}?id=eq.{}",
            self.rest_url,
            table,
            urlencoding::encode(id)
        )
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{}", self.rest_url, function)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer_token)
    }

    /// Send a write and discard the body.
    async fn send_write(
        &self,
        method: reqwest::Method,
        url: &str,
        body: serde_json::Value,
    ) -> Result<(), AppError> {
        let response = self
            .request(method, url)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response(response).await?;
        Ok(())
    }

    /// Send a request and parse its JSON body.
    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let response = check_response(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Payload(e.to_string()))
    }
}

/// Check response status and map failures to `AppError`.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let error = error_from_body(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), error = %error, "Backend request failed");
    Err(error)
}

/// Translate an HTTP status and PostgREST body into an `AppError`.
pub fn error_from_body(status: u16, body: &str) -> AppError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            }
        });

    match status {
        401 => AppError::Unauthorized,
        404 => AppError::NotFound(message),
        _ => AppError::Backend(message),
    }
}

/// Column payload for a bike insert, including its initial odometer.
pub fn bike_columns(bike: &NewBike) -> serde_json::Value {
    json!({
        "display_name": bike.display_name,
        "make": bike.make,
        "model": bike.model,
        "year": bike.year,
        "unit": bike.unit,
        "odometer_value": bike.odometer_value,
        "odometer_km": bike.odometer_km,
    })
}

/// Column payload for a service insert or update.
pub fn service_columns(record: &ServiceRecord) -> serde_json::Value {
    let mut columns = json!({
        "name": record.name,
        "interval_type": record.interval_type,
        "estimated_cost": record.estimated_cost,
        "is_booked": record.booked,
    });
    match record.interval_type {
        IntervalType::Distance => {
            columns["interval_distance_km"] = json!(record.interval_value);
            columns["reminder_distance_km"] = json!(record.reminder_threshold);
        }
        IntervalType::Time => {
            columns["interval_months"] = json!(record.interval_value.round() as i64);
            columns["reminder_days"] = json!(record.reminder_threshold.round() as i64);
        }
    }
    if record.service_id.is_none() {
        columns["bike_id"] = json!(record.bike_id);
    }
    columns
}

#[async_trait]
impl MaintenanceStore for SupabaseStore {
    async fn fetch_bike_summaries(&self) -> Result<Vec<BikePillRow>, AppError> {
        let url = self.table_url(tables::BIKE_PILLS_VIEW);
        let builder = self
            .request(reqwest::Method::GET, &url)
            .query(&[("select", "*"), ("order", "display_name.asc")]);
        self.send_json(builder).await
    }

    async fn fetch_bike_details(&self, bike_id: &str) -> Result<RawBikeDetails, AppError> {
        let url = self.rpc_url(tables::BIKE_DETAILS_RPC);
        let builder = self
            .request(reqwest::Method::POST, &url)
            .json(&json!({ "p_bike_id": bike_id }));

        let payload: Option<RawBikeDetails> = self.send_json(builder).await?;
        payload.ok_or_else(|| AppError::NotFound(format!("Bike {}", bike_id)))
    }

    async fn set_service_pinned(&self, service_id: &str, pinned: bool) -> Result<(), AppError> {
        let url = self.row_url(tables::SERVICES, service_id);
        self.send_write(reqwest::Method::PATCH, &url, json!({ "pinned": pinned }))
            .await?;
        tracing::info!(service_id, pinned, "Service pin updated");
        Ok(())
    }

    async fn mark_service_completed(&self, service_id: &str) -> Result<(), AppError> {
        let url = self.table_url(tables::SERVICE_COMPLETIONS);
        self.send_write(
            reqwest::Method::POST,
            &url,
            json!({ "service_id": service_id }),
        )
        .await?;
        tracing::info!(service_id, "Service completion recorded");
        Ok(())
    }

    async fn log_odometer(&self, reading: &OdometerReading) -> Result<(), AppError> {
        let url = self.table_url(tables::ODOMETER_LOG);
        let body = serde_json::to_value(reading).map_err(|e| AppError::Internal(e.into()))?;
        self.send_write(reqwest::Method::POST, &url, body).await?;
        tracing::info!(
            bike_id = %reading.bike_id,
            odometer_km = reading.odometer_km,
            "Odometer logged"
        );
        Ok(())
    }

    async fn upsert_service(&self, record: &ServiceRecord) -> Result<(), AppError> {
        let columns = service_columns(record);
        match &record.service_id {
            Some(service_id) => {
                let url = self.row_url(tables::SERVICES, service_id);
                self.send_write(reqwest::Method::PATCH, &url, columns).await?;
                tracing::info!(service_id = %service_id, "Service updated");
            }
            None => {
                let url = self.table_url(tables::SERVICES);
                self.send_write(reqwest::Method::POST, &url, columns).await?;
                tracing::info!(bike_id = %record.bike_id, name = %record.name, "Service created");
            }
        }
        Ok(())
    }

    async fn add_bike(&self, bike: &NewBike) -> Result<(), AppError> {
        // One insert; the backend seeds the odometer log from these columns.
        let url = self.table_url(tables::BIKES);
        self.send_write(reqwest::Method::POST, &url, bike_columns(bike)).await?;
        tracing::info!(
            name = %bike.display_name,
            odometer_km = bike.odometer_km,
            "Bike created"
        );
        Ok(())
    }
}
