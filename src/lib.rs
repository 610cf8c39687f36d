// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Moto-Maintenance: service tracking for motorcycle owners
//!
//! This crate provides the maintenance-tool core: due-status evaluation for
//! distance- and time-based services, year-grouped ownership timelines, and
//! optimistic mutations against the hosted backend.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{MaintenanceStore, SupabaseStore};
use services::{BikeDetailsController, GarageController, RefreshPolicy};
use std::sync::Arc;
use time_utils::{Clock, SystemClock};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn MaintenanceStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the hosted backend and the wall clock from configuration.
    pub fn from_config(config: Config) -> Self {
        let store: Arc<dyn MaintenanceStore> = Arc::new(SupabaseStore::new(&config));
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn garage(&self) -> GarageController {
        GarageController::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            RefreshPolicy::new(self.config.summaries_stale_after_secs),
        )
    }

    pub fn bike(&self, bike_id: &str) -> BikeDetailsController {
        BikeDetailsController::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            bike_id,
            RefreshPolicy::new(self.config.details_stale_after_secs),
        )
    }
}
