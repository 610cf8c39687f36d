// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bike-list screen controller.

use crate::db::MaintenanceStore;
use crate::error::AppError;
use crate::models::{AddBikeInput, BikePillRow};
use crate::services::mutation::{
    AliveFlag, BusySet, MutationOutcome, RefreshPolicy, RefreshTokenTracker,
};
use crate::time_utils::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Busy key for the add-bike form; only one save at a time.
const ADD_BIKE_KEY: &str = "add-bike";

#[derive(Debug, Default)]
struct GarageState {
    rows: Vec<BikePillRow>,
    error: Option<String>,
    loading: bool,
    last_fetch_at: Option<DateTime<Utc>>,
    refresh_tokens: RefreshTokenTracker,
}

/// Controller for the owner's bike list.
pub struct GarageController {
    store: Arc<dyn MaintenanceStore>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
    state: Mutex<GarageState>,
    busy: BusySet,
    alive: AliveFlag,
}

impl GarageController {
    pub fn new(
        store: Arc<dyn MaintenanceStore>,
        clock: Arc<dyn Clock>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            state: Mutex::new(GarageState::default()),
            busy: BusySet::new(),
            alive: AliveFlag::default(),
        }
    }

    pub async fn rows(&self) -> Vec<BikePillRow> {
        self.state.lock().await.rows.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Nothing to show and nothing went wrong: prompt for the first bike.
    pub async fn show_empty_prompt(&self) -> bool {
        let state = self.state.lock().await;
        !state.loading && state.rows.is_empty() && state.error.is_none()
    }

    pub fn is_saving(&self) -> bool {
        self.busy.contains(ADD_BIKE_KEY)
    }

    pub fn unmount(&self) {
        self.alive.kill();
    }

    /// Fetch the bike list, committing it if still mounted.
    pub async fn load(&self) -> Result<bool, AppError> {
        let rows = self.store.fetch_bike_summaries().await?;
        if !self.alive.is_alive() {
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        tracing::debug!(count = rows.len(), "Bike list loaded");
        state.rows = rows;
        state.last_fetch_at = Some(self.clock.now());
        state.error = None;
        Ok(true)
    }

    pub async fn initial_load(&self) {
        self.state.lock().await.loading = true;
        let result = self.load().await;
        if !self.alive.is_alive() {
            return;
        }

        let mut state = self.state.lock().await;
        state.loading = false;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Bike list load failed");
            state.error = Some(e.user_message(AppError::LOAD_BIKES_FAILED));
        }
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Bike list refresh failed");
            if self.alive.is_alive() {
                self.state.lock().await.error = Some(e.user_message(AppError::REFRESH_FAILED));
            }
        }
    }

    /// Refetch on focus when the token changed or the list is stale.
    ///
    /// Focus-time failures are logged only; the list stays as it was.
    pub async fn on_focus(&self, refresh_token: Option<&str>) -> bool {
        let should_fetch = {
            let mut state = self.state.lock().await;
            let token_changed = state.refresh_tokens.observe(refresh_token);
            token_changed || self.policy.is_stale(state.last_fetch_at, self.clock.now())
        };

        if !should_fetch {
            return false;
        }
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Bike list focus refresh failed");
        }
        true
    }

    /// Validate and create a bike, then reload the list.
    pub async fn add_bike(&self, input: AddBikeInput) -> Result<MutationOutcome, AppError> {
        let bike = match input.into_new_bike() {
            Ok(bike) => bike,
            Err(e) => {
                self.record_error(&e, AppError::BIKE_SAVE_FAILED).await;
                return Err(e);
            }
        };

        let Some(_guard) = self.busy.try_acquire(ADD_BIKE_KEY) else {
            return Ok(MutationOutcome::Skipped);
        };

        tracing::info!(
            name = %bike.display_name,
            unit = %bike.unit,
            odometer_km = bike.odometer_km,
            "Adding bike"
        );
        if let Err(e) = self.store.add_bike(&bike).await {
            tracing::warn!(error = %e, "Add bike failed");
            self.record_error(&e, AppError::BIKE_SAVE_FAILED).await;
            return Err(e);
        }

        if !self.alive.is_alive() {
            return Ok(MutationOutcome::Detached);
        }
        match self.load().await {
            Ok(true) => Ok(MutationOutcome::Applied),
            Ok(false) => Ok(MutationOutcome::Detached),
            Err(e) => {
                tracing::warn!(error = %e, "Bike list reload after add failed");
                if self.alive.is_alive() {
                    self.state.lock().await.error = Some(e.user_message(AppError::REFRESH_FAILED));
                }
                Ok(MutationOutcome::AppliedStale)
            }
        }
    }

    async fn record_error(&self, error: &AppError, fallback: &str) {
        if self.alive.is_alive() {
            self.state.lock().await.error = Some(error.user_message(fallback));
        }
    }
}
