// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bike-details screen controller with optimistic mutations.
//!
//! Each mutation follows the same protocol:
//! 1. Validate input locally (no busy marker, no network on failure)
//! 2. Take the entity's busy marker; a second trigger while held is skipped
//! 3. Record the touched fields' prior values and apply the optimistic change
//! 4. Issue the remote write
//! 5. Success: refetch the aggregate so server-derived fields are authoritative
//! 6. Failure: put the touched fields back and surface the error
//!
//! Only the fields a mutation touched are reverted, so data another
//! mutation reconciled in the meantime survives.
//!
//! Nothing is committed once the screen has been unmounted.

use crate::db::MaintenanceStore;
use crate::error::AppError;
use crate::models::input::parse_odometer;
use crate::models::{parse_bike_details, BikeAggregate, OdometerReading, ServiceDraft, Unit};
use crate::services::mutation::{
    AliveFlag, BusySet, MutationOutcome, RefreshPolicy, RefreshTokenTracker,
};
use crate::services::view::{build_details_view, BikeDetailsView};
use crate::time_utils::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What the screen should render.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenPhase {
    /// First load in flight
    Loading,
    /// No data could be loaded; offer a retry
    Failed { message: String },
    /// Data available, possibly alongside an error from a later action
    Ready {
        view: BikeDetailsView,
        error: Option<String>,
    },
}

/// What a focus event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
    InitialLoad,
    Refetched,
    Skipped,
}

/// Prior values of the fields an optimistic change overwrote.
#[derive(Debug, Clone, PartialEq)]
enum Revert {
    Pinned {
        service_id: String,
        pinned: bool,
    },
    Odometer {
        odometer_km: f64,
        odometer_value: f64,
        /// Value written optimistically; a newer server reading is kept
        applied_km: f64,
    },
}

impl Revert {
    fn apply(&self, aggregate: &mut BikeAggregate) {
        match self {
            Revert::Pinned { service_id, pinned } => {
                if let Some(service) = aggregate.service_mut(service_id) {
                    service.pinned = *pinned;
                }
            }
            Revert::Odometer {
                odometer_km,
                odometer_value,
                applied_km,
            } => {
                if aggregate.bike.odometer_km == *applied_km {
                    aggregate.bike.odometer_km = *odometer_km;
                    aggregate.bike.odometer_value = *odometer_value;
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct ScreenState {
    aggregate: Option<BikeAggregate>,
    error: Option<String>,
    loading: bool,
    last_fetch_at: Option<DateTime<Utc>>,
    refresh_tokens: RefreshTokenTracker,
}

impl ScreenState {
    fn roll_back(&mut self, revert: Option<&Revert>) {
        if let (Some(revert), Some(aggregate)) = (revert, self.aggregate.as_mut()) {
            revert.apply(aggregate);
        }
    }
}

/// Controller for one bike's details screen.
pub struct BikeDetailsController {
    store: Arc<dyn MaintenanceStore>,
    clock: Arc<dyn Clock>,
    bike_id: String,
    policy: RefreshPolicy,
    state: Mutex<ScreenState>,
    busy: BusySet,
    alive: AliveFlag,
}

impl BikeDetailsController {
    pub fn new(
        store: Arc<dyn MaintenanceStore>,
        clock: Arc<dyn Clock>,
        bike_id: impl Into<String>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            bike_id: bike_id.into(),
            policy,
            state: Mutex::new(ScreenState::default()),
            busy: BusySet::new(),
            alive: AliveFlag::default(),
        }
    }

    pub fn bike_id(&self) -> &str {
        &self.bike_id
    }

    /// Whether a mutation is in flight for `entity_id` (disables its controls).
    pub fn is_busy(&self, entity_id: &str) -> bool {
        self.busy.contains(entity_id)
    }

    pub fn busy(&self) -> &BusySet {
        &self.busy
    }

    /// Screen is going away; later results are discarded.
    pub fn unmount(&self) {
        tracing::debug!(bike_id = %self.bike_id, "Bike screen unmounted");
        self.alive.kill();
    }

    pub fn is_alive(&self) -> bool {
        self.alive.is_alive()
    }

    /// Copy of the locally held aggregate.
    pub async fn aggregate(&self) -> Option<BikeAggregate> {
        self.state.lock().await.aggregate.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    pub async fn last_fetch_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_fetch_at
    }

    /// Derived view of the current aggregate, evaluated against today.
    pub async fn view(&self) -> Option<BikeDetailsView> {
        let today = self.clock.today();
        self.state
            .lock()
            .await
            .aggregate
            .as_ref()
            .map(|agg| build_details_view(agg, today))
    }

    pub async fn phase(&self) -> ScreenPhase {
        let today = self.clock.today();
        let state = self.state.lock().await;
        match (&state.aggregate, &state.error) {
            (Some(agg), error) => ScreenPhase::Ready {
                view: build_details_view(agg, today),
                error: error.clone(),
            },
            (None, Some(message)) if !state.loading => ScreenPhase::Failed {
                message: message.clone(),
            },
            (None, _) => ScreenPhase::Loading,
        }
    }

    // ─── Loading ─────────────────────────────────────────────────

    /// Fetch and parse the aggregate, committing it if still mounted.
    ///
    /// Returns `Ok(false)` when the result was discarded after unmount.
    pub async fn load(&self) -> Result<bool, AppError> {
        let raw = self.store.fetch_bike_details(&self.bike_id).await?;
        let parsed = parse_bike_details(raw)?;

        if !self.alive.is_alive() {
            tracing::debug!(bike_id = %self.bike_id, "Discarding load after unmount");
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        state.aggregate = Some(parsed.aggregate);
        state.last_fetch_at = Some(self.clock.now());
        state.error = None;
        tracing::debug!(
            bike_id = %self.bike_id,
            flagged_rows = parsed.issues.len(),
            "Bike details loaded"
        );
        Ok(true)
    }

    /// First load; failures become the screen-level error.
    pub async fn initial_load(&self) {
        self.state.lock().await.loading = true;
        let result = self.load().await;
        if !self.alive.is_alive() {
            return;
        }

        let mut state = self.state.lock().await;
        state.loading = false;
        if let Err(e) = result {
            tracing::warn!(bike_id = %self.bike_id, error = %e, "Initial bike load failed");
            state.error = Some(e.user_message(AppError::LOAD_BIKE_FAILED));
        }
    }

    /// Pull-to-refresh. Existing data is kept on failure.
    pub async fn refresh(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(bike_id = %self.bike_id, error = %e, "Bike refresh failed");
            self.record_error(&e, AppError::REFRESH_FAILED).await;
        }
    }

    /// Screen gained focus, possibly with a new navigation refresh token.
    pub async fn on_focus(&self, refresh_token: Option<&str>) -> FocusAction {
        let (has_data, token_changed, stale) = {
            let mut state = self.state.lock().await;
            let token_changed = state.refresh_tokens.observe(refresh_token);
            let stale = self.policy.is_stale(state.last_fetch_at, self.clock.now());
            (state.aggregate.is_some(), token_changed, stale)
        };

        if !has_data {
            self.initial_load().await;
            return FocusAction::InitialLoad;
        }

        if token_changed || stale {
            tracing::debug!(bike_id = %self.bike_id, token_changed, stale, "Refetching on focus");
            self.refresh().await;
            return FocusAction::Refetched;
        }

        FocusAction::Skipped
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Flip a service's pinned flag.
    pub async fn toggle_pinned(&self, service_id: &str) -> Result<MutationOutcome, AppError> {
        let Some(_guard) = self.busy.try_acquire(service_id) else {
            tracing::debug!(service_id, "Pin toggle skipped: already in flight");
            return Ok(MutationOutcome::Skipped);
        };

        let (revert, next_pinned) = {
            let mut state = self.state.lock().await;
            let service = state
                .aggregate
                .as_mut()
                .and_then(|agg| agg.service_mut(service_id))
                .ok_or_else(|| AppError::NotFound(format!("Service {}", service_id)))?;
            let revert = Revert::Pinned {
                service_id: service_id.to_string(),
                pinned: service.pinned,
            };
            service.pinned = !service.pinned;
            (revert, service.pinned)
        };

        tracing::info!(service_id, pinned = next_pinned, "Toggling service pin");
        let write = self.store.set_service_pinned(service_id, next_pinned).await;
        self.settle(Some(revert), write, AppError::PIN_FAILED).await
    }

    /// Record a completion. All effects are server-derived, so nothing is
    /// applied optimistically.
    pub async fn mark_completed(&self, service_id: &str) -> Result<MutationOutcome, AppError> {
        let Some(_guard) = self.busy.try_acquire(service_id) else {
            tracing::debug!(service_id, "Completion skipped: already in flight");
            return Ok(MutationOutcome::Skipped);
        };

        tracing::info!(service_id, "Marking service completed");
        let write = self.store.mark_service_completed(service_id).await;
        self.settle(None, write, AppError::COMPLETE_FAILED).await
    }

    /// Log a new odometer reading typed in `unit`.
    pub async fn log_odometer(
        &self,
        raw_value: &str,
        unit: Unit,
    ) -> Result<MutationOutcome, AppError> {
        let value = match parse_odometer(raw_value) {
            Ok(value) => value,
            Err(e) => {
                self.record_error(&e, AppError::ODOMETER_FAILED).await;
                return Err(e);
            }
        };
        let reading = OdometerReading::new(self.bike_id.clone(), value, unit);

        let Some(_guard) = self.busy.try_acquire(&self.bike_id) else {
            tracing::debug!(bike_id = %self.bike_id, "Odometer update skipped: already in flight");
            return Ok(MutationOutcome::Skipped);
        };

        let revert = {
            let mut state = self.state.lock().await;
            state.aggregate.as_mut().map(|agg| {
                let revert = Revert::Odometer {
                    odometer_km: agg.bike.odometer_km,
                    odometer_value: agg.bike.odometer_value,
                    applied_km: reading.odometer_km,
                };
                agg.bike.odometer_km = reading.odometer_km;
                agg.bike.odometer_value = agg.bike.unit.from_km(reading.odometer_km);
                revert
            })
        };

        tracing::info!(
            bike_id = %self.bike_id,
            value = reading.value,
            unit = %reading.unit,
            odometer_km = reading.odometer_km,
            "Logging odometer"
        );
        let write = self.store.log_odometer(&reading).await;
        self.settle(revert, write, AppError::ODOMETER_FAILED).await
    }

    /// Create or update a service from the form draft.
    pub async fn save_service(&self, draft: ServiceDraft) -> Result<MutationOutcome, AppError> {
        let unit = self
            .state
            .lock()
            .await
            .aggregate
            .as_ref()
            .map(|agg| agg.bike.unit)
            .ok_or_else(|| AppError::NotFound(format!("Bike {}", self.bike_id)))?;

        let record = match draft.into_record(&self.bike_id, unit) {
            Ok(record) => record,
            Err(e) => {
                self.record_error(&e, AppError::SERVICE_SAVE_FAILED).await;
                return Err(e);
            }
        };

        let busy_key = record
            .service_id
            .clone()
            .unwrap_or_else(|| format!("new-service:{}", self.bike_id));
        let Some(_guard) = self.busy.try_acquire(&busy_key) else {
            tracing::debug!(busy_key = %busy_key, "Service save skipped: already in flight");
            return Ok(MutationOutcome::Skipped);
        };

        let write = self.store.upsert_service(&record).await;
        self.settle(None, write, AppError::SERVICE_SAVE_FAILED).await
    }

    /// Reconcile after a successful write, or roll back after a failed one.
    ///
    /// `revert` undoes the optimistic change; `None` means nothing was
    /// applied locally.
    async fn settle(
        &self,
        revert: Option<Revert>,
        write: Result<(), AppError>,
        fallback: &str,
    ) -> Result<MutationOutcome, AppError> {
        match write {
            Ok(()) => {
                if !self.alive.is_alive() {
                    return Ok(MutationOutcome::Detached);
                }
                match self.load().await {
                    Ok(true) => Ok(MutationOutcome::Applied),
                    Ok(false) => Ok(MutationOutcome::Detached),
                    Err(e) => {
                        tracing::warn!(
                            bike_id = %self.bike_id,
                            error = %e,
                            "Write succeeded but reconcile fetch failed"
                        );
                        if !self.alive.is_alive() {
                            return Ok(MutationOutcome::Detached);
                        }
                        let mut state = self.state.lock().await;
                        state.roll_back(revert.as_ref());
                        state.error = Some(e.user_message(AppError::REFRESH_FAILED));
                        Ok(MutationOutcome::AppliedStale)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(bike_id = %self.bike_id, error = %e, "Write failed, rolling back");
                if self.alive.is_alive() {
                    let mut state = self.state.lock().await;
                    state.roll_back(revert.as_ref());
                    state.error = Some(e.user_message(fallback));
                }
                Err(e)
            }
        }
    }

    async fn record_error(&self, error: &AppError, fallback: &str) {
        if self.alive.is_alive() {
            self.state.lock().await.error = Some(error.user_message(fallback));
        }
    }
}
