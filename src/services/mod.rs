// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod coordinator;
pub mod display;
pub mod garage;
pub mod mutation;
pub mod status;
pub mod timeline;
pub mod view;

pub use coordinator::{BikeDetailsController, FocusAction, ScreenPhase};
pub use garage::GarageController;
pub use mutation::{BusySet, MutationOutcome, RefreshPolicy};
pub use status::{evaluate_status, Evaluation, Remaining};
pub use timeline::{group_by_year, TimelineYear, TimelineYearGroup};
pub use view::{build_details_view, BikeDetailsView, ServiceView};
