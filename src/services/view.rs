// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Display-ready bike details derived from the typed aggregate.

use crate::models::{BikeAggregate, BikeDetails, Service, ServiceStatus};
use crate::services::status::{evaluate_status, Evaluation};
use crate::services::timeline::{group_by_year, TimelineYearGroup};
use chrono::NaiveDate;
use serde::Serialize;

/// A service together with its locally evaluated status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceView {
    pub service: Service,
    pub evaluation: Evaluation,
}

impl ServiceView {
    pub fn status(&self) -> ServiceStatus {
        self.evaluation.status
    }
}

/// Everything the bike screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BikeDetailsView {
    pub bike: BikeDetails,
    /// Services in the order the backend returned them
    pub services: Vec<ServiceView>,
    pub timeline: Vec<TimelineYearGroup>,
}

impl BikeDetailsView {
    pub fn count_with_status(&self, status: ServiceStatus) -> usize {
        self.services.iter().filter(|s| s.status() == status).count()
    }
}

/// Derive the screen view against the bike's odometer and `today`.
pub fn build_details_view(aggregate: &BikeAggregate, today: NaiveDate) -> BikeDetailsView {
    let services = aggregate
        .services
        .iter()
        .map(|service| {
            let evaluation = evaluate_status(service, aggregate.bike.odometer_km, today);
            if evaluation.status != service.status {
                tracing::debug!(
                    bike_id = %aggregate.bike.id,
                    service_id = %service.id,
                    server = service.status.as_str(),
                    local = evaluation.status.as_str(),
                    "Local status differs from server status"
                );
            }
            ServiceView {
                service: service.clone(),
                evaluation,
            }
        })
        .collect();

    BikeDetailsView {
        bike: aggregate.bike.clone(),
        services,
        timeline: group_by_year(&aggregate.timeline),
    }
}
