// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod bike;
pub mod input;
pub mod payload;
pub mod service;
pub mod timeline;

pub use bike::{BikeDetails, BikePillRow, NewBike, OdometerReading, Unit, KM_PER_MILE};
pub use input::{AddBikeInput, ServiceDraft};
pub use payload::{parse_bike_details, BikeAggregate, ParsedBikeDetails, RawBikeDetails};
pub use service::{
    DistanceInterval, IntervalDescriptor, IntervalType, Service, ServiceRecord, ServiceStatus,
    TimeInterval,
};
pub use timeline::{TimelineEntry, TimelineEvent};
