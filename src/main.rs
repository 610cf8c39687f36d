// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Moto-Maintenance command line
//!
//! Lists bikes, shows service status and ownership history, and records
//! maintenance against the hosted backend.

use clap::{Parser, Subcommand};
use moto_maintenance::{
    config::Config,
    error::AppError,
    models::{AddBikeInput, IntervalType, ServiceDraft, Unit},
    services::{display, BikeDetailsController, BikeDetailsView, MutationOutcome, ScreenPhase},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "moto-maintenance", about = "Motorcycle maintenance tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List bikes with due and coming-up counts
    Bikes,
    /// Show a bike's services and timeline
    Show { bike_id: String },
    /// Pin or unpin a service
    Pin { bike_id: String, service_id: String },
    /// Mark a service as completed
    Complete { bike_id: String, service_id: String },
    /// Log a new odometer reading in the bike's unit
    Odometer { bike_id: String, value: String },
    /// Add a bike
    AddBike {
        #[arg(long)]
        name: String,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "km")]
        unit: Unit,
        #[arg(long)]
        odometer: f64,
    },
    /// Add or edit a service
    Service {
        bike_id: String,
        /// Existing service to edit
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "distance")]
        interval_type: IntervalType,
        /// Distance in the bike's unit, or months
        #[arg(long)]
        interval: String,
        /// Distance in the bike's unit, or days
        #[arg(long)]
        reminder: String,
        #[arg(long, default_value = "")]
        cost: String,
        #[arg(long)]
        booked: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(url = %config.supabase_url, "Configuration loaded");

    let state = AppState::from_config(config);
    run(&state, cli.command).await?;
    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), AppError> {
    match command {
        Command::Bikes => {
            let garage = state.garage();
            garage.initial_load().await;
            if let Some(error) = garage.error().await {
                return Err(AppError::Backend(error));
            }
            if garage.show_empty_prompt().await {
                println!("Add your first bike to begin.");
            }
            for row in garage.rows().await {
                println!(
                    "{}  {}  {}  due now: {}  coming up: {}  {}",
                    row.bike_id,
                    row.display_name,
                    row.odometer_display,
                    row.due_now_count,
                    row.coming_up_count,
                    row.most_urgent_service_line.as_deref().unwrap_or(display::ABSENT)
                );
            }
        }
        Command::Show { bike_id } => {
            let bike = loaded_bike(state, &bike_id).await?;
            if let Some(view) = bike.view().await {
                print_view(&view);
            }
        }
        Command::Pin {
            bike_id,
            service_id,
        } => {
            let bike = loaded_bike(state, &bike_id).await?;
            report(&bike, bike.toggle_pinned(&service_id).await?).await;
        }
        Command::Complete {
            bike_id,
            service_id,
        } => {
            let bike = loaded_bike(state, &bike_id).await?;
            report(&bike, bike.mark_completed(&service_id).await?).await;
        }
        Command::Odometer { bike_id, value } => {
            let bike = loaded_bike(state, &bike_id).await?;
            let unit = bike
                .aggregate()
                .await
                .map(|agg| agg.bike.unit)
                .unwrap_or_default();
            report(&bike, bike.log_odometer(&value, unit).await?).await;
        }
        Command::AddBike {
            name,
            make,
            model,
            year,
            unit,
            odometer,
        } => {
            let garage = state.garage();
            let outcome = garage
                .add_bike(AddBikeInput {
                    display_name: name,
                    make,
                    model,
                    year,
                    unit,
                    current_odometer: odometer,
                })
                .await?;
            tracing::info!(?outcome, "Add bike finished");
            for row in garage.rows().await {
                println!("{}  {}", row.bike_id, row.display_name);
            }
        }
        Command::Service {
            bike_id,
            id,
            name,
            interval_type,
            interval,
            reminder,
            cost,
            booked,
        } => {
            let bike = loaded_bike(state, &bike_id).await?;
            let draft = ServiceDraft {
                service_id: id,
                name,
                interval_type,
                interval_value: interval,
                reminder_threshold: reminder,
                estimated_cost: cost,
                booked,
            };
            report(&bike, bike.save_service(draft).await?).await;
        }
    }
    Ok(())
}

/// Build a bike controller and load it, failing if nothing could be loaded.
async fn loaded_bike(state: &AppState, bike_id: &str) -> Result<BikeDetailsController, AppError> {
    let bike = state.bike(bike_id);
    bike.initial_load().await;
    match bike.phase().await {
        ScreenPhase::Failed { message } => Err(AppError::Backend(message)),
        _ => Ok(bike),
    }
}

async fn report(bike: &BikeDetailsController, outcome: MutationOutcome) {
    match outcome {
        MutationOutcome::Applied => {}
        MutationOutcome::AppliedStale => {
            eprintln!(
                "Saved, but the refresh failed: {}",
                bike.error().await.unwrap_or_default()
            );
        }
        MutationOutcome::Skipped => eprintln!("Already in progress."),
        MutationOutcome::Detached => return,
    }
    if let Some(view) = bike.view().await {
        print_view(&view);
    }
}

fn print_view(view: &BikeDetailsView) {
    println!("{}", view.bike.display_name);
    println!("{}", display::odometer_meta(&view.bike));
    println!("Last updated: {}", display::last_updated_label(&view.bike));
    println!();

    println!("Services");
    if view.services.is_empty() {
        println!("  No services yet. Add your first service to start tracking.");
    }
    for item in &view.services {
        let svc = &item.service;
        println!(
            "  {}{}  [{}]  {}",
            if svc.pinned { "* " } else { "" },
            svc.name,
            display::status_label(item.status()),
            display::remaining_text(item.evaluation.remaining),
        );
        println!(
            "      id: {}  interval: {}  reminder: {}  cost: {}  booked: {}",
            svc.id,
            display::interval_text(&svc.interval),
            display::reminder_text(&svc.interval),
            display::cost_text(svc.estimated_cost),
            if svc.booked { "Yes" } else { "No" },
        );
    }
    println!();

    println!("Ownership timeline");
    if view.timeline.is_empty() {
        println!("  History will appear as you log odometer and completions.");
    }
    for group in &view.timeline {
        println!("  {}", group.year);
        for entry in &group.entries {
            println!(
                "    {}  {}",
                display::timeline_title(entry),
                display::timeline_detail(entry, &view.bike)
            );
        }
    }
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("moto_maintenance=debug,info")
    });

    tracing_subscriber::registry().with(filter).with(format).init();
}
