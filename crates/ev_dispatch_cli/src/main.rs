use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ev_dispatch::config::ServiceConfig;
use ev_dispatch::context::TimeOfDay;
use ev_dispatch::fleet::{synthetic_fleet, FleetBounds, VehicleType};
use ev_dispatch::geo::Coordinate;
use ev_dispatch::rides::{RideRequest, DEFAULT_CITY, DEFAULT_USER_TYPE};
use ev_dispatch::service::RideService;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{error, info};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ev-dispatch",
    about = "Fare estimation and driver matching for an EV ride-hailing fleet"
)]
struct Cli {
    /// Service configuration (JSON). Built-in defaults when omitted.
    #[arg(long, global = true, env = "EV_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book one ride and print the ride record
    Quote {
        /// Pickup as `lat,lng`
        #[arg(long, value_parser = parse_coordinate)]
        pickup: Coordinate,
        /// Dropoff as `lat,lng`
        #[arg(long, value_parser = parse_coordinate)]
        dropoff: Coordinate,
        #[arg(long, default_value = "cli-rider")]
        rider: String,
        #[arg(long, default_value = DEFAULT_CITY)]
        city: String,
        /// Preferred vehicle type; `any` for no preference
        #[arg(long, default_value = "sedan")]
        vehicle_type: String,
        #[arg(long, default_value = DEFAULT_USER_TYPE)]
        user_type: String,
        /// Override the time-of-day label fed to the fare model
        #[arg(long)]
        time_of_day: Option<TimeOfDay>,
    },
    /// Run a synthetic booking load against a generated fleet
    Simulate {
        #[arg(long, default_value_t = 200)]
        vehicles: usize,
        #[arg(long, default_value_t = 1_000)]
        requests: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Probability (0.0–1.0) that a booked ride is completed right away
        #[arg(long, default_value_t = 0.7)]
        complete_probability: f64,
    },
    /// Print model status and fleet counts
    Status,
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got `{raw}`"))?;
    let latitude: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let longitude: f64 = lng.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("coordinate out of range: {raw}"));
    }
    Ok(Coordinate::new(latitude, longitude))
}

// ── Entry point ────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        error!("{message}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path).map_err(|e| e.to_string())?,
        None => ServiceConfig::default(),
    };

    match cli.command {
        Commands::Quote {
            pickup,
            dropoff,
            rider,
            city,
            vehicle_type,
            user_type,
            time_of_day,
        } => {
            let service = RideService::from_config(config).map_err(|e| e.to_string())?;
            let mut request = RideRequest::new(rider, pickup, dropoff)
                .with_city(city)
                .with_user_type(user_type);
            request = if vehicle_type == "any" {
                request.without_vehicle_preference()
            } else {
                request.with_vehicle_type(VehicleType::from(vehicle_type))
            };
            if let Some(label) = time_of_day {
                request = request.with_time_of_day(label);
            }
            let ride = service.request_ride(request).map_err(|e| e.to_string())?;
            print_json(&ride)
        }
        Commands::Simulate {
            vehicles,
            requests,
            seed,
            complete_probability,
        } => {
            let report = simulate(config, vehicles, requests, seed, complete_probability);
            print_json(&report)
        }
        Commands::Status => {
            let service = RideService::from_config(config).map_err(|e| e.to_string())?;
            print_json(&service.model_status())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

// ── Synthetic load ─────────────────────────────────────────────────

#[derive(Serialize)]
struct SimulationReport {
    stats: ev_dispatch::rides::RideStats,
    telemetry: ev_dispatch::telemetry::TelemetrySnapshot,
    fallback_rate: f64,
}

fn simulate(
    config: ServiceConfig,
    vehicles: usize,
    requests: usize,
    seed: u64,
    complete_probability: f64,
) -> SimulationReport {
    let bounds = FleetBounds::default();
    let service = Arc::new(RideService::from_config_with_fleet(
        synthetic_fleet(vehicles, seed, bounds),
        config,
    ));
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut open = Vec::new();

    info!(vehicles, requests, seed, "starting synthetic load");
    for i in 0..requests {
        let request = RideRequest::new(format!("SIM{i:05}"), bounds.sample(&mut rng), bounds.sample(&mut rng));
        if let Ok(ride) = service.request_ride(request) {
            open.push(ride.id);
        }
        // Riders finish in random order.
        if !open.is_empty() && rng.gen_bool(complete_probability.clamp(0.0, 1.0)) {
            let ride = open.swap_remove(rng.gen_range(0..open.len()));
            if let Err(err) = service.complete_ride(&ride) {
                error!(ride = %ride, error = %err, "completion failed");
            }
        }
    }

    let telemetry = service.telemetry();
    SimulationReport {
        stats: service.get_stats(),
        telemetry,
        fallback_rate: telemetry.fallback_rate(),
    }
}
