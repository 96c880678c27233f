use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use waymark::config::Config;
use waymark::content::ActivationRecord;
use waymark::gate::{evaluate, DenialReason, GateDecision};
use waymark::geo::{self, GeoPoint};
use waymark::location::filter::{SampleDisposition, SampleFilter};
use waymark::location::provider::UserPositionSample;
use waymark::location::report::LocationReporter;
use waymark::location::telemetry::{LocationTelemetryService, LocationUpdate};
use waymark::search::viewport;

/// Waymark: proximity gating and location telemetry for geofenced content.
///
/// Evaluates activation decisions, estimates search radii, and replays
/// recorded position traces through the sample filter and report
/// throttle.
#[derive(Parser)]
#[command(name = "waymark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points
    Distance {
        /// Starting point as "lat,lon"
        from: String,
        /// Ending point as "lat,lon"
        to: String,
    },

    /// Evaluate the activation gate for a user position and a content item
    Gate {
        /// User position as "lat,lon"
        user: String,
        /// Path to a GeofencedContent JSON file
        content: PathBuf,
        /// Evaluate as the content owner
        #[arg(long)]
        owner: bool,
        /// Evaluate with a prior activation on record
        #[arg(long)]
        activated: bool,
    },

    /// Estimate a content-search radius from a map viewport
    Radius {
        /// Viewport center as "lat,lon"
        center: String,
        /// A point on the visible edge as "lat,lon"
        edge: String,
    },

    /// Replay a JSONL position trace through the sample filter
    Replay {
        /// Path to a file with one UserPositionSample JSON per line
        trace: PathBuf,
        /// Also run accepted samples through the report throttle
        #[arg(long)]
        report: bool,
    },
}

/// Telemetry sink that prints each dispatched report.
struct StdoutTelemetry;

#[async_trait::async_trait]
impl LocationTelemetryService for StdoutTelemetry {
    async fn post_location(&self, update: LocationUpdate) -> Result<()> {
        println!(
            "  {} ({:.6}, {:.6})",
            "reported".cyan(),
            update.coords.latitude,
            update.coords.longitude
        );
        Ok(())
    }
}

fn parse_point(value: &str) -> Result<GeoPoint> {
    let (lat, lon) = value
        .split_once(',')
        .with_context(|| format!("expected \"lat,lon\", got {value:?}"))?;
    Ok(GeoPoint::new(
        lat.trim().parse().context("latitude must be a number")?,
        lon.trim().parse().context("longitude must be a number")?,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("waymark=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Distance { from, to } => {
            let a = parse_point(&from)?;
            let b = parse_point(&to)?;
            let meters = geo::distance_meters(a, b);
            println!("{meters:.1} m");
        }

        Commands::Gate {
            user,
            content,
            owner,
            activated,
        } => {
            let position = parse_point(&user)?;
            let raw = std::fs::read_to_string(&content)
                .with_context(|| format!("reading {}", content.display()))?;
            let item: waymark::content::GeofencedContent =
                serde_json::from_str(&raw).context("parsing content JSON")?;

            let activation = activated.then(|| ActivationRecord {
                content_id: item.id.clone(),
                has_activated: true,
                view_count: 1,
            });

            match evaluate(position, &item, owner, activation.as_ref()) {
                GateDecision::Permit { first_activation } => {
                    println!("{}", "PERMIT".green().bold());
                    if first_activation {
                        println!("  first activation: record would be upgraded");
                    }
                }
                GateDecision::Deny { reason } => {
                    println!("{}", "DENY".red().bold());
                    match reason {
                        DenialReason::TooFar {
                            slack_meters,
                            max_proximity_meters,
                        } => println!(
                            "  {:.1} m outside the fence edge (allowance {:.1} m) — move closer",
                            slack_meters, max_proximity_meters
                        ),
                        DenialReason::InvalidGeometry => {
                            println!("  content has malformed geometry");
                        }
                    }
                }
            }
        }

        Commands::Radius { center, edge } => {
            let config = Config::load()?;
            let radius = viewport::search_radius(
                parse_point(&center)?,
                parse_point(&edge)?,
                config.search_radius_floor_meters,
            );
            println!("{radius:.1} m");
        }

        Commands::Replay { trace, report } => {
            let config = Config::load()?;
            let raw = std::fs::read_to_string(&trace)
                .with_context(|| format!("reading {}", trace.display()))?;

            let mut filter = SampleFilter::new(
                config.min_displacement_meters,
                config.max_speed_kmh,
                config.speed_filter_mode,
            );
            let mut reporter = report.then(|| {
                LocationReporter::new(Arc::new(StdoutTelemetry), config.report_cooldown)
            });

            let mut accepted = 0u32;
            let mut rejected = 0u32;
            for (index, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let sample: UserPositionSample = serde_json::from_str(line)
                    .with_context(|| format!("parsing sample on line {}", index + 1))?;

                let disposition = filter.offer(sample);
                match disposition {
                    SampleDisposition::AcceptedFirst => {
                        accepted += 1;
                        println!("{:>4}  {}", index + 1, "accepted (first fix)".green());
                    }
                    SampleDisposition::Accepted {
                        traveled_meters,
                        implied_kmh,
                    } => {
                        accepted += 1;
                        println!(
                            "{:>4}  {} {:.1} m at {:.1} km/h",
                            index + 1,
                            "accepted".green(),
                            traveled_meters,
                            implied_kmh
                        );
                    }
                    SampleDisposition::RejectedJitter { traveled_meters } => {
                        rejected += 1;
                        println!(
                            "{:>4}  {} {:.1} m displacement",
                            index + 1,
                            "jitter".yellow(),
                            traveled_meters
                        );
                    }
                    SampleDisposition::RejectedSpeed { implied_kmh } => {
                        rejected += 1;
                        println!(
                            "{:>4}  {} {:.1} km/h implied",
                            index + 1,
                            "too fast".red(),
                            implied_kmh
                        );
                    }
                }

                if disposition.is_accepted() {
                    if let Some(reporter) = reporter.as_mut() {
                        reporter.offer(sample.coords).await;
                    }
                }
            }

            println!(
                "\n{accepted} accepted, {rejected} rejected ({} total)",
                accepted + rejected
            );
        }
    }

    Ok(())
}
