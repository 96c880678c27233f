use std::env;

use anyhow::{Context, Result};
use tokio::time::Duration;

use crate::location::filter::{
    SpeedFilterMode, DEFAULT_MAX_SPEED_KMH, DEFAULT_MIN_DISPLACEMENT_METERS,
};
use crate::location::report::DEFAULT_REPORT_COOLDOWN;
use crate::search::scheduler::{
    DEFAULT_ME_PAGE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL, DEFAULT_REFRESH_COOLDOWN,
};
use crate::search::viewport::DEFAULT_RADIUS_FLOOR_METERS;

/// Central configuration loaded from environment variables.
///
/// Every knob has a sensible default; the .env file is loaded at
/// startup via dotenvy, so nothing here is required to run.
pub struct Config {
    /// Minimum time between outbound location reports.
    pub report_cooldown: Duration,
    /// Minimum time between nearby-content searches.
    pub refresh_cooldown: Duration,
    /// Re-check interval while waiting for the minimum load window.
    pub refresh_poll_interval: Duration,
    /// Displacements below this are GPS jitter.
    pub min_displacement_meters: f64,
    /// Implied speeds above this are vehicle travel.
    pub max_speed_kmh: f64,
    /// How implied speed is computed (corrected units, or the original
    /// client's permissive legacy math).
    pub speed_filter_mode: SpeedFilterMode,
    /// Floor for viewport-derived search radii.
    pub search_radius_floor_meters: f64,
    /// Page size for the connections content layer.
    pub page_size: u32,
    /// Page size for the caller's own content layer.
    pub me_page_size: u32,
}

impl Config {
    /// Load configuration from `WAYMARK_*` environment variables.
    pub fn load() -> Result<Self> {
        let speed_filter_mode = match env::var("WAYMARK_SPEED_FILTER").as_deref() {
            Ok("legacy") => SpeedFilterMode::Legacy,
            // "corrected" or unset both default to the fixed units
            _ => SpeedFilterMode::Corrected,
        };

        Ok(Self {
            report_cooldown: duration_ms_var("WAYMARK_REPORT_COOLDOWN_MS", DEFAULT_REPORT_COOLDOWN)?,
            refresh_cooldown: duration_ms_var(
                "WAYMARK_REFRESH_COOLDOWN_MS",
                DEFAULT_REFRESH_COOLDOWN,
            )?,
            refresh_poll_interval: duration_ms_var(
                "WAYMARK_REFRESH_POLL_MS",
                DEFAULT_POLL_INTERVAL,
            )?,
            min_displacement_meters: f64_var(
                "WAYMARK_MIN_DISPLACEMENT_METERS",
                DEFAULT_MIN_DISPLACEMENT_METERS,
            )?,
            max_speed_kmh: f64_var("WAYMARK_MAX_SPEED_KMH", DEFAULT_MAX_SPEED_KMH)?,
            speed_filter_mode,
            search_radius_floor_meters: f64_var(
                "WAYMARK_SEARCH_FLOOR_METERS",
                DEFAULT_RADIUS_FLOOR_METERS,
            )?,
            page_size: u32_var("WAYMARK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            me_page_size: u32_var("WAYMARK_ME_PAGE_SIZE", DEFAULT_ME_PAGE_SIZE)?,
        })
    }
}

fn duration_ms_var(name: &str, default: Duration) -> Result<Duration> {
    match env::var(name) {
        Ok(value) => {
            let ms: u64 = value
                .parse()
                .with_context(|| format!("{name} must be an integer millisecond count"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(default),
    }
}

fn f64_var(name: &str, default: f64) -> Result<f64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}

fn u32_var(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a positive integer")),
        Err(_) => Ok(default),
    }
}
