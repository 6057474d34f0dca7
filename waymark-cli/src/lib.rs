//! Command-line interface for searching Waymark's offline regions and the
//! public geocoders behind them.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod error;
mod nearby;
mod regions;
mod search;
mod sources;

pub use error::CliError;

use nearby::{NearbyArgs, run_nearby};
use regions::{RegionsArgs, run_regions};
use search::{SearchArgs, run_search};

pub(crate) const ARG_REGIONS_DIR: &str = "regions-dir";
pub(crate) const ARG_OFFLINE_ONLY: &str = "offline-only";
pub(crate) const ARG_SUFFICIENCY_THRESHOLD: &str = "sufficiency-threshold";
pub(crate) const ARG_PHOTON_URL: &str = "photon-url";
pub(crate) const ARG_NOMINATIM_URL: &str = "nominatim-url";
pub(crate) const ARG_OVERPASS_URL: &str = "overpass-url";
pub(crate) const ARG_SEARCH_QUERY: &str = "query";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_RADIUS_KM: &str = "radius-km";
pub(crate) const ARG_CATEGORY: &str = "category";
pub(crate) const ENV_SEARCH_QUERY: &str = "WAYMARK_CMDS_SEARCH_QUERY";
pub(crate) const ENV_NEARBY_LAT: &str = "WAYMARK_CMDS_NEARBY_LAT";
pub(crate) const ENV_NEARBY_LON: &str = "WAYMARK_CMDS_NEARBY_LON";
pub(crate) const ENV_NEARBY_CATEGORY: &str = "WAYMARK_CMDS_NEARBY_CATEGORY";

/// Run the Waymark CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments or configuration are invalid, the
/// search fails, or output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Search(args) => run_search(args),
        Command::Nearby(args) => run_nearby(args),
        Command::Regions(args) => run_regions(args),
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` (default `warn`).
///
/// # Errors
///
/// Returns the installer's error when a global logger or subscriber is
/// already set.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

#[derive(Debug, Parser)]
#[command(
    name = "waymark",
    about = "Offline-first address and point-of-interest search",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search addresses, or interpret queries such as "gas arkansas".
    Search(SearchArgs),
    /// List points of interest around a coordinate.
    Nearby(NearbyArgs),
    /// Describe the installed region databases.
    Regions(RegionsArgs),
}

#[cfg(test)]
mod tests;
