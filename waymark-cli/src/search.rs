//! Search command implementation for the Waymark CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymark_core::QueryContext;

use crate::{
    ARG_LAT, ARG_LON, ARG_NOMINATIM_URL, ARG_OFFLINE_ONLY, ARG_OVERPASS_URL, ARG_PHOTON_URL,
    ARG_REGIONS_DIR, ARG_SEARCH_QUERY, ARG_SUFFICIENCY_THRESHOLD, CliError, ENV_SEARCH_QUERY,
    sources::{
        CascadeBuilder, DefaultCascadeBuilder, SourceConfig, SourceOverrides, run_on_engine,
        write_json,
    },
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Search installed regions for an address, falling back to \
                 the public geocoders when local results are thin. Queries \
                 naming a category (\"gas\", \"hospitals in virginia\") are \
                 answered with points of interest, around --lat/--lon when \
                 no region is named.",
    about = "Search addresses and places"
)]
#[ortho_config(prefix = "WAYMARK")]
pub(crate) struct SearchArgs {
    /// Free-text query.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Latitude of the caller, used for category queries.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the caller, used for category queries.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Directory containing `<region>.db` files.
    #[arg(long = ARG_REGIONS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) regions_dir: Option<Utf8PathBuf>,
    /// Never contact networked providers.
    #[arg(long = ARG_OFFLINE_ONLY)]
    #[serde(default)]
    pub(crate) offline_only: bool,
    /// Local result count at which providers are skipped.
    #[arg(long = ARG_SUFFICIENCY_THRESHOLD, value_name = "count")]
    #[serde(default)]
    pub(crate) sufficiency_threshold: Option<usize>,
    /// Base URL of the Photon geocoder.
    #[arg(long = ARG_PHOTON_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) photon_url: Option<String>,
    /// Base URL of the Nominatim geocoder.
    #[arg(long = ARG_NOMINATIM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// Base URL of the Overpass API.
    #[arg(long = ARG_OVERPASS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) query: String,
    pub(crate) center: Option<Coord<f64>>,
    pub(crate) sources: SourceConfig,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_SEARCH_QUERY,
            env: ENV_SEARCH_QUERY,
        })?;
        let center = match (args.lat, args.lon) {
            (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
            (None, None) => None,
            _ => return Err(CliError::PartialCoordinate),
        };
        let sources = SourceConfig::from(SourceOverrides {
            regions_dir: args.regions_dir,
            offline_only: args.offline_only,
            sufficiency_threshold: args.sufficiency_threshold,
            photon_url: args.photon_url,
            nominatim_url: args.nominatim_url,
            overpass_url: args.overpass_url,
        });
        Ok(Self {
            query,
            center,
            sources,
        })
    }
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_search_with(args, &DefaultCascadeBuilder, &mut stdout)
}

pub(crate) fn run_search_with(
    args: SearchArgs,
    builder: &dyn CascadeBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let cascade = builder.build(&config.sources)?;
    let context = QueryContext {
        center: config.center,
    };
    let outcome = run_on_engine(cascade, |engine| engine.search_query(config.query, context))?;
    write_json(writer, &outcome)
}
