//! Nearby command implementation for the Waymark CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymark_core::{Category, NearbyQuery};

use crate::{
    ARG_CATEGORY, ARG_LAT, ARG_LON, ARG_NOMINATIM_URL, ARG_OFFLINE_ONLY, ARG_OVERPASS_URL,
    ARG_PHOTON_URL, ARG_RADIUS_KM, ARG_REGIONS_DIR, ARG_SUFFICIENCY_THRESHOLD, CliError,
    ENV_NEARBY_CATEGORY, ENV_NEARBY_LAT, ENV_NEARBY_LON,
    sources::{
        CascadeBuilder, DefaultCascadeBuilder, SourceConfig, SourceOverrides, run_on_engine,
        write_json,
    },
};

/// Radius used when `--radius-km` is not given.
pub(crate) const DEFAULT_RADIUS_KM: f64 = 10.0;

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "List points of interest of the given categories within a \
                 radius of a coordinate, nearest first. Categories are named \
                 by id (gas_station) or display name (\"Gas Station\").",
    about = "Find points of interest around a coordinate"
)]
#[ortho_config(prefix = "WAYMARK")]
pub(crate) struct NearbyArgs {
    /// Latitude of the search centre.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Search radius in kilometres (default 10).
    #[arg(long = ARG_RADIUS_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) radius_km: Option<f64>,
    /// Category to include; repeat for several.
    #[arg(long = ARG_CATEGORY, value_name = "category")]
    #[serde(default)]
    pub(crate) categories: Vec<String>,
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

impl NearbyArgs {
    pub(crate) fn into_config(self) -> Result<NearbyConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NearbyConfig::try_from(merged)
    }
}

/// Resolved `nearby` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbyConfig {
    pub(crate) query: NearbyQuery,
    pub(crate) sources: SourceConfig,
}

impl TryFrom<NearbyArgs> for NearbyConfig {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_NEARBY_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_NEARBY_LON,
        })?;
        if args.categories.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_CATEGORY,
                env: ENV_NEARBY_CATEGORY,
            });
        }
        let categories = args
            .categories
            .iter()
            .map(|name| name.parse::<Category>())
            .collect::<Result<Vec<_>, _>>()?;
        let query = NearbyQuery::new(
            Coord { x: lon, y: lat },
            args.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
            categories,
        );
        let sources = SourceConfig::from(SourceOverrides {
            regions_dir: args.regions_dir,
            offline_only: args.offline_only,
            sufficiency_threshold: args.sufficiency_threshold,
            photon_url: args.photon_url,
            nominatim_url: args.nominatim_url,
            overpass_url: args.overpass_url,
        });
        Ok(Self { query, sources })
    }
}

pub(crate) fn run_nearby(args: NearbyArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_nearby_with(args, &DefaultCascadeBuilder, &mut stdout)
}

pub(crate) fn run_nearby_with(
    args: NearbyArgs,
    builder: &dyn CascadeBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let cascade = builder.build(&config.sources)?;
    let results = run_on_engine(cascade, |engine| engine.search_nearby(config.query))?;
    write_json(writer, &results)
}
