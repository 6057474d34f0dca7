//! Regions command implementation for the Waymark CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymark_core::{LocalRegionStore, RegionStats, RegionStore};

use crate::{
    ARG_REGIONS_DIR, CliError,
    sources::{DEFAULT_REGIONS_DIR, write_json},
};

/// CLI arguments for the `regions` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "List the region databases installed in the regions \
                 directory with their place and point-of-interest counts.",
    about = "List installed regions"
)]
#[ortho_config(prefix = "WAYMARK")]
pub(crate) struct RegionsArgs {
    /// Directory containing `<region>.db` files.
    #[arg(long = ARG_REGIONS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) regions_dir: Option<Utf8PathBuf>,
}

impl RegionsArgs {
    pub(crate) fn into_config(self) -> Result<RegionsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(RegionsConfig::from(merged))
    }
}

/// Resolved `regions` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegionsConfig {
    pub(crate) regions_dir: Utf8PathBuf,
}

impl From<RegionsArgs> for RegionsConfig {
    fn from(args: RegionsArgs) -> Self {
        Self {
            regions_dir: args
                .regions_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_REGIONS_DIR)),
        }
    }
}

pub(crate) fn run_regions(args: RegionsArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_regions_with(args, &mut stdout)
}

pub(crate) fn run_regions_with(args: RegionsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let stats = collect_region_stats(&config)?;
    write_json(writer, &stats)
}

fn collect_region_stats(config: &RegionsConfig) -> Result<Vec<RegionStats>, CliError> {
    let mut store = LocalRegionStore::new(config.regions_dir.clone());
    let regions = store.available_regions().map_err(CliError::ListRegions)?;
    let stats = regions
        .into_iter()
        .map(|region| {
            store
                .region_stats(&region)
                .map_err(|source| CliError::RegionStats { region, source })
        })
        .collect::<Result<Vec<_>, _>>();
    store.close();
    stats
}
