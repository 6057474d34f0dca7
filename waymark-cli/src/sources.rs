//! Data-source options shared by the search commands.

use std::io::Write;

use camino::Utf8PathBuf;
use serde::Serialize;
use waymark_core::{
    CascadeConfig, LocalRegionStore, SearchCascade, SearchEngine, SearchTicket,
};
use waymark_data::ProviderEndpoints;

use crate::CliError;

/// Directory searched for region databases when none is configured.
pub(crate) const DEFAULT_REGIONS_DIR: &str = "regions";

/// Source options as they arrive from a command's merged arguments.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceOverrides {
    pub(crate) regions_dir: Option<Utf8PathBuf>,
    pub(crate) offline_only: bool,
    pub(crate) sufficiency_threshold: Option<usize>,
    pub(crate) photon_url: Option<String>,
    pub(crate) nominatim_url: Option<String>,
    pub(crate) overpass_url: Option<String>,
}

/// Resolved data sources for one search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceConfig {
    /// Directory holding `<region>.db` files.
    pub(crate) regions_dir: Utf8PathBuf,
    /// Cascade settings.
    pub(crate) cascade: CascadeConfig,
    /// Networked provider endpoints, unused when offline-only.
    pub(crate) endpoints: ProviderEndpoints,
}

impl From<SourceOverrides> for SourceConfig {
    fn from(overrides: SourceOverrides) -> Self {
        let mut cascade = CascadeConfig::default().with_offline_only(overrides.offline_only);
        if let Some(threshold) = overrides.sufficiency_threshold {
            cascade = cascade.with_sufficiency_threshold(threshold);
        }
        let defaults = ProviderEndpoints::default();
        Self {
            regions_dir: overrides
                .regions_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_REGIONS_DIR)),
            cascade,
            endpoints: ProviderEndpoints {
                photon: overrides.photon_url.unwrap_or(defaults.photon),
                nominatim: overrides.nominatim_url.unwrap_or(defaults.nominatim),
                overpass: overrides.overpass_url.unwrap_or(defaults.overpass),
                user_agent: defaults.user_agent,
            },
        }
    }
}

/// Builds the cascade a search command runs against.
pub(crate) trait CascadeBuilder {
    fn build(&self, sources: &SourceConfig) -> Result<SearchCascade, CliError>;
}

/// Local region databases plus, unless offline-only, the public providers.
pub(crate) struct DefaultCascadeBuilder;

impl CascadeBuilder for DefaultCascadeBuilder {
    fn build(&self, sources: &SourceConfig) -> Result<SearchCascade, CliError> {
        let cascade = SearchCascade::new(sources.cascade.clone())
            .with_region_store(LocalRegionStore::new(sources.regions_dir.clone()));
        if sources.cascade.offline_only {
            return Ok(cascade);
        }
        Ok(sources.endpoints.install(cascade)?)
    }
}

/// Run one request on a fresh engine and shut it down afterwards.
pub(crate) fn run_on_engine<T>(
    cascade: SearchCascade,
    submit: impl FnOnce(&SearchEngine) -> SearchTicket<T>,
) -> Result<T, CliError> {
    let engine = SearchEngine::start(cascade)?;
    let outcome = submit(&engine).wait();
    engine.shutdown()?;
    Ok(outcome?)
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json(writer: &mut dyn Write, value: &impl Serialize) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
