//! Error types emitted by the Waymark CLI.

use std::sync::Arc;

use thiserror::Error;
use waymark_core::{EngineError, ParseCategoryError, RegionId, RegionStoreError, SearchError};
use waymark_data::ProviderBuildError;

/// Errors emitted by the Waymark CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Only one half of a coordinate pair was given.
    #[error("--lat and --lon must be given together")]
    PartialCoordinate,
    /// A `--category` value names no known category.
    #[error("invalid --category: {0}")]
    UnknownCategory(#[from] ParseCategoryError),
    /// Constructing the networked providers failed.
    #[error("failed to build providers: {0}")]
    BuildProviders(#[from] ProviderBuildError),
    /// The search worker could not be started or stopped cleanly.
    #[error("search engine failed: {0}")]
    Engine(#[from] EngineError),
    /// The search itself failed.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    /// Listing installed regions failed.
    #[error("failed to list regions: {0}")]
    ListRegions(#[source] RegionStoreError),
    /// Reading an installed region failed.
    #[error("failed to read region {region}: {source}")]
    RegionStats {
        region: RegionId,
        #[source]
        source: RegionStoreError,
    },
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
