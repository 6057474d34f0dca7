//! Focused unit tests covering CLI configuration resolution.

use super::helpers::{StubCascadeBuilder, stdout_json};
use super::*;
use crate::{
    nearby::{DEFAULT_RADIUS_KM, NearbyConfig},
    regions::RegionsConfig,
    search::{SearchConfig, run_search_with},
    sources::{DEFAULT_REGIONS_DIR, write_json},
};
use camino::Utf8PathBuf;
use geo::Coord;
use rstest::rstest;
use waymark_core::{CascadeConfig, Category};
use waymark_data::ProviderEndpoints;

fn nearby_args() -> NearbyArgs {
    NearbyArgs {
        lat: Some(34.7465),
        lon: Some(-92.2896),
        categories: vec!["hospital".to_owned()],
        ..NearbyArgs::default()
    }
}

#[rstest]
fn converting_search_without_query_errors() {
    let err = SearchConfig::try_from(SearchArgs::default()).expect_err("missing query");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SEARCH_QUERY);
            assert_eq!(env, ENV_SEARCH_QUERY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case(Some(34.7), None)]
#[case(None, Some(-92.3))]
fn search_rejects_half_a_coordinate(#[case] lat: Option<f64>, #[case] lon: Option<f64>) {
    let args = SearchArgs {
        query: Some("gas".to_owned()),
        lat,
        lon,
        ..SearchArgs::default()
    };
    let err = SearchConfig::try_from(args).expect_err("partial coordinate");
    assert!(matches!(err, CliError::PartialCoordinate), "found {err:?}");
}

#[rstest]
fn search_config_uses_default_sources() {
    let args = SearchArgs {
        query: Some("little rock".to_owned()),
        lat: Some(34.7465),
        lon: Some(-92.2896),
        ..SearchArgs::default()
    };
    let config = SearchConfig::try_from(args).expect("config should build");
    assert_eq!(config.query, "little rock");
    assert_eq!(
        config.center,
        Some(Coord {
            x: -92.2896,
            y: 34.7465
        })
    );
    assert_eq!(
        config.sources.regions_dir,
        Utf8PathBuf::from(DEFAULT_REGIONS_DIR)
    );
    assert_eq!(config.sources.cascade, CascadeConfig::default());
    assert_eq!(config.sources.endpoints, ProviderEndpoints::default());
}

#[rstest]
fn search_config_applies_source_overrides() {
    let args = SearchArgs {
        query: Some("little rock".to_owned()),
        regions_dir: Some(Utf8PathBuf::from("/srv/regions")),
        offline_only: true,
        sufficiency_threshold: Some(3),
        photon_url: Some("http://localhost:2322".to_owned()),
        overpass_url: Some("http://localhost:12345/api".to_owned()),
        ..SearchArgs::default()
    };
    let config = SearchConfig::try_from(args).expect("config should build");
    assert_eq!(config.sources.regions_dir, Utf8PathBuf::from("/srv/regions"));
    assert!(config.sources.cascade.offline_only);
    assert_eq!(config.sources.cascade.sufficiency_threshold, 3);
    assert_eq!(config.sources.endpoints.photon, "http://localhost:2322");
    assert_eq!(
        config.sources.endpoints.nominatim,
        ProviderEndpoints::default().nominatim
    );
    assert_eq!(config.sources.endpoints.overpass, "http://localhost:12345/api");
}

#[rstest]
#[case::missing_lat(None, Some(-92.3), ARG_LAT, ENV_NEARBY_LAT)]
#[case::missing_lon(Some(34.7), None, ARG_LON, ENV_NEARBY_LON)]
fn converting_nearby_without_coordinates_errors(
    #[case] lat: Option<f64>,
    #[case] lon: Option<f64>,
    #[case] expected_field: &'static str,
    #[case] expected_env: &'static str,
) {
    let args = NearbyArgs {
        lat,
        lon,
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("missing coordinate");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, expected_field);
            assert_eq!(env, expected_env);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_nearby_without_categories_errors() {
    let args = NearbyArgs {
        categories: Vec::new(),
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("missing categories");
    match err {
        CliError::MissingArgument { field, .. } => assert_eq!(field, ARG_CATEGORY),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn nearby_rejects_unknown_categories() {
    let args = NearbyArgs {
        categories: vec!["hospital".to_owned(), "volcano".to_owned()],
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("unknown category");
    match err {
        CliError::UnknownCategory(source) => assert_eq!(source.0, "volcano"),
        other => panic!("expected UnknownCategory, found {other:?}"),
    }
}

#[rstest]
fn nearby_config_builds_the_query() {
    let args = NearbyArgs {
        categories: vec![
            "Gas Station".to_owned(),
            "hospital".to_owned(),
            "gas_station".to_owned(),
        ],
        ..nearby_args()
    };
    let config = NearbyConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.query.categories,
        vec![Category::GasStation, Category::Hospital]
    );
    assert_eq!(config.query.radius_km, DEFAULT_RADIUS_KM);
    assert_eq!(
        config.query.center,
        Coord {
            x: -92.2896,
            y: 34.7465
        }
    );
}

#[rstest]
fn nearby_arguments_accept_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "waymark",
        "nearby",
        "--lat",
        "-33.9249",
        "--lon",
        "18.4241",
        "--radius-km",
        "2.5",
        "--category",
        "pharmacy",
        "--category",
        "atm",
    ])
    .expect("arguments should parse");
    let Command::Nearby(args) = cli.command else {
        panic!("expected nearby command");
    };
    assert_eq!(args.lat, Some(-33.9249));
    assert_eq!(args.radius_km, Some(2.5));
    assert_eq!(args.categories, vec!["pharmacy", "atm"]);
}

#[rstest]
fn regions_config_defaults_the_directory() {
    let config = RegionsConfig::from(RegionsArgs::default());
    assert_eq!(config.regions_dir, Utf8PathBuf::from(DEFAULT_REGIONS_DIR));
}

#[rstest]
fn written_json_ends_with_a_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &vec!["arkansas", "virginia"]).expect("write");
    assert_eq!(stdout_json(&buffer), serde_json::json!(["arkansas", "virginia"]));
}

#[rstest]
fn search_hands_resolved_sources_to_the_builder() {
    let args = SearchArgs {
        query: Some("little rock".to_owned()),
        offline_only: true,
        sufficiency_threshold: Some(4),
        ..SearchArgs::default()
    };
    let builder = StubCascadeBuilder::new(|cascade| cascade);
    let mut buffer = Vec::new();
    run_search_with(args, &builder, &mut buffer).expect("search should succeed");

    let seen = builder.seen();
    assert!(seen.cascade.offline_only);
    assert_eq!(seen.cascade.sufficiency_threshold, 4);
    let output = stdout_json(&buffer);
    assert_eq!(output["kind"], "addresses");
    assert_eq!(output["results"], serde_json::json!([]));
}

#[rstest]
fn installing_logging_twice_reports_the_conflict() {
    init_logging().ok();
    assert!(init_logging().is_err());
}
