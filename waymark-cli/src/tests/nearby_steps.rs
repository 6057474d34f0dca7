//! Behaviour-driven step definitions driving the nearby CLI scenarios.

use super::helpers::{StubCascadeBuilder, stdout_json};
use super::*;
use crate::nearby::run_nearby_with;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use waymark_core::{
    AssumeReachable, Category, PointOfInterestRecord, SearchError, SourceKind,
    test_support::{MemoryRegionStore, ScriptedProvider, poi},
};

#[derive(Debug, Default)]
struct NearbyWorld {
    pois: RefCell<Vec<PointOfInterestRecord>>,
    provider: RefCell<Option<ScriptedProvider<Vec<PointOfInterestRecord>>>>,
    unreachable: Cell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl NearbyWorld {
    fn listed(&self) -> Vec<Value> {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        result.as_ref().expect("expected success");
        stdout_json(&self.stdout.borrow())
            .as_array()
            .cloned()
            .expect("output should be a JSON array")
    }
}

#[fixture]
fn world() -> NearbyWorld {
    NearbyWorld::default()
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

#[given("a local {category} {name} at {lat}, {lon}")]
fn local_point(
    #[from(world)] world: &NearbyWorld,
    category: Category,
    name: String,
    lat: f64,
    lon: f64,
) {
    let id = i64::try_from(world.pois.borrow().len()).expect("small id");
    world.pois.borrow_mut().push(poi(
        SourceKind::RegionStore,
        id,
        unquote(&name),
        category,
        lat,
        lon,
    ));
}

#[given("a point-of-interest provider answering with the hospital {name} at {lat}, {lon}")]
fn provider_answering(#[from(world)] world: &NearbyWorld, name: String, lat: f64, lon: f64) {
    let answer = vec![poi(
        SourceKind::Provider("overpass"),
        700,
        unquote(&name),
        Category::Hospital,
        lat,
        lon,
    )];
    world
        .provider
        .replace(Some(ScriptedProvider::new("overpass", Ok(answer))));
}

#[given("a radius of {km} km")]
fn radius(#[from(world)] world: &NearbyWorld, km: f64) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_RADIUS_KM}"), km.to_string()]);
}

#[given("the network is unreachable")]
fn network_unreachable(#[from(world)] world: &NearbyWorld) {
    world.unreachable.set(true);
}

#[when("I look for {categories} around {lat}, {lon}")]
fn run_nearby_command(#[from(world)] world: &NearbyWorld, categories: String, lat: f64, lon: f64) {
    let mut argv = vec![
        "waymark".to_owned(),
        "nearby".to_owned(),
        format!("--{ARG_LAT}"),
        lat.to_string(),
        format!("--{ARG_LON}"),
        lon.to_string(),
    ];
    for category in unquote(&categories).split(',') {
        argv.extend([format!("--{ARG_CATEGORY}"), category.trim().to_owned()]);
    }
    argv.extend(world.cli_args.borrow().iter().cloned());

    let pois = world.pois.take();
    let provider = world.provider.take();
    let reachable = !world.unreachable.get();
    let builder = StubCascadeBuilder::new(move |cascade| {
        let store = MemoryRegionStore::new().with_region("arkansas", Vec::new(), pois);
        let cascade = cascade
            .with_region_store(store)
            .with_connectivity(AssumeReachable(reachable));
        match provider {
            Some(provider) => cascade.with_poi_provider(provider),
            None => cascade,
        }
    });

    let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Nearby(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_nearby_with(args, &builder, &mut *buffer)
        }
        other => panic!("expected nearby command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command lists {names}")]
fn lists_names(#[from(world)] world: &NearbyWorld, names: String) {
    let listed: Vec<String> = world
        .listed()
        .iter()
        .filter_map(|record| record["name"].as_str().map(str::to_owned))
        .collect();
    let expected: Vec<&str> = unquote(&names).split(", ").collect();
    assert_eq!(listed, expected);
}

#[then("every listed point of interest carries a distance")]
fn every_point_has_distance(#[from(world)] world: &NearbyWorld) {
    let listed = world.listed();
    assert!(!listed.is_empty());
    assert!(listed.iter().all(|record| record["distance_m"].is_number()));
}

#[then("the command fails because the category is unknown")]
fn fails_unknown_category(#[from(world)] world: &NearbyWorld) {
    let borrowed = world.result.borrow();
    match borrowed.as_ref().expect("result recorded") {
        Err(CliError::UnknownCategory(source)) => assert_eq!(source.0, "volcano"),
        other => panic!("expected UnknownCategory, found {other:?}"),
    }
}

#[then("the command fails because the network is unavailable")]
fn fails_network_unavailable(#[from(world)] world: &NearbyWorld) {
    let borrowed = world.result.borrow();
    match borrowed.as_ref().expect("result recorded") {
        Err(CliError::Search(SearchError::NetworkUnavailable)) => {}
        other => panic!("expected NetworkUnavailable, found {other:?}"),
    }
}

macro_rules! register_nearby_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/nearby_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: NearbyWorld) {
            let _ = world;
        }
    };
}

register_nearby_scenario!(
    nearby_lists_nearest_first,
    "Points of interest are listed nearest first"
);
register_nearby_scenario!(nearby_drops_distant_points, "Points beyond the radius are dropped");
register_nearby_scenario!(
    nearby_measures_provider_answers,
    "Provider answers are measured from the centre"
);
register_nearby_scenario!(nearby_unknown_category, "Unknown categories are rejected");
register_nearby_scenario!(
    nearby_unreachable_network,
    "An unreachable network is reported"
);
