//! Behaviour-driven step definitions driving the search CLI scenarios.

use super::helpers::{StubCascadeBuilder, stdout_json};
use super::*;
use crate::search::run_search_with;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use waymark_core::{
    AddressRecord, Category, PointOfInterestRecord, SourceKind,
    test_support::{MemoryRegionStore, ScriptedProvider, address, poi},
};

#[derive(Debug, Default)]
struct SearchWorld {
    addresses: RefCell<Vec<AddressRecord>>,
    pois: RefCell<Vec<PointOfInterestRecord>>,
    geocoder: RefCell<Option<ScriptedProvider<Vec<AddressRecord>>>>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl SearchWorld {
    fn output(&self) -> Value {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        result.as_ref().expect("expected success");
        stdout_json(&self.stdout.borrow())
    }

    fn error_matches(&self, check: impl FnOnce(&CliError) -> bool) {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        assert!(check(error), "unexpected error {error:?}");
    }
}

#[fixture]
fn world() -> SearchWorld {
    SearchWorld::default()
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

#[given("an installed address {name}")]
fn installed_address(#[from(world)] world: &SearchWorld, name: String) {
    let id = i64::try_from(world.addresses.borrow().len()).expect("small id");
    world.addresses.borrow_mut().push(address(
        SourceKind::RegionStore,
        id,
        unquote(&name),
        34.7465,
        -92.2896,
    ));
}

#[given("an installed hospital {name} at {lat}, {lon}")]
fn installed_hospital(#[from(world)] world: &SearchWorld, name: String, lat: f64, lon: f64) {
    let id = i64::try_from(world.pois.borrow().len()).expect("small id");
    world.pois.borrow_mut().push(poi(
        SourceKind::RegionStore,
        id,
        unquote(&name),
        Category::Hospital,
        lat,
        lon,
    ));
}

#[given("a geocoder answering with the address {name}")]
fn geocoder_answering(#[from(world)] world: &SearchWorld, name: String) {
    let answer = vec![address(
        SourceKind::Provider("photon"),
        900,
        unquote(&name),
        34.7470,
        -92.2890,
    )];
    world
        .geocoder
        .replace(Some(ScriptedProvider::new("photon", Ok(answer))));
}

#[given("the search is offline only")]
fn offline_only(#[from(world)] world: &SearchWorld) {
    world
        .cli_args
        .borrow_mut()
        .push(format!("--{ARG_OFFLINE_ONLY}"));
}

#[given("a sufficiency threshold of {count}")]
fn sufficiency_threshold(#[from(world)] world: &SearchWorld, count: usize) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_SUFFICIENCY_THRESHOLD}"), count.to_string()]);
}

#[given("the caller is at {lat}, {lon}")]
fn caller_position(#[from(world)] world: &SearchWorld, lat: f64, lon: f64) {
    world.cli_args.borrow_mut().extend([
        format!("--{ARG_LAT}"),
        lat.to_string(),
        format!("--{ARG_LON}"),
        lon.to_string(),
    ]);
}

#[given("the caller latitude alone is {lat}")]
fn caller_latitude_only(#[from(world)] world: &SearchWorld, lat: f64) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_LAT}"), lat.to_string()]);
}

#[when("I search for {query}")]
fn run_search_command(#[from(world)] world: &SearchWorld, query: String) {
    let mut argv = vec![
        "waymark".to_owned(),
        "search".to_owned(),
        unquote(&query).to_owned(),
    ];
    argv.extend(world.cli_args.borrow().iter().cloned());

    let addresses = world.addresses.take();
    let pois = world.pois.take();
    let geocoder = world.geocoder.take();
    let builder = StubCascadeBuilder::new(move |cascade| {
        let store = MemoryRegionStore::new().with_region("arkansas", addresses, pois);
        let cascade = cascade.with_region_store(store);
        match geocoder {
            Some(provider) => cascade.with_address_provider(provider),
            None => cascade,
        }
    });

    let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Search(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_search_with(args, &builder, &mut *buffer)
        }
        other => panic!("expected search command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command prints {count} address")]
fn prints_addresses(#[from(world)] world: &SearchWorld, count: usize) {
    let output = world.output();
    assert_eq!(output["kind"], "addresses");
    let results = output["results"].as_array().expect("results array");
    assert_eq!(results.len(), count);
}

#[then("every address comes from the region store")]
fn addresses_from_region_store(#[from(world)] world: &SearchWorld) {
    let output = world.output();
    let results = output["results"].as_array().expect("results array");
    assert!(results.iter().all(|record| record["source"] == "region-store"));
}

#[then("every address comes from the geocoder {name}")]
fn addresses_from_geocoder(#[from(world)] world: &SearchWorld, name: String) {
    let output = world.output();
    let results = output["results"].as_array().expect("results array");
    assert!(
        results
            .iter()
            .all(|record| record["source"]["provider"] == unquote(&name))
    );
}

#[then("the command prints the point of interest {name}")]
fn prints_point_of_interest(#[from(world)] world: &SearchWorld, name: String) {
    let output = world.output();
    assert_eq!(output["kind"], "points-of-interest");
    let names: Vec<&str> = output["results"]
        .as_array()
        .expect("results array")
        .iter()
        .filter_map(|record| record["name"].as_str())
        .collect();
    assert_eq!(names, vec![unquote(&name)]);
}

#[then("the command fails because the coordinate is incomplete")]
fn fails_partial_coordinate(#[from(world)] world: &SearchWorld) {
    world.error_matches(|error| matches!(error, CliError::PartialCoordinate));
}

macro_rules! register_search_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/search_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: SearchWorld) {
            let _ = world;
        }
    };
}

register_search_scenario!(search_offline_regions, "Installed regions answer offline");
register_search_scenario!(
    search_falls_back_to_geocoder,
    "Thin local results fall back to the geocoder"
);
register_search_scenario!(
    search_category_around_caller,
    "Category queries search around the caller"
);
register_search_scenario!(search_half_coordinate, "Half a coordinate is rejected");
