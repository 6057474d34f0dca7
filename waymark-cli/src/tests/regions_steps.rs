//! Behaviour-driven step definitions driving the regions CLI scenarios.

use super::helpers::{stdout_json, utf8_tempdir};
use super::*;
use crate::regions::run_regions_with;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;
use waymark_core::{
    Category,
    test_support::{PlaceRow, PoiRow, RegionFixture, write_region_database},
};

#[derive(Debug)]
struct RegionsWorld {
    _tmp: TempDir,
    regions_dir: RefCell<Utf8PathBuf>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RegionsWorld {
    fn new() -> Self {
        let (tmp, regions_dir) = utf8_tempdir();
        Self {
            _tmp: tmp,
            regions_dir: RefCell::new(regions_dir),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

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
fn world() -> RegionsWorld {
    RegionsWorld::new()
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

#[given("a region {region} with {places} places and {pois} points of interest")]
fn installed_region(
    #[from(world)] world: &RegionsWorld,
    region: String,
    places: usize,
    pois: usize,
) {
    let ids = |count: usize| (0..count).map(|id| i64::try_from(id).expect("small id") + 1);
    let fixture = RegionFixture {
        places: ids(places)
            .map(|id| PlaceRow::new(id, "Main Street", 34.7465, -92.2896))
            .collect(),
        pois: ids(pois)
            .map(|id| PoiRow::new(id, "Baptist Health", Category::Hospital, 34.7501, -92.2902))
            .collect(),
    };
    let path = world
        .regions_dir
        .borrow()
        .join(format!("{}.db", unquote(&region)));
    write_region_database(&path, &fixture).expect("write region database");
}

#[given("the regions directory does not exist")]
fn regions_directory_missing(#[from(world)] world: &RegionsWorld) {
    let missing = world.regions_dir.borrow().join("missing");
    world.regions_dir.replace(missing);
}

#[when("I run the regions command")]
fn run_regions_command(#[from(world)] world: &RegionsWorld) {
    let argv = vec![
        "waymark".to_owned(),
        "regions".to_owned(),
        format!("--{ARG_REGIONS_DIR}"),
        world.regions_dir.borrow().as_str().to_owned(),
    ];
    let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Regions(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_regions_with(args, &mut *buffer)
        }
        other => panic!("expected regions command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the regions listed are {regions}")]
fn regions_listed(#[from(world)] world: &RegionsWorld, regions: String) {
    let listed: Vec<String> = world
        .listed()
        .iter()
        .filter_map(|stats| stats["region"].as_str().map(str::to_owned))
        .collect();
    let expected: Vec<&str> = unquote(&regions).split(", ").collect();
    assert_eq!(listed, expected);
}

#[then("region {region} reports {places} places and {pois} points of interest")]
fn region_reports_counts(
    #[from(world)] world: &RegionsWorld,
    region: String,
    places: u64,
    pois: u64,
) {
    let listed = world.listed();
    let stats = listed
        .iter()
        .find(|stats| stats["region"] == unquote(&region))
        .expect("region listed");
    assert_eq!(stats["place_count"], places);
    assert_eq!(stats["poi_count"], pois);
    assert!(stats["file_size_bytes"].as_u64().is_some_and(|size| size > 0));
}

#[then("no regions are listed")]
fn no_regions_listed(#[from(world)] world: &RegionsWorld) {
    assert!(world.listed().is_empty());
}

macro_rules! register_regions_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/regions_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RegionsWorld) {
            let _ = world;
        }
    };
}

register_regions_scenario!(regions_are_described, "Installed regions are described");
register_regions_scenario!(
    regions_missing_directory,
    "A missing regions directory lists nothing"
);
