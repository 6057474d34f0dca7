//! Behavioural tests for [`LocalRegionStore`] using rstest-bdd.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use waymark_core::{
    AddressRecord, Category, LocalRegionStore, NearbyQuery, PointOfInterestRecord, RegionId,
    RegionStore,
    test_support::{PlaceRow, PoiRow, RegionFixture, write_region_database},
};

const DOWNTOWN: Coord<f64> = Coord {
    x: -92.2896,
    y: 34.7465,
};

/// Shared state for region store scenarios.
#[derive(Debug)]
struct RegionWorld {
    temp_dir: TempDir,
    root: RefCell<Option<Utf8PathBuf>>,
    store: RefCell<Option<LocalRegionStore>>,
    pois: RefCell<Vec<PointOfInterestRecord>>,
    addresses: RefCell<Vec<AddressRecord>>,
    radius_m: RefCell<f64>,
}

impl RegionWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            root: RefCell::new(None),
            store: RefCell::new(None),
            pois: RefCell::new(Vec::new()),
            addresses: RefCell::new(Vec::new()),
            radius_m: RefCell::new(0.0),
        }
    }

    fn root(&self) -> Utf8PathBuf {
        self.root
            .borrow()
            .clone()
            .unwrap_or_else(|| {
                Utf8PathBuf::from_path_buf(self.temp_dir.path().to_path_buf())
                    .expect("temp paths are UTF-8")
            })
    }

    fn with_store<T>(&self, action: impl FnOnce(&mut LocalRegionStore) -> T) -> T {
        let mut borrowed = self.store.borrow_mut();
        let store = borrowed.get_or_insert_with(|| LocalRegionStore::new(self.root()));
        action(store)
    }
}

#[fixture]
fn world() -> RegionWorld {
    RegionWorld::new()
}

#[given("an installed arkansas region with hospitals and gas stations")]
fn given_arkansas(world: &RegionWorld) {
    let fixture = RegionFixture {
        places: vec![
            PlaceRow::new(1, "Little Rock", 34.7465, -92.2896).with_type("city"),
            PlaceRow::new(2, "North Little Rock", 34.7695, -92.2671).with_type("city"),
        ],
        pois: vec![
            PoiRow::new(10, "Baptist Health", Category::Hospital, 34.7480, -92.2900),
            PoiRow::new(11, "UAMS Medical Center", Category::Hospital, 34.7500, -92.3050),
            PoiRow::new(12, "Conway Regional", Category::Hospital, 35.0887, -92.4421),
            PoiRow::new(13, "Shell", Category::GasStation, 34.7470, -92.2890),
        ],
    };
    write_region_database(&world.root().join("arkansas.db"), &fixture).expect("persist region");
}

#[given("an installed tennessee region")]
fn given_tennessee(world: &RegionWorld) {
    let fixture = RegionFixture {
        places: vec![PlaceRow::new(3, "Memphis", 35.1495, -90.0490).with_type("city")],
        pois: vec![PoiRow::new(20, "Exxon", Category::GasStation, 35.15, -90.05)],
    };
    write_region_database(&world.root().join("tennessee.db"), &fixture).expect("persist region");
}

#[given("a regions directory that does not exist")]
fn given_missing_directory(world: &RegionWorld) {
    world.root.replace(Some(world.root().join("missing")));
}

#[when("I search for hospitals within {radius} km of downtown Little Rock")]
fn when_nearby(world: &RegionWorld, radius: f64) {
    let query = NearbyQuery::new(DOWNTOWN, radius, [Category::Hospital]);
    world.radius_m.replace(query.radius_m());
    let results = world.with_store(|store| store.search_nearby(&query, 100).expect("search"));
    world.pois.replace(results);
}

#[when("I search the text little ro")]
fn when_text(world: &RegionWorld) {
    let results = world.with_store(|store| store.search_text("little ro", 10).expect("search"));
    world.addresses.replace(results);
}

#[when("I search for gas stations in arkansas and then tennessee")]
fn when_two_regions(world: &RegionWorld) {
    for region in ["arkansas", "tennessee"] {
        let results = world.with_store(|store| {
            store
                .search_category_in_region(&RegionId::new(region), &[Category::GasStation], 10)
                .expect("search")
        });
        assert_eq!(results.len(), 1);
    }
}

#[then("{count} points of interest are returned")]
fn then_poi_count(world: &RegionWorld, count: usize) {
    assert_eq!(world.pois.borrow().len(), count);
}

#[then("every point of interest lies within the radius in distance order")]
fn then_within_radius(world: &RegionWorld) {
    let radius_m = *world.radius_m.borrow();
    let pois = world.pois.borrow();
    let distances: Vec<f64> = pois
        .iter()
        .map(|poi| poi.distance_m.expect("distance recorded"))
        .collect();
    assert!(distances.iter().all(|distance| *distance <= radius_m));
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[then("the first address is Little Rock")]
fn then_first_address(world: &RegionWorld) {
    let addresses = world.addresses.borrow();
    let first = addresses.first().expect("at least one address");
    assert_eq!(first.name(), "Little Rock");
}

#[then("tennessee is the open region")]
fn then_open_region(world: &RegionWorld) {
    let current = world.with_store(|store| store.current_region().cloned());
    assert_eq!(current, Some(RegionId::new("tennessee")));
}

#[then("no regions are available")]
fn then_no_regions(world: &RegionWorld) {
    let regions = world.with_store(|store| store.available_regions().expect("list regions"));
    assert!(regions.is_empty());
}

#[scenario(path = "tests/features/region_store.feature", index = 0)]
fn radius_search(world: RegionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_store.feature", index = 1)]
fn text_search(world: RegionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_store.feature", index = 2)]
fn one_open_region(world: RegionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_store.feature", index = 3)]
fn missing_directory(world: RegionWorld) {
    let _ = world;
}
