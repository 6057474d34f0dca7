//! SQLite-backed region database: FTS5 address search and R-tree POI lookup.

use std::{fmt, str::FromStr};

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter, types::Value};

use crate::{
    AddressParts, AddressRecord, Category, NearbyQuery, PointOfInterestRecord, RegionId,
    SearchHit, SourceKind, Tags, UNKNOWN_LOCATION,
    geodesy::{haversine_distance, radius_boxes},
    normalize::{AddressComponents, place_kind},
    record::sort_by_distance,
};

use super::{RegionStats, RegionStoreError, push_unique_hits};

/// Schema of a region database as produced by the importer.
pub const REGION_SCHEMA: &str = "
CREATE TABLE places (
    id INTEGER PRIMARY KEY,
    osm_id INTEGER,
    osm_type TEXT,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    name TEXT,
    display_name TEXT,
    type TEXT,
    street TEXT,
    housenumber TEXT,
    city TEXT,
    postcode TEXT,
    state TEXT,
    country TEXT
);
CREATE VIRTUAL TABLE places_fts USING fts5(
    name, display_name, street, city, postcode,
    content='places', content_rowid='id'
);
CREATE TABLE pois (
    id INTEGER PRIMARY KEY,
    osm_id INTEGER,
    osm_type TEXT,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    name TEXT,
    category TEXT NOT NULL,
    address TEXT,
    phone TEXT,
    website TEXT,
    opening_hours TEXT
);
CREATE VIRTUAL TABLE pois_rtree USING rtree(id, min_lat, max_lat, min_lon, max_lon);
CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT);
";

const PLACE_COLUMNS: &str = "p.id, p.osm_id, p.osm_type, p.lat, p.lon, p.name, p.display_name, \
     p.type, p.street, p.housenumber, p.city, p.postcode, p.state, p.country";

const POI_COLUMNS: &str = "p.id, p.osm_id, p.osm_type, p.lat, p.lon, p.name, p.category, \
     p.address, p.phone, p.website, p.opening_hours";

/// Turn free text into an FTS5 prefix query.
///
/// Quotes are dropped, other punctuation separates tokens and every token is
/// quoted with a trailing prefix marker. Returns `None` when nothing
/// searchable remains.
///
/// # Examples
///
/// ```
/// use waymark_core::store::sanitize_fts_query;
///
/// assert_eq!(sanitize_fts_query("O'Neil st."), Some("\"ONeil\"* \"st\"*".to_owned()));
/// assert_eq!(sanitize_fts_query("--"), None);
/// ```
#[must_use]
pub fn sanitize_fts_query(query: &str) -> Option<String> {
    let cleaned: String = query
        .chars()
        .filter(|ch| !matches!(ch, '\'' | '"'))
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();
    let tokens: Vec<String> = cleaned
        .split_whitespace()
        .map(|token| format!("\"{token}\"*"))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// `LIKE` pattern matching `text` anywhere, with wildcards stripped.
fn contains_pattern(text: &str) -> Option<String> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '%' | '_'))
        .collect();
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(format!("%{}%", cleaned.trim()))
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn category_placeholders(first_index: usize, count: usize) -> String {
    (first_index..first_index + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn category_values(categories: &[Category]) -> impl Iterator<Item = Value> + '_ {
    categories
        .iter()
        .map(|category| Value::Text(category.id().to_owned()))
}

/// One opened region database.
pub struct RegionDatabase {
    region: RegionId,
    path: Utf8PathBuf,
    connection: Connection,
    has_pois: bool,
}

impl fmt::Debug for RegionDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionDatabase")
            .field("region", &self.region)
            .field("path", &self.path)
            .field("has_pois", &self.has_pois)
            .finish_non_exhaustive()
    }
}

impl RegionDatabase {
    /// Open `path` read-only as the database for `region`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::OpenDatabase`] when SQLite cannot open the
    /// file, or [`RegionStoreError::Database`] when the schema cannot be
    /// inspected.
    pub fn open(region: RegionId, path: &Utf8Path) -> Result<Self, RegionStoreError> {
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| RegionStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        let has_pois = table_exists(&connection, "pois")?;
        log::debug!("opened region {region} from {path}");
        Ok(Self {
            region,
            path: path.to_path_buf(),
            connection,
            has_pois,
        })
    }

    /// Region served by this database.
    #[must_use]
    pub const fn region(&self) -> &RegionId {
        &self.region
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether the database carries a point-of-interest table.
    ///
    /// Older region files hold addresses only.
    #[must_use]
    pub const fn has_poi_data(&self) -> bool {
        self.has_pois
    }

    /// Ranked address search.
    ///
    /// Runs an FTS5 prefix query ordered by `bm25`. When the full-text index
    /// is missing or rejects the query, falls back to an unranked substring
    /// scan over name, display name, street and city.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::Database`] when the fallback scan fails.
    pub fn search_text(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, RegionStoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if let Some(fts_query) = sanitize_fts_query(query) {
            match self.search_text_ranked(&fts_query, limit) {
                Ok(records) => return Ok(records),
                Err(err) => log::warn!(
                    "full-text search failed in region {}, scanning instead: {err}",
                    self.region
                ),
            }
        }
        self.search_text_scan(query, limit)
    }

    fn search_text_ranked(
        &self,
        fts_query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, rusqlite::Error> {
        let sql = format!(
            "SELECT {PLACE_COLUMNS} FROM places_fts \
             JOIN places p ON p.id = places_fts.rowid \
             WHERE places_fts MATCH ?1 \
             ORDER BY bm25(places_fts) \
             LIMIT ?2"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(params![fts_query, sql_limit(limit)], address_from_row)?;
        rows.collect()
    }

    fn search_text_scan(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, RegionStoreError> {
        let Some(pattern) = contains_pattern(query) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {PLACE_COLUMNS} FROM places p \
             WHERE p.name LIKE ?1 OR p.display_name LIKE ?1 OR p.street LIKE ?1 OR p.city LIKE ?1 \
             LIMIT ?2"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(params![pattern, sql_limit(limit)], address_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Points of interest within the query radius, nearest first.
    ///
    /// The R-tree narrows candidates to the bounding boxes of the radius,
    /// split in two when the circle crosses the antimeridian; haversine
    /// distance then discards corners outside the circle.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::Database`] when the query fails.
    pub fn search_nearby(
        &self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        if !self.has_pois || query.categories.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {POI_COLUMNS} FROM pois_rtree r \
             JOIN pois p ON p.id = r.id \
             WHERE r.min_lat >= ?1 AND r.max_lat <= ?2 AND r.min_lon >= ?3 AND r.max_lon <= ?4 \
             AND p.category IN ({})",
            category_placeholders(5, query.categories.len())
        );
        let mut statement = self.connection.prepare(&sql)?;
        let radius_m = query.radius_m();
        let mut records = Vec::new();
        for bounds in radius_boxes(query.center, query.radius_km) {
            let values = [
                Value::Real(bounds.min().y),
                Value::Real(bounds.max().y),
                Value::Real(bounds.min().x),
                Value::Real(bounds.max().x),
            ]
            .into_iter()
            .chain(category_values(&query.categories));
            let rows = statement.query_map(params_from_iter(values), poi_from_row)?;
            for row in rows {
                let record = row?;
                if haversine_distance(query.center, record.location) <= radius_m {
                    records.push(record.measured_from(query.center));
                }
            }
        }
        sort_by_distance(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    /// Every point of interest in the region matching `categories`, ordered
    /// by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::Database`] when the query fails.
    pub fn search_category(
        &self,
        categories: &[Category],
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        if !self.has_pois || categories.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {POI_COLUMNS} FROM pois p \
             WHERE p.category IN ({}) \
             ORDER BY p.name COLLATE NOCASE \
             LIMIT ?1",
            category_placeholders(2, categories.len())
        );
        let values = std::iter::once(Value::Integer(sql_limit(limit))).chain(category_values(categories));
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(params_from_iter(values), poi_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Addresses, then points of interest, whose name contains `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::Database`] when a query fails.
    pub fn search_by_name(&self, name: &str, limit: usize) -> Result<Vec<SearchHit>, RegionStoreError> {
        let Some(pattern) = contains_pattern(name) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }

        let place_sql = format!(
            "SELECT {PLACE_COLUMNS} FROM places p WHERE p.name LIKE ?1 ORDER BY p.name COLLATE NOCASE LIMIT ?2"
        );
        let mut statement = self.connection.prepare(&place_sql)?;
        let places = statement
            .query_map(params![pattern, sql_limit(limit)], address_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut hits = Vec::with_capacity(limit);
        push_unique_hits(&mut hits, places.into_iter().map(SearchHit::Address));

        if self.has_pois && hits.len() < limit {
            let poi_sql = format!(
                "SELECT {POI_COLUMNS} FROM pois p WHERE p.name LIKE ?1 ORDER BY p.name COLLATE NOCASE LIMIT ?2"
            );
            let mut poi_statement = self.connection.prepare(&poi_sql)?;
            let pois = poi_statement
                .query_map(params![pattern, sql_limit(limit)], poi_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            push_unique_hits(&mut hits, pois.into_iter().map(SearchHit::PointOfInterest));
        }

        hits.truncate(limit);
        Ok(hits)
    }

    /// Row counts, creation date and file size.
    ///
    /// Counts come from the `metadata` table when recorded there and are
    /// counted directly otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::FileMetadata`] when the file cannot be
    /// inspected, or [`RegionStoreError::Database`] when a query fails.
    pub fn stats(&self) -> Result<RegionStats, RegionStoreError> {
        let file_size_bytes =
            waymark_fs::file_len(&self.path).map_err(|source| RegionStoreError::FileMetadata {
                path: self.path.clone(),
                source,
            })?;
        let has_metadata = table_exists(&self.connection, "metadata")?;
        let metadata = |key: &str| -> Result<Option<String>, rusqlite::Error> {
            if has_metadata {
                self.connection
                    .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                        row.get(0)
                    })
                    .optional()
            } else {
                Ok(None)
            }
        };

        let place_count = match metadata("place_count")?.and_then(|value| value.parse().ok()) {
            Some(count) => count,
            None => self.count_rows("places")?,
        };
        let poi_count = match metadata("poi_count")?.and_then(|value| value.parse().ok()) {
            Some(count) => count,
            None if self.has_pois => self.count_rows("pois")?,
            None => 0,
        };

        Ok(RegionStats {
            region: self.region.clone(),
            place_count,
            poi_count,
            created: metadata("created")?,
            file_size_bytes,
        })
    }

    fn count_rows(&self, table: &str) -> Result<u64, rusqlite::Error> {
        let count: i64 =
            self.connection
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Close the connection, logging any failure.
    pub fn close(self) {
        let region = self.region;
        if let Err((_, err)) = self.connection.close() {
            log::warn!("failed to close region {region} cleanly: {err}");
        } else {
            log::debug!("closed region {region}");
        }
    }
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Source identifier: the map element id when recorded, the row id otherwise.
fn source_id(row: &Row<'_>) -> Result<i64, rusqlite::Error> {
    let row_id: i64 = row.get(0)?;
    let osm_id: Option<i64> = row.get(1)?;
    Ok(osm_id.unwrap_or(row_id))
}

fn address_from_row(row: &Row<'_>) -> Result<AddressRecord, rusqlite::Error> {
    let lat: f64 = row.get(3)?;
    let lon: f64 = row.get(4)?;
    let name: Option<String> = row.get(5)?;
    let display_name: Option<String> = row.get(6)?;
    let raw_type: Option<String> = row.get(7)?;
    let street: Option<String> = row.get(8)?;
    let house_number: Option<String> = row.get(9)?;
    let city: Option<String> = row.get(10)?;
    let postcode: Option<String> = row.get(11)?;
    let state: Option<String> = row.get(12)?;
    let country: Option<String> = row.get(13)?;

    let display_name = display_name
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            AddressComponents {
                name: name.as_deref(),
                house_number: house_number.as_deref(),
                street: street.as_deref(),
                locality: city.as_deref(),
                region: state.as_deref(),
                postcode: postcode.as_deref(),
                country: country.as_deref(),
            }
            .display_name()
        });

    Ok(AddressRecord::new(AddressParts {
        source: SourceKind::RegionStore,
        source_id: source_id(row)?,
        osm_type: row.get(2)?,
        location: Coord { x: lon, y: lat },
        name: name.unwrap_or_default(),
        display_name,
        kind: place_kind(raw_type.as_deref()),
    }))
}

fn poi_from_row(row: &Row<'_>) -> Result<PointOfInterestRecord, rusqlite::Error> {
    let lat: f64 = row.get(3)?;
    let lon: f64 = row.get(4)?;
    let name: Option<String> = row.get(5)?;
    let raw_category: String = row.get(6)?;
    let address: Option<String> = row.get(7)?;

    let category = Category::from_str(&raw_category).ok();
    if category.is_none() {
        log::debug!("unrecognised stored category {raw_category:?}");
    }

    let mut tags = Tags::new();
    for (index, key) in [(8, "phone"), (9, "website"), (10, "opening_hours")] {
        let value: Option<String> = row.get(index)?;
        if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
            tags.insert(key.to_owned(), value);
        }
    }

    let name = name
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            category.map_or(UNKNOWN_LOCATION, Category::display_name).to_owned()
        });

    Ok(PointOfInterestRecord {
        source: SourceKind::RegionStore,
        source_id: source_id(row)?,
        osm_type: row.get(2)?,
        location: Coord { x: lon, y: lat },
        category,
        name,
        address: address.unwrap_or_default(),
        distance_m: None,
        tags,
    })
}
