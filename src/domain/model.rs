use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub dir_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    #[serde(rename = "pref_code")]
    pub region_code: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub regions: Vec<Region>,
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshCell {
    pub geometry: serde_json::Value,
    pub population: u64,
}

/// `mesh.geojson` as delivered; only population is interpreted.
#[derive(Debug, Deserialize)]
pub struct MeshCollection {
    #[serde(default)]
    features: Vec<MeshFeature>,
}

#[derive(Debug, Deserialize)]
struct MeshFeature {
    #[serde(default)]
    geometry: serde_json::Value,
    #[serde(default)]
    properties: Option<MeshProperties>,
}

#[derive(Debug, Deserialize)]
struct MeshProperties {
    #[serde(default)]
    population: Option<f64>,
}

impl MeshCollection {
    pub fn into_cells(self) -> Vec<MeshCell> {
        self.features
            .into_iter()
            .map(|f| MeshCell {
                geometry: f.geometry,
                // 缺值或負值視為 0
                population: f
                    .properties
                    .and_then(|p| p.population)
                    .filter(|p| p.is_finite() && *p > 0.0)
                    .map(|p| p.round() as u64)
                    .unwrap_or(0),
            })
            .collect()
    }
}

/// Column names as they arrive: a single-column matrix collapses to a bare string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnNames {
    Single(String),
    Many(Vec<String>),
}

impl ColumnNames {
    pub fn normalize(self) -> Vec<String> {
        match self {
            ColumnNames::Single(name) => vec![name],
            ColumnNames::Many(names) => names,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawDurationMatrix {
    #[serde(default)]
    pub colnames: Option<ColumnNames>,
    #[serde(default)]
    pub data: Vec<Vec<f64>>,
}

/// Travel durations in seconds, one row per mesh cell, one column per facility.
/// Negative values mean unreachable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawDurationMatrix")]
pub struct DurationMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl From<RawDurationMatrix> for DurationMatrix {
    fn from(raw: RawDurationMatrix) -> Self {
        Self {
            columns: raw.colnames.map(ColumnNames::normalize).unwrap_or_default(),
            rows: raw.data,
        }
    }
}

impl DurationMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Everything fetched for one region. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct RegionData {
    pub mesh: Vec<MeshCell>,
    pub matrix: DurationMatrix,
    pub municipalities: serde_json::Value,
    pub border: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellAccessibility {
    pub minutes: f64,
    pub band: usize,
}

impl CellAccessibility {
    /// Presentation value, one decimal place.
    pub fn rounded_minutes(&self) -> f64 {
        (self.minutes * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityMarker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub active: bool,
}

/// What the rendering side needs to redraw one loaded region.
/// `cells` is `None` when no active facility belongs to the region's matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionView {
    pub region_code: String,
    pub cells: Option<Vec<Option<CellAccessibility>>>,
    pub markers: Vec<FacilityMarker>,
}

impl RegionView {
    pub fn shaded_cell_count(&self) -> usize {
        self.cells
            .as_ref()
            .map(|cells| cells.iter().filter(|c| c.is_some()).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub band: usize,
    pub label: &'static str,
    pub cell_count: usize,
    pub population: u64,
    pub population_percent: f64,
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SummaryScope {
    #[default]
    All,
    Region(String),
}

impl SummaryScope {
    pub fn includes(&self, region_code: &str) -> bool {
        match self {
            SummaryScope::All => true,
            SummaryScope::Region(code) => code == region_code,
        }
    }
}

impl FromStr for SummaryScope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            Ok(SummaryScope::All)
        } else {
            Ok(SummaryScope::Region(s.to_string()))
        }
    }
}

impl fmt::Display for SummaryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryScope::All => write!(f, "all"),
            SummaryScope::Region(code) => write!(f, "{}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub region_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderProgress {
    pub index: usize,
    pub total: usize,
    pub region_name: String,
}
