use crate::core::classify::band_color;
use crate::domain::model::{
    LoadProgress, Region, RegionData, RegionView, RenderProgress, SummaryRow, SummaryScope,
};
use crate::domain::ports::Presenter;
use crate::utils::error::{AccessError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionReport {
    pub name: String,
    pub total_cells: usize,
    pub shaded_cells: usize,
    pub boundary_features: usize,
    pub active_facilities: usize,
    pub facilities: usize,
}

#[derive(Debug, Default)]
struct ReportState {
    last_load: Option<LoadProgress>,
    regions: BTreeMap<String, RegionReport>,
    summary: Option<(SummaryScope, Vec<SummaryRow>)>,
    active: (usize, usize),
    finished: bool,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    scope: String,
    active_facilities: usize,
    total_facilities: usize,
    regions_loaded: usize,
    regions_total: usize,
    regions: &'a BTreeMap<String, RegionReport>,
    summary: &'a [SummaryRow],
}

#[derive(Serialize)]
struct SummaryCsvRecord<'a> {
    band: &'a str,
    cells: usize,
    population: u64,
    percent: String,
    cumulative_percent: String,
}

/// Presenter that narrates the session through `tracing` and can write the
/// shaded mesh, summary table and a run report to an output directory.
#[derive(Debug, Default)]
pub struct ReportPresenter {
    output_dir: Option<PathBuf>,
    write_geojson: bool,
    state: Mutex<ReportState>,
}

impl ReportPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(output_dir: impl Into<PathBuf>, write_geojson: bool) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
            write_geojson,
            state: Mutex::new(ReportState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn latest_summary(&self) -> Option<(SummaryScope, Vec<SummaryRow>)> {
        self.lock().summary.clone()
    }

    pub fn region_report(&self, code: &str) -> Option<RegionReport> {
        self.lock().regions.get(code).cloned()
    }

    pub fn last_load_progress(&self) -> Option<LoadProgress> {
        self.lock().last_load.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Writes `summary.csv` and `report.json` into the output directory, if one is set.
    pub fn write_outputs(&self) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.output_dir else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;

        let state = self.lock();
        let (scope, rows) = match &state.summary {
            Some((scope, rows)) => (scope.to_string(), rows.as_slice()),
            None => (SummaryScope::All.to_string(), &[][..]),
        };

        write_summary_csv(&dir.join("summary.csv"), rows)?;

        let document = ReportDocument {
            generated_at: chrono::Utc::now().to_rfc3339(),
            scope,
            active_facilities: state.active.0,
            total_facilities: state.active.1,
            regions_loaded: state.regions.len(),
            regions_total: state.last_load.as_ref().map(|p| p.total).unwrap_or(0),
            regions: &state.regions,
            summary: rows,
        };
        std::fs::write(
            dir.join("report.json"),
            serde_json::to_string_pretty(&document)?,
        )?;

        tracing::info!("📁 Report written to {}", dir.display());
        Ok(Some(dir.clone()))
    }
}

/// Shaded cells of one region as a GeoJSON FeatureCollection.
/// Unreachable cells are left out.
pub fn region_feature_collection(data: &RegionData, view: &RegionView) -> serde_json::Value {
    let features: Vec<serde_json::Value> = view
        .cells
        .iter()
        .flatten()
        .zip(data.mesh.iter())
        .filter_map(|(cell, mesh)| {
            cell.as_ref().map(|cell| {
                serde_json::json!({
                    "type": "Feature",
                    "geometry": mesh.geometry,
                    "properties": {
                        "population": mesh.population,
                        "travel_min": cell.rounded_minutes(),
                        "color": band_color(cell.band),
                    }
                })
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn feature_count(geojson: &serde_json::Value) -> usize {
    geojson
        .get("features")
        .and_then(|f| f.as_array())
        .map(Vec::len)
        .unwrap_or(0)
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(SummaryCsvRecord {
            band: row.label,
            cells: row.cell_count,
            population: row.population,
            percent: format!("{:.1}", row.population_percent),
            cumulative_percent: format!("{:.1}", row.cumulative_percent),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn format_summary_table(rows: &[SummaryRow]) -> String {
    let mut lines = vec![format!(
        "{:<10} {:>8} {:>12} {:>7} {:>7}",
        "所要時間", "メッシュ", "人口", "%", "累積%"
    )];
    for row in rows {
        lines.push(format!(
            "{:<10} {:>8} {:>12} {:>7.1} {:>7.1}",
            row.label, row.cell_count, row.population, row.population_percent, row.cumulative_percent
        ));
    }
    lines.join("\n")
}

impl Presenter for ReportPresenter {
    fn load_progress(&self, progress: &LoadProgress) {
        tracing::info!(
            "📦 データ読み込み中... {}/{} ({}%) {}",
            progress.completed,
            progress.total,
            progress.percentage,
            progress.region_name
        );
        self.lock().last_load = Some(progress.clone());
    }

    fn render_static(&self, region: &Region, data: &RegionData) {
        let boundaries = feature_count(&data.municipalities) + feature_count(&data.border);
        tracing::debug!("🗺️ {}: {} boundary features", region.name, boundaries);

        let mut state = self.lock();
        let entry = state.regions.entry(region.code.clone()).or_default();
        entry.name = region.name.clone();
        entry.total_cells = data.mesh.len();
        entry.boundary_features = boundaries;
    }

    fn render_progress(&self, progress: &RenderProgress) {
        tracing::info!(
            "🎨 描画中... {}/{} {}",
            progress.index,
            progress.total,
            progress.region_name
        );
    }

    fn render_region(&self, region: &Region, data: &RegionData, view: &RegionView) -> Result<()> {
        if self.write_geojson {
            if let Some(dir) = &self.output_dir {
                let collection = region_feature_collection(data, view);
                let path = dir.join(format!("{}.geojson", region.code));
                std::fs::create_dir_all(dir)
                    .and_then(|_| std::fs::write(&path, collection.to_string()))
                    .map_err(|e| AccessError::RenderError {
                        region: region.code.clone(),
                        message: format!("{}: {}", path.display(), e),
                    })?;
            }
        }

        let shaded = view.shaded_cell_count();
        let active = view.markers.iter().filter(|m| m.active).count();
        tracing::debug!(
            "{}: {} / {} cells shaded, {} / {} facilities active",
            region.name,
            shaded,
            data.mesh.len(),
            active,
            view.markers.len()
        );

        let mut state = self.lock();
        let entry = state.regions.entry(region.code.clone()).or_default();
        entry.name = region.name.clone();
        entry.total_cells = data.mesh.len();
        entry.shaded_cells = shaded;
        entry.active_facilities = active;
        entry.facilities = view.markers.len();
        Ok(())
    }

    fn show_summary(&self, scope: &SummaryScope, rows: &[SummaryRow]) {
        let population: u64 = rows.iter().map(|r| r.population).sum();
        tracing::info!("📊 Summary for {} (population {})", scope, population);
        for row in rows {
            tracing::debug!(
                "  {} cells={} pop={} {:.1}% cum {:.1}%",
                row.label,
                row.cell_count,
                row.population,
                row.population_percent,
                row.cumulative_percent
            );
        }
        self.lock().summary = Some((scope.clone(), rows.to_vec()));
    }

    fn active_count(&self, active: usize, total: usize) {
        tracing::info!("有効施設: {} / {}", active, total);
        self.lock().active = (active, total);
    }

    fn startup_finished(&self) {
        tracing::info!("✅ Startup finished");
        self.lock().finished = true;
    }
}
