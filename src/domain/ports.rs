use crate::domain::model::{
    LoadProgress, Region, RegionData, RegionView, RenderProgress, SummaryRow, SummaryScope,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the catalog and per-region documents come from.
/// Paths are relative to the data root, e.g. `hokkaido/mesh.geojson`.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;

    fn describe(&self) -> String;
}

/// Rendering / UI side of a session.
pub trait Presenter: Send + Sync {
    fn load_progress(&self, _progress: &LoadProgress) {}

    /// Called once per region, right after it reaches `Loaded`.
    fn render_static(&self, _region: &Region, _data: &RegionData) {}

    fn render_progress(&self, _progress: &RenderProgress) {}

    fn render_region(&self, region: &Region, data: &RegionData, view: &RegionView) -> Result<()>;

    fn show_summary(&self, _scope: &SummaryScope, _rows: &[SummaryRow]) {}

    fn active_count(&self, _active: usize, _total: usize) {}

    fn startup_finished(&self) {}
}
