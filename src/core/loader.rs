use crate::domain::model::{
    Catalog, DurationMatrix, Facility, MeshCollection, Region, RegionData,
};
use crate::domain::ports::DataSource;
use crate::utils::error::{AccessError, Result};
use serde::de::DeserializeOwned;

pub const REGIONS_PATH: &str = "prefectures.json";
pub const FACILITIES_PATH: &str = "facilities.json";

pub const MESH_FILE: &str = "mesh.geojson";
pub const MATRIX_FILE: &str = "dur_matrix.json";
pub const MUNICIPALITIES_FILE: &str = "muni.geojson";
pub const BORDER_FILE: &str = "border.geojson";

async fn fetch_json<T: DeserializeOwned>(source: &dyn DataSource, path: &str) -> Result<T> {
    let bytes = source.fetch(path).await?;
    tracing::debug!("📥 Fetched {} ({} bytes)", path, bytes.len());
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn load_catalog(source: &dyn DataSource) -> Result<Catalog> {
    let (regions, facilities) = tokio::try_join!(
        fetch_json::<Vec<Region>>(source, REGIONS_PATH),
        fetch_json::<Vec<Facility>>(source, FACILITIES_PATH),
    )?;

    tracing::info!(
        "📋 Catalog loaded from {}: {} regions, {} facilities",
        source.describe(),
        regions.len(),
        facilities.len()
    );
    Ok(Catalog {
        regions,
        facilities,
    })
}

pub fn region_path(region: &Region, file: &str) -> String {
    format!("{}/{}", region.dir_name.trim_end_matches('/'), file)
}

pub async fn fetch_region_data(source: &dyn DataSource, region: &Region) -> Result<RegionData> {
    let mesh_path = region_path(region, MESH_FILE);
    let matrix_path = region_path(region, MATRIX_FILE);
    let muni_path = region_path(region, MUNICIPALITIES_FILE);
    let border_path = region_path(region, BORDER_FILE);

    let (mesh, matrix, municipalities, border) = tokio::try_join!(
        fetch_json::<MeshCollection>(source, &mesh_path),
        fetch_json::<DurationMatrix>(source, &matrix_path),
        fetch_json::<serde_json::Value>(source, &muni_path),
        fetch_json::<serde_json::Value>(source, &border_path),
    )
    .map_err(|e| AccessError::LoadError {
        region: region.code.clone(),
        message: e.to_string(),
    })?;

    let mesh = mesh.into_cells();
    if mesh.len() != matrix.row_count() {
        tracing::warn!(
            "⚠️ {}: mesh has {} cells but matrix has {} rows; missing rows count as unreachable",
            region.name,
            mesh.len(),
            matrix.row_count()
        );
    }

    Ok(RegionData {
        mesh,
        matrix,
        municipalities,
        border,
    })
}
