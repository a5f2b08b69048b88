use crate::core::classify::classify;
use crate::domain::model::{CellAccessibility, DurationMatrix, RegionData};
use std::collections::HashSet;

pub fn active_columns(matrix: &DurationMatrix, active: &HashSet<String>) -> Vec<usize> {
    matrix
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| active.contains(name.as_str()))
        .map(|(i, _)| i)
        .collect()
}

fn nearest_seconds(row: &[f64], columns: &[usize]) -> Option<f64> {
    columns
        .iter()
        .filter_map(|&c| row.get(c).copied())
        .filter(|secs| *secs >= 0.0)
        .fold(None, |best: Option<f64>, secs| {
            Some(best.map_or(secs, |b| b.min(secs)))
        })
}

/// Minutes to the nearest active facility for every mesh cell, by mesh index.
pub fn compute_travel_minutes(
    data: &RegionData,
    active: &HashSet<String>,
) -> Option<Vec<Option<f64>>> {
    let columns = active_columns(&data.matrix, active);
    if columns.is_empty() {
        return None;
    }

    let minutes = (0..data.mesh.len())
        .map(|i| {
            data.matrix
                .row(i)
                .and_then(|row| nearest_seconds(row, &columns))
                .map(|secs| secs / 60.0)
        })
        .collect();
    Some(minutes)
}

pub fn classify_region(
    data: &RegionData,
    active: &HashSet<String>,
) -> Option<Vec<Option<CellAccessibility>>> {
    compute_travel_minutes(data, active).map(|minutes| {
        minutes
            .into_iter()
            .map(|m| {
                m.map(|minutes| CellAccessibility {
                    minutes,
                    band: classify(minutes),
                })
            })
            .collect()
    })
}
