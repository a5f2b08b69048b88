use crate::core::accessibility::classify_region;
use crate::core::cache::RegionCache;
use crate::core::classify::{band_label, BAND_COUNT};
use crate::domain::model::{RegionData, SummaryRow, SummaryScope};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    cells: usize,
    population: u64,
}

/// Population per travel-time band over the given regions. Always rebuilt from scratch.
pub fn summarize<'a, I>(regions: I, active: &HashSet<String>) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a RegionData>,
{
    let mut bins = [Bin::default(); BAND_COUNT];
    let mut total: u64 = 0;

    for data in regions {
        let Some(cells) = classify_region(data, active) else {
            continue;
        };
        for (cell, mesh) in cells.iter().zip(data.mesh.iter()) {
            if let Some(cell) = cell {
                let bin = &mut bins[cell.band];
                bin.cells += 1;
                bin.population += mesh.population;
                total += mesh.population;
            }
        }
    }

    let mut cumulative: u64 = 0;
    bins.iter()
        .enumerate()
        .map(|(band, bin)| {
            cumulative += bin.population;
            SummaryRow {
                band,
                label: band_label(band),
                cell_count: bin.cells,
                population: bin.population,
                population_percent: percent(bin.population, total),
                cumulative_percent: percent(cumulative, total),
            }
        })
        .collect()
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn compute_summary(
    cache: &RegionCache,
    scope: &SummaryScope,
    active: &HashSet<String>,
) -> Vec<SummaryRow> {
    let regions = cache.loaded_in_scope(scope);
    summarize(regions.iter().map(|d| d.as_ref()), active)
}
