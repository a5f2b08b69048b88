use crate::domain::model::{LoadProgress, Region, RegionData, SummaryScope};
use crate::utils::error::{AccessError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-region load state. Moves `NotLoaded -> Loading -> Loaded | Failed` once per session.
#[derive(Debug, Clone)]
pub enum RegionState {
    NotLoaded,
    Loading,
    Loaded(Arc<RegionData>),
    Failed(String),
}

#[derive(Debug)]
pub struct RegionCache {
    regions: Vec<Region>,
    states: HashMap<String, RegionState>,
    completed: usize,
}

impl RegionCache {
    pub fn new(regions: Vec<Region>) -> Self {
        let states = regions
            .iter()
            .map(|r| (r.code.clone(), RegionState::NotLoaded))
            .collect();
        Self {
            regions,
            states,
            completed: 0,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.code == code)
    }

    pub fn state(&self, code: &str) -> Option<&RegionState> {
        self.states.get(code)
    }

    /// Claims the region for loading. Returns `false` when it is already
    /// loading, loaded, or has failed; failed regions are not retried.
    pub fn begin_load(&mut self, code: &str) -> Result<bool> {
        let state = self
            .states
            .get_mut(code)
            .ok_or_else(|| AccessError::UnknownRegionError {
                code: code.to_string(),
            })?;

        match state {
            RegionState::NotLoaded => {
                *state = RegionState::Loading;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn complete_load(
        &mut self,
        code: &str,
        outcome: std::result::Result<Arc<RegionData>, String>,
    ) -> LoadProgress {
        if let Some(state) = self.states.get_mut(code) {
            if matches!(state, RegionState::Loading) {
                *state = match outcome {
                    Ok(data) => RegionState::Loaded(data),
                    Err(reason) => RegionState::Failed(reason),
                };
                self.completed += 1;
            }
        }

        let name = self
            .region(code)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        self.progress(name)
    }

    fn progress(&self, region_name: String) -> LoadProgress {
        let total = self.regions.len();
        let percentage = if total > 0 {
            (self.completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        LoadProgress {
            completed: self.completed,
            total,
            percentage,
            region_name,
        }
    }

    pub fn loaded(&self, code: &str) -> Option<Arc<RegionData>> {
        match self.states.get(code) {
            Some(RegionState::Loaded(data)) => Some(Arc::clone(data)),
            _ => None,
        }
    }

    pub fn loaded_regions(&self) -> Vec<(Region, Arc<RegionData>)> {
        self.regions
            .iter()
            .filter_map(|r| self.loaded(&r.code).map(|data| (r.clone(), data)))
            .collect()
    }

    pub fn loaded_in_scope(&self, scope: &SummaryScope) -> Vec<Arc<RegionData>> {
        self.regions
            .iter()
            .filter(|r| scope.includes(&r.code))
            .filter_map(|r| self.loaded(&r.code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<Region> {
        vec![
            Region {
                code: "01".into(),
                name: "北海道".into(),
                dir_name: "hokkaido".into(),
            },
            Region {
                code: "02".into(),
                name: "青森県".into(),
                dir_name: "aomori".into(),
            },
        ]
    }

    #[test]
    fn test_begin_load_is_single_flight() {
        let mut cache = RegionCache::new(regions());
        assert!(cache.begin_load("01").unwrap());
        assert!(!cache.begin_load("01").unwrap());
        assert!(matches!(cache.state("01"), Some(RegionState::Loading)));
    }

    #[test]
    fn test_unknown_region() {
        let mut cache = RegionCache::new(regions());
        assert!(matches!(
            cache.begin_load("99"),
            Err(AccessError::UnknownRegionError { .. })
        ));
    }

    #[test]
    fn test_failure_is_terminal_and_counted() {
        let mut cache = RegionCache::new(regions());
        cache.begin_load("02").unwrap();
        let progress = cache.complete_load("02", Err("HTTP 404".into()));

        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.percentage, 50);
        assert_eq!(progress.region_name, "青森県");
        assert!(matches!(cache.state("02"), Some(RegionState::Failed(_))));
        assert!(!cache.begin_load("02").unwrap());
    }

    #[test]
    fn test_loaded_regions_in_catalog_order() {
        let mut cache = RegionCache::new(regions());
        cache.begin_load("02").unwrap();
        cache.begin_load("01").unwrap();
        cache.complete_load("02", Ok(Arc::new(RegionData::default())));
        let progress = cache.complete_load("01", Ok(Arc::new(RegionData::default())));
        assert_eq!(progress.percentage, 100);

        let codes: Vec<_> = cache
            .loaded_regions()
            .into_iter()
            .map(|(r, _)| r.code)
            .collect();
        assert_eq!(codes, vec!["01", "02"]);
        assert_eq!(
            cache
                .loaded_in_scope(&SummaryScope::Region("02".into()))
                .len(),
            1
        );
        assert_eq!(cache.loaded_in_scope(&SummaryScope::All).len(), 2);
    }

    #[test]
    fn test_complete_without_claim_is_ignored() {
        let mut cache = RegionCache::new(regions());
        let progress = cache.complete_load("01", Ok(Arc::new(RegionData::default())));
        assert_eq!(progress.completed, 0);
        assert!(matches!(cache.state("01"), Some(RegionState::NotLoaded)));
    }
}
