use crate::domain::model::{Facility, FacilityMarker};
use std::collections::HashSet;

// 施設以名稱識別，不檢查重名
#[derive(Debug, Clone, Default)]
pub struct FacilityRegistry {
    facilities: Vec<Facility>,
    active: HashSet<String>,
}

impl FacilityRegistry {
    pub fn new(facilities: Vec<Facility>) -> Self {
        let active = facilities.iter().map(|f| f.name.clone()).collect();
        Self { facilities, active }
    }

    pub fn active_set(&self) -> &HashSet<String> {
        &self.active
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn total_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn facilities_in_region<'a>(
        &'a self,
        region_code: &'a str,
    ) -> impl Iterator<Item = &'a Facility> + 'a {
        self.facilities
            .iter()
            .filter(move |f| f.region_code == region_code)
    }

    pub fn toggle(&mut self, name: &str) -> bool {
        if self.active.remove(name) {
            false
        } else {
            self.active.insert(name.to_string());
            true
        }
    }

    pub fn select_region(&mut self, region_code: &str) {
        let names: Vec<String> = self
            .facilities_in_region(region_code)
            .map(|f| f.name.clone())
            .collect();
        self.active.extend(names);
    }

    pub fn deselect_region(&mut self, region_code: &str) {
        for facility in self
            .facilities
            .iter()
            .filter(|f| f.region_code == region_code)
        {
            self.active.remove(&facility.name);
        }
    }

    pub fn select_all(&mut self) {
        self.active
            .extend(self.facilities.iter().map(|f| f.name.clone()));
    }

    pub fn deselect_all(&mut self) {
        self.active.clear();
    }

    pub fn markers(&self, region_code: &str) -> Vec<FacilityMarker> {
        self.facilities_in_region(region_code)
            .map(|f| FacilityMarker {
                name: f.name.clone(),
                lat: f.lat,
                lon: f.lon,
                active: self.active.contains(&f.name),
            })
            .collect()
    }
}
