use std::collections::BTreeMap;

use crate::domain::{Chamber, DistrictOutput, Endorsement, ResolvedCandidate};
use crate::reference::ReferenceData;

/// Accumulates resolved candidates into per-district (House) and per-state
/// (Senate) buckets, one record per entity id. Candidates keep their
/// first-encounter order within a bucket; endorsements keep row order.
#[derive(Debug, Default)]
pub struct DistrictAggregator {
    houses: BTreeMap<String, Vec<ResolvedCandidate>>,
    senates: BTreeMap<String, Vec<ResolvedCandidate>>,
}

impl DistrictAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the candidate on first sight; every occurrence overwrites the
    /// display name with the current row's and appends one endorsement.
    pub fn accumulate(
        &mut self,
        candidate: &ResolvedCandidate,
        display_name: &str,
        endorsement: Endorsement,
    ) {
        let bucket = match candidate.chamber {
            Chamber::House => self
                .houses
                .entry(house_key(candidate))
                .or_default(),
            Chamber::Senate => self.senates.entry(candidate.state.clone()).or_default(),
        };

        let index = match bucket
            .iter()
            .position(|existing| existing.entity_id == candidate.entity_id)
        {
            Some(index) => index,
            None => {
                bucket.push(candidate.clone());
                bucket.len() - 1
            }
        };
        bucket[index].name = display_name.to_string();
        bucket[index].endorsements.push(endorsement);
    }

    /// Joins the buckets into one output record per known House district.
    /// Every district in the reference set gets a file, empty or not, and
    /// the state's full Senate slate rides along with each one.
    pub fn build_outputs(&self, reference: &ReferenceData) -> BTreeMap<String, DistrictOutput> {
        let mut outputs = BTreeMap::new();
        for key in reference.house_races() {
            let state = key.split('-').next().unwrap_or_default();
            let house = self.houses.get(key).cloned().unwrap_or_default();
            let senate = self.senates.get(state).cloned().unwrap_or_default();
            outputs.insert(key.to_string(), DistrictOutput { house, senate });
        }
        outputs
    }

    /// House districts that attracted at least one candidate.
    pub fn house_district_count(&self) -> usize {
        self.houses.len()
    }

    /// States with at least one resolved Senate candidate.
    pub fn senate_race_count(&self) -> usize {
        self.senates.len()
    }

    /// Known districts with fewer than two resolved House candidates.
    pub fn missing_districts(&self, reference: &ReferenceData) -> Vec<(String, usize)> {
        reference
            .house_races()
            .filter_map(|key| {
                let count = self.houses.get(key).map(Vec::len).unwrap_or(0);
                (count < 2).then(|| (key.to_string(), count))
            })
            .collect()
    }
}

fn house_key(candidate: &ResolvedCandidate) -> String {
    match candidate.district {
        Some(district) => format!("{}-{district}", candidate.state),
        None => candidate.state.clone(),
    }
}
