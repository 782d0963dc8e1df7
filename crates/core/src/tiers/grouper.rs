//! Category×resolution grouping and the tier walk orders built on it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::release::{NormalizedRelease, QualityCategory, Resolution};

use super::types::{SortPolicy, TierName};

type Buckets = BTreeMap<QualityCategory, BTreeMap<Resolution, Vec<NormalizedRelease>>>;

/// Releases grouped by category and resolution, each bucket sorted.
#[derive(Debug, Clone, Default)]
pub struct TierGroups {
    buckets: Buckets,
    len: usize,
}

impl TierGroups {
    /// Group and sort. Input order only matters for exact ties, which the
    /// info-hash tie-break removes.
    pub fn build(releases: Vec<NormalizedRelease>, policy: SortPolicy) -> Self {
        let len = releases.len();
        let mut buckets = Buckets::new();
        for release in releases {
            buckets
                .entry(release.category)
                .or_default()
                .entry(release.resolution)
                .or_default()
                .push(release);
        }
        for per_res in buckets.values_mut() {
            for list in per_res.values_mut() {
                list.sort_by(|a, b| compare(a, b, policy));
            }
        }
        Self { buckets, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket(
        &self,
        category: QualityCategory,
        resolution: Resolution,
    ) -> &[NormalizedRelease] {
        self.buckets
            .get(&category)
            .and_then(|per_res| per_res.get(&resolution))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every release, category-major then resolution, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRelease> {
        self.buckets
            .values()
            .flat_map(|per_res| per_res.values())
            .flatten()
    }

    /// Walk the given buckets category-major.
    pub fn walk(
        &self,
        categories: &[QualityCategory],
        resolutions: &[Resolution],
    ) -> Vec<&NormalizedRelease> {
        categories
            .iter()
            .flat_map(|c| resolutions.iter().map(move |r| (*c, *r)))
            .flat_map(|(c, r)| self.bucket(c, r))
            .collect()
    }

    pub fn tier(&self, tier: TierName) -> Vec<&NormalizedRelease> {
        self.walk(tier.categories(), tier.resolutions())
    }

    /// All four tiers restricted to `resolutions`, tier by tier.
    pub fn tiers_at(&self, resolutions: &[Resolution]) -> Vec<&NormalizedRelease> {
        TierName::ALL
            .iter()
            .flat_map(|tier| {
                let allowed: Vec<Resolution> = tier
                    .resolutions()
                    .iter()
                    .copied()
                    .filter(|r| resolutions.contains(r))
                    .collect();
                self.walk(tier.categories(), &allowed)
            })
            .collect()
    }
}

fn compare(a: &NormalizedRelease, b: &NormalizedRelease, policy: SortPolicy) -> Ordering {
    let primary = match policy {
        SortPolicy::SeedersThenSize => b
            .seeders
            .cmp(&a.seeders)
            .then_with(|| b.size_bytes.cmp(&a.size_bytes)),
        SortPolicy::SizeOnly => b.size_bytes.cmp(&a.size_bytes),
    };
    primary.then_with(|| a.info_hash.cmp(&b.info_hash))
}
