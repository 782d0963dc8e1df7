//! Per-run quota accounting.

use std::collections::BTreeMap;

use crate::config::QuotaConfig;
use crate::release::{Codec, NormalizedRelease, QualityCategory, Resolution};

use super::types::{BucketCount, CodecCount, LedgerSnapshot, Rejection, SatisfiedQuotas};

/// Tracks what a run has accepted and how much room is left.
///
/// A ledger belongs to exactly one run. Counters only ever go up. In bypass
/// mode every check passes but acceptances are still counted.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    config: QuotaConfig,
    satisfied: SatisfiedQuotas,
    bypass: bool,
    accepted: BTreeMap<(QualityCategory, Resolution), u32>,
    accepted_by_resolution: BTreeMap<Resolution, u32>,
    codec_count: BTreeMap<(Resolution, Codec), u32>,
}

impl QuotaLedger {
    pub fn new(config: QuotaConfig, satisfied: SatisfiedQuotas, bypass: bool) -> Self {
        Self {
            config,
            satisfied,
            bypass,
            accepted: BTreeMap::new(),
            accepted_by_resolution: BTreeMap::new(),
            codec_count: BTreeMap::new(),
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Slots still open for a category×resolution bucket.
    ///
    /// Pure arithmetic; bypass mode is handled by the callers.
    pub fn remaining(&self, category: QualityCategory, resolution: Resolution) -> u32 {
        self.config
            .limits
            .get(category)
            .saturating_sub(self.satisfied.get(category, resolution))
            .saturating_sub(self.accepted(category, resolution))
    }

    /// Slots still open under the resolution cap, if one is configured.
    pub fn resolution_remaining(&self, resolution: Resolution) -> Option<u32> {
        self.config.resolution_caps.get(resolution).map(|cap| {
            cap.saturating_sub(self.satisfied.resolution_total(resolution))
                .saturating_sub(self.accepted_at(resolution))
        })
    }

    /// Whether the codec family already filled its share of a resolution.
    pub fn codec_at_cap(&self, resolution: Resolution, codec: Codec) -> bool {
        match self.config.codec_caps.get(codec) {
            Some(cap) => self.codec_count(resolution, codec) >= cap,
            None => false,
        }
    }

    /// True iff every bucket in scope has nothing left. Never true in bypass.
    pub fn all_satisfied(
        &self,
        categories: &[QualityCategory],
        resolutions: &[Resolution],
    ) -> bool {
        if self.bypass {
            return false;
        }
        categories
            .iter()
            .all(|c| resolutions.iter().all(|r| self.remaining(*c, *r) == 0))
    }

    /// Check codec diversification, then quota, then resolution cap.
    pub fn admit(&self, release: &NormalizedRelease) -> Result<(), Rejection> {
        if self.bypass {
            return Ok(());
        }
        let (category, resolution, codec) =
            (release.category, release.resolution, release.codec);

        if self.codec_at_cap(resolution, codec) {
            return Err(Rejection::CodecCap { resolution, codec });
        }
        if self.remaining(category, resolution) == 0 {
            return Err(Rejection::QuotaFull {
                category,
                resolution,
            });
        }
        if self.resolution_remaining(resolution) == Some(0) {
            return Err(Rejection::ResolutionCap { resolution });
        }
        Ok(())
    }

    /// Count an acceptance.
    pub fn record(&mut self, category: QualityCategory, resolution: Resolution, codec: Codec) {
        *self.accepted.entry((category, resolution)).or_insert(0) += 1;
        *self.accepted_by_resolution.entry(resolution).or_insert(0) += 1;
        *self.codec_count.entry((resolution, codec)).or_insert(0) += 1;
    }

    pub fn accepted(&self, category: QualityCategory, resolution: Resolution) -> u32 {
        self.accepted
            .get(&(category, resolution))
            .copied()
            .unwrap_or(0)
    }

    pub fn accepted_at(&self, resolution: Resolution) -> u32 {
        self.accepted_by_resolution
            .get(&resolution)
            .copied()
            .unwrap_or(0)
    }

    pub fn codec_count(&self, resolution: Resolution, codec: Codec) -> u32 {
        self.codec_count
            .get(&(resolution, codec))
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accepted: self
                .accepted
                .iter()
                .map(|((category, resolution), count)| BucketCount {
                    category: *category,
                    resolution: *resolution,
                    count: *count,
                })
                .collect(),
            accepted_by_resolution: self.accepted_by_resolution.clone(),
            codec_counts: self
                .codec_count
                .iter()
                .map(|((resolution, codec), count)| CodecCount {
                    resolution: *resolution,
                    codec: *codec,
                    count: *count,
                })
                .collect(),
            bypass: self.bypass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::{CodecCaps, QuotaLimits, ResolutionCaps};

    fn release(
        category: QualityCategory,
        resolution: Resolution,
        codec: Codec,
    ) -> NormalizedRelease {
        NormalizedRelease {
            name: "test".to_string(),
            info_hash: "abc".to_string(),
            size_bytes: 0,
            seeders: 0,
            category,
            resolution,
            codec,
            source: None,
        }
    }

    fn config() -> QuotaConfig {
        QuotaConfig {
            limits: QuotaLimits::default()
                .with_limit(QualityCategory::Remux, 1)
                .with_limit(QualityCategory::BluRay, 2),
            resolution_caps: ResolutionCaps::default(),
            codec_caps: CodecCaps::uncapped(),
        }
    }

    #[test]
    fn test_remaining_subtracts_satisfied_and_accepted() {
        let satisfied = SatisfiedQuotas::new().with_resolution(
            QualityCategory::BluRay,
            Resolution::P1080,
            1,
        );
        let mut ledger = QuotaLedger::new(config(), satisfied, false);

        assert_eq!(ledger.remaining(QualityCategory::BluRay, Resolution::P1080), 1);
        assert_eq!(ledger.remaining(QualityCategory::BluRay, Resolution::P2160), 2);

        ledger.record(QualityCategory::BluRay, Resolution::P1080, Codec::H264);
        assert_eq!(ledger.remaining(QualityCategory::BluRay, Resolution::P1080), 0);

        // Never underflows
        ledger.record(QualityCategory::BluRay, Resolution::P1080, Codec::H264);
        assert_eq!(ledger.remaining(QualityCategory::BluRay, Resolution::P1080), 0);
    }

    #[test]
    fn test_all_satisfied() {
        let mut ledger = QuotaLedger::new(config(), SatisfiedQuotas::new(), false);
        let cats = [QualityCategory::Remux];
        let res = [Resolution::P2160, Resolution::P1080];

        assert!(!ledger.all_satisfied(&cats, &res));
        ledger.record(QualityCategory::Remux, Resolution::P2160, Codec::H265);
        assert!(!ledger.all_satisfied(&cats, &res));
        ledger.record(QualityCategory::Remux, Resolution::P1080, Codec::H264);
        assert!(ledger.all_satisfied(&cats, &res));
    }

    #[test]
    fn test_admit_quota_full() {
        let satisfied = SatisfiedQuotas::new().with_category(QualityCategory::Remux, 1);
        let ledger = QuotaLedger::new(config(), satisfied, false);

        let result = ledger.admit(&release(
            QualityCategory::Remux,
            Resolution::P2160,
            Codec::H265,
        ));
        assert_eq!(
            result,
            Err(Rejection::QuotaFull {
                category: QualityCategory::Remux,
                resolution: Resolution::P2160
            })
        );
    }

    #[test]
    fn test_admit_codec_cap() {
        let mut cfg = config();
        cfg.codec_caps = CodecCaps {
            h265: Some(1),
            h264: None,
            unknown: None,
        };
        let mut ledger = QuotaLedger::new(cfg, SatisfiedQuotas::new(), false);
        ledger.record(QualityCategory::BluRay, Resolution::P1080, Codec::H265);

        assert_eq!(
            ledger.admit(&release(QualityCategory::BluRay, Resolution::P1080, Codec::H265)),
            Err(Rejection::CodecCap {
                resolution: Resolution::P1080,
                codec: Codec::H265
            })
        );
        assert!(ledger
            .admit(&release(QualityCategory::BluRay, Resolution::P1080, Codec::H264))
            .is_ok());
        assert!(ledger
            .admit(&release(QualityCategory::BluRay, Resolution::P2160, Codec::H265))
            .is_ok());
    }

    #[test]
    fn test_admit_resolution_cap_spans_categories() {
        let mut cfg = config();
        cfg.resolution_caps.p1080 = Some(1);
        let mut ledger = QuotaLedger::new(cfg, SatisfiedQuotas::new(), false);
        ledger.record(QualityCategory::BluRay, Resolution::P1080, Codec::H264);

        assert_eq!(
            ledger.admit(&release(QualityCategory::WebDl, Resolution::P1080, Codec::Unknown)),
            Err(Rejection::ResolutionCap {
                resolution: Resolution::P1080
            })
        );
        assert_eq!(ledger.resolution_remaining(Resolution::P2160), None);
    }

    #[test]
    fn test_bypass_never_blocks_but_still_counts() {
        let satisfied = SatisfiedQuotas::new().with_category(QualityCategory::Remux, 5);
        let mut ledger = QuotaLedger::new(config(), satisfied, true);
        let remux = release(QualityCategory::Remux, Resolution::P2160, Codec::H265);

        assert!(ledger.admit(&remux).is_ok());
        ledger.record(remux.category, remux.resolution, remux.codec);
        ledger.record(remux.category, remux.resolution, remux.codec);

        assert!(!ledger.all_satisfied(&[QualityCategory::Remux], &[Resolution::P2160]));
        assert_eq!(ledger.accepted(QualityCategory::Remux, Resolution::P2160), 2);
        assert!(ledger.snapshot().bypass);
    }

    #[test]
    fn test_snapshot() {
        let mut ledger = QuotaLedger::new(config(), SatisfiedQuotas::new(), false);
        ledger.record(QualityCategory::Remux, Resolution::P2160, Codec::H265);
        ledger.record(QualityCategory::BluRay, Resolution::P2160, Codec::H264);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.accepted(QualityCategory::Remux, Resolution::P2160), 1);
        assert_eq!(snapshot.accepted(QualityCategory::WebDl, Resolution::P2160), 0);
        assert_eq!(snapshot.accepted_by_resolution[&Resolution::P2160], 2);
        assert_eq!(snapshot.codec_counts.len(), 2);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
