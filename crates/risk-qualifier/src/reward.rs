use analysis_core::{Bias, IndicatorSnapshot};

use crate::config::QualificationConfig;
use crate::models::{RiskReward, StopLevel, TargetLevel, TargetSource};
use crate::structure::{nearest_cluster, nearest_swing, Side};
use crate::traits::RiskRewardCalculator;

/// Targets the nearest structural level on the winning side of the entry,
/// falling back to a fixed reward multiple of the stop distance.
#[derive(Debug, Clone)]
pub struct StructuralRiskRewardCalculator {
    min_ratio: f64,
    preferred_ratio: f64,
    swing_lookback: usize,
    lookback_bars: usize,
    band_percent: f64,
    min_touches: usize,
}

impl StructuralRiskRewardCalculator {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            min_ratio: config.min_risk_reward,
            preferred_ratio: config.preferred_risk_reward,
            swing_lookback: config.swing_lookback,
            lookback_bars: config.invalidation_lookback_bars,
            band_percent: config.cluster_band_percent,
            min_touches: config.min_cluster_touches,
        }
    }

    pub fn preferred_ratio(&self) -> f64 {
        self.preferred_ratio
    }

    /// `entry ± stop_distance × preferred_ratio`
    pub fn projection(&self, entry_price: f64, stop: &StopLevel, bias: Bias) -> TargetLevel {
        let distance = stop.distance_from_entry * self.preferred_ratio;
        TargetLevel {
            price: entry_price + bias.sign() * distance,
            distance_from_entry: distance,
            source: TargetSource::Projection,
        }
    }

    fn structural(&self, snapshot: &IndicatorSnapshot, entry_price: f64, bias: Bias) -> Vec<TargetLevel> {
        let (side, swing_levels) = match bias {
            Bias::Bullish => (Side::Above, &snapshot.swing_highs),
            Bias::Bearish => (Side::Below, &snapshot.swing_lows),
            Bias::Neutral => return Vec::new(),
        };

        let swing = nearest_swing(swing_levels, entry_price, side, self.swing_lookback).map(|price| {
            TargetLevel {
                price,
                distance_from_entry: (price - entry_price).abs(),
                source: TargetSource::SwingLevel,
            }
        });

        let cluster = nearest_cluster(
            &snapshot.bars,
            entry_price,
            side,
            self.lookback_bars,
            self.band_percent,
            self.min_touches,
        )
        .map(|cluster| TargetLevel {
            price: cluster.price,
            distance_from_entry: (cluster.price - entry_price).abs(),
            source: TargetSource::PriceCluster,
        });

        let mut targets: Vec<TargetLevel> = swing.into_iter().chain(cluster).collect();
        // Stable sort keeps swing ahead of cluster at equal distance
        targets.sort_by(|a, b| {
            a.distance_from_entry
                .partial_cmp(&b.distance_from_entry)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        targets
    }
}

impl Default for StructuralRiskRewardCalculator {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl RiskRewardCalculator for StructuralRiskRewardCalculator {
    fn targets(
        &self,
        snapshot: &IndicatorSnapshot,
        entry_price: f64,
        stop: &StopLevel,
        bias: Bias,
    ) -> Vec<TargetLevel> {
        if !bias.is_directional() {
            return Vec::new();
        }

        let mut targets = self.structural(snapshot, entry_price, bias);
        targets.push(self.projection(entry_price, stop, bias));

        let tolerance = 1e-9 * entry_price.abs().max(1.0);
        let mut unique: Vec<TargetLevel> = Vec::with_capacity(targets.len());
        for target in targets {
            if unique.iter().all(|kept| (kept.price - target.price).abs() > tolerance) {
                unique.push(target);
            }
        }
        unique
    }

    fn evaluate(&self, stop: &StopLevel, target: &TargetLevel) -> RiskReward {
        let risk = stop.distance_from_entry;
        // Degenerate stop: ratio pinned to zero so the favorability check fails
        let ratio = if risk > 0.0 {
            target.distance_from_entry / risk
        } else {
            0.0
        };

        RiskReward {
            ratio,
            is_favorable: ratio >= self.min_ratio,
            is_preferred: ratio >= self.preferred_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stop(price: f64, distance: f64) -> StopLevel {
        StopLevel {
            price,
            distance_from_entry: distance,
            distance_in_atr_multiples: 2.0,
            is_within_bounds: true,
        }
    }

    fn bare_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            atr: 5.0,
            atr_percent: 2.0,
            adx: 30.0,
            current_price: 100.0,
            swing_highs: vec![],
            swing_lows: vec![],
            sma_short: 98.0,
            sma_medium: 95.0,
            bars: vec![],
        }
    }

    #[test]
    fn test_projection_when_no_structure() {
        let calc = StructuralRiskRewardCalculator::default();
        let targets = calc.targets(&bare_snapshot(), 100.0, &stop(90.0, 10.0), Bias::Bullish);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].source, TargetSource::Projection);
        assert_relative_eq!(targets[0].price, 120.0);

        let rr = calc.evaluate(&stop(90.0, 10.0), &targets[0]);
        assert_relative_eq!(rr.ratio, 2.0);
        assert!(rr.is_favorable);
        assert!(rr.is_preferred);
    }

    #[test]
    fn test_short_projection_below_entry() {
        let calc = StructuralRiskRewardCalculator::default();
        let targets = calc.targets(&bare_snapshot(), 50.0, &stop(53.0, 3.0), Bias::Bearish);
        assert_relative_eq!(targets[0].price, 44.0);
    }

    #[test]
    fn test_nearest_structure_is_primary() {
        let mut snap = bare_snapshot();
        snap.swing_highs = vec![130.0, 112.0];
        let calc = StructuralRiskRewardCalculator::default();
        let targets = calc.targets(&snap, 100.0, &stop(90.0, 10.0), Bias::Bullish);

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].source, TargetSource::SwingLevel);
        assert_relative_eq!(targets[0].price, 112.0);
        assert_eq!(targets[1].source, TargetSource::Projection);

        let rr = calc.evaluate(&stop(90.0, 10.0), &targets[0]);
        assert_relative_eq!(rr.ratio, 1.2);
        assert!(!rr.is_favorable);
    }

    #[test]
    fn test_structure_matching_projection_is_deduplicated() {
        let mut snap = bare_snapshot();
        snap.swing_highs = vec![120.0];
        let calc = StructuralRiskRewardCalculator::default();
        let targets = calc.targets(&snap, 100.0, &stop(90.0, 10.0), Bias::Bullish);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].source, TargetSource::SwingLevel);
    }

    #[test]
    fn test_zero_risk_gives_zero_ratio() {
        let calc = StructuralRiskRewardCalculator::default();
        let target = TargetLevel {
            price: 110.0,
            distance_from_entry: 10.0,
            source: TargetSource::SwingLevel,
        };
        let rr = calc.evaluate(&stop(100.0, 0.0), &target);

        assert_eq!(rr.ratio, 0.0);
        assert!(!rr.is_favorable);
    }

    #[test]
    fn test_favorable_but_not_preferred() {
        let calc = StructuralRiskRewardCalculator::default();
        let target = TargetLevel {
            price: 117.0,
            distance_from_entry: 17.0,
            source: TargetSource::SwingLevel,
        };
        let rr = calc.evaluate(&stop(90.0, 10.0), &target);

        assert!(rr.is_favorable);
        assert!(!rr.is_preferred);
    }

    #[test]
    fn test_neutral_bias_has_no_targets() {
        let calc = StructuralRiskRewardCalculator::default();
        assert!(calc
            .targets(&bare_snapshot(), 100.0, &stop(90.0, 10.0), Bias::Neutral)
            .is_empty());
    }
}
