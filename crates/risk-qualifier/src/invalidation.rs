use analysis_core::{Bias, IndicatorSnapshot};

use crate::config::QualificationConfig;
use crate::models::{InvalidationBasis, InvalidationLevel};
use crate::structure::{nearest_cluster, nearest_level, nearest_swing, Side};
use crate::traits::InvalidationDetector;

/// Scans swing structure, moving averages and horizontal clusters for the
/// nearest level on the losing side of the entry.
///
/// Scans run in priority order (swing break, moving-average cross,
/// support/resistance). The nearest candidate wins; equidistant candidates
/// resolve to the higher-priority basis.
#[derive(Debug, Clone)]
pub struct StructureInvalidationDetector {
    swing_lookback: usize,
    lookback_bars: usize,
    band_percent: f64,
    min_touches: usize,
}

impl StructureInvalidationDetector {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            swing_lookback: config.swing_lookback,
            lookback_bars: config.invalidation_lookback_bars,
            band_percent: config.cluster_band_percent,
            min_touches: config.min_cluster_touches,
        }
    }

    fn swing_break(&self, snapshot: &IndicatorSnapshot, entry: f64, bias: Bias) -> Option<InvalidationLevel> {
        let (levels, side, label) = match bias {
            Bias::Bullish => (&snapshot.swing_lows, Side::Below, "swing low"),
            Bias::Bearish => (&snapshot.swing_highs, Side::Above, "swing high"),
            Bias::Neutral => return None,
        };

        nearest_swing(levels, entry, side, self.swing_lookback).map(|price| InvalidationLevel {
            price,
            basis: InvalidationBasis::SwingBreak,
            description: format!("Break of {} at {:.2}", label, price),
        })
    }

    fn moving_average_cross(&self, snapshot: &IndicatorSnapshot, entry: f64, bias: Bias) -> Option<InvalidationLevel> {
        let (side, verb) = match bias {
            Bias::Bullish => (Side::Below, "below"),
            Bias::Bearish => (Side::Above, "above"),
            Bias::Neutral => return None,
        };

        // Only the medium-term average counts
        let price = nearest_level([snapshot.sma_medium], entry, side)?;

        Some(InvalidationLevel {
            price,
            basis: InvalidationBasis::MovingAverageCross,
            description: format!("Close {} medium moving average at {:.2}", verb, price),
        })
    }

    fn support_resistance(&self, snapshot: &IndicatorSnapshot, entry: f64, bias: Bias) -> Option<InvalidationLevel> {
        let (side, label) = match bias {
            Bias::Bullish => (Side::Below, "support"),
            Bias::Bearish => (Side::Above, "resistance"),
            Bias::Neutral => return None,
        };

        nearest_cluster(
            &snapshot.bars,
            entry,
            side,
            self.lookback_bars,
            self.band_percent,
            self.min_touches,
        )
        .map(|cluster| InvalidationLevel {
            price: cluster.price,
            basis: InvalidationBasis::SupportResistance,
            description: format!(
                "Loss of {} cluster at {:.2} ({} touches)",
                label, cluster.price, cluster.touches
            ),
        })
    }
}

impl Default for StructureInvalidationDetector {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl InvalidationDetector for StructureInvalidationDetector {
    fn detect(&self, snapshot: &IndicatorSnapshot, entry_price: f64, bias: Bias) -> Option<InvalidationLevel> {
        let candidates = [
            self.swing_break(snapshot, entry_price, bias),
            self.moving_average_cross(snapshot, entry_price, bias),
            self.support_resistance(snapshot, entry_price, bias),
        ];

        let tolerance = 1e-9 * entry_price.abs().max(1.0);

        // Candidates are in priority order, so a later one must be strictly
        // nearer to displace an earlier one.
        candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<InvalidationLevel>, candidate| match best {
                Some(current)
                    if (entry_price - candidate.price).abs()
                        >= (entry_price - current.price).abs() - tolerance =>
                {
                    Some(current)
                }
                _ => Some(candidate),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::Bar;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    /// Flat bars whose lows/highs stay clear of any cluster
    fn quiet_bars(count: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let low = 60.0 + i as f64 * 2.0;
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: low + 0.5,
                    high: low + 1.0,
                    low,
                    close: low + 0.5,
                    volume: 500_000.0,
                    vwap: None,
                }
            })
            .collect()
    }

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            atr: 5.0,
            atr_percent: 2.0,
            adx: 30.0,
            current_price: 100.0,
            swing_highs: vec![],
            swing_lows: vec![],
            sma_short: 150.0,
            sma_medium: 160.0,
            bars: quiet_bars(20),
        }
    }

    #[test]
    fn test_swing_low_for_long() {
        let mut snap = snapshot();
        snap.swing_lows = vec![88.0, 93.0];
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::SwingBreak);
        assert_relative_eq!(level.price, 93.0);
        assert!(level.description.contains("swing low"));
    }

    #[test]
    fn test_swing_high_for_short() {
        let mut snap = snapshot();
        snap.sma_short = 50.0;
        snap.sma_medium = 40.0;
        snap.swing_highs = vec![104.0, 109.0];
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bearish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::SwingBreak);
        assert_relative_eq!(level.price, 104.0);
    }

    #[test]
    fn test_nearer_moving_average_beats_swing() {
        let mut snap = snapshot();
        snap.swing_lows = vec![90.0];
        snap.sma_medium = 94.0;
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::MovingAverageCross);
        assert_relative_eq!(level.price, 94.0);
        assert!(level.description.contains("medium moving average"));
    }

    #[test]
    fn test_short_average_is_ignored() {
        // Short average sits between entry and the medium one
        let mut snap = snapshot();
        snap.sma_short = 97.0;
        snap.sma_medium = 95.0;
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::MovingAverageCross);
        assert_relative_eq!(level.price, 95.0);

        // With the medium average on the wrong side nothing qualifies
        snap.sma_medium = 103.0;
        assert!(StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .is_none());
    }

    #[test]
    fn test_equidistant_prefers_swing_break() {
        let mut snap = snapshot();
        snap.swing_lows = vec![95.0];
        snap.sma_medium = 95.0;
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::SwingBreak);
    }

    #[test]
    fn test_equidistant_prefers_moving_average_over_cluster() {
        let mut snap = snapshot();
        snap.sma_medium = 95.0;
        let n = snap.bars.len();
        for bar in snap.bars[n - 3..].iter_mut() {
            bar.low = 95.0;
            bar.high = 99.0;
        }
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::MovingAverageCross);
    }

    #[test]
    fn test_support_cluster_when_nothing_else() {
        let mut snap = snapshot();
        let n = snap.bars.len();
        for (bar, low) in snap.bars[n - 3..].iter_mut().zip([96.0, 96.2, 95.9]) {
            bar.low = low;
            bar.high = 99.0;
        }
        let level = StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Bullish)
            .unwrap();

        assert_eq!(level.basis, InvalidationBasis::SupportResistance);
        assert_relative_eq!(level.price, (96.0 + 96.2 + 95.9) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_candidate_is_none() {
        // Averages above entry, no swings, bar lows spread 2.0 apart
        let level = StructureInvalidationDetector::default().detect(&snapshot(), 100.0, Bias::Bullish);
        assert!(level.is_none());
    }

    #[test]
    fn test_neutral_bias_has_no_invalidation() {
        let mut snap = snapshot();
        snap.swing_lows = vec![95.0];
        assert!(StructureInvalidationDetector::default()
            .detect(&snap, 100.0, Bias::Neutral)
            .is_none());
    }
}
