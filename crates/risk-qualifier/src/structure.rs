//! Price-structure scans shared by invalidation and target detection.

use analysis_core::Bar;

/// Which side of the entry price a level must sit on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

impl Side {
    fn contains(&self, level: f64, entry: f64) -> bool {
        match self {
            Side::Below => level < entry,
            Side::Above => level > entry,
        }
    }
}

/// Horizontal level formed by repeated touches
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCluster {
    pub price: f64,
    pub touches: usize,
}

/// Nearest of the `lookback` most recent swing levels on `side` of entry.
pub fn nearest_swing(levels: &[f64], entry: f64, side: Side, lookback: usize) -> Option<f64> {
    let start = levels.len().saturating_sub(lookback);
    nearest_level(levels[start..].iter().copied(), entry, side)
}

/// Nearest level on `side` of entry from any iterator of prices.
pub fn nearest_level<I>(levels: I, entry: f64, side: Side) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    levels
        .into_iter()
        .filter(|level| side.contains(*level, entry))
        .min_by(|a, b| {
            (entry - a)
                .abs()
                .partial_cmp(&(entry - b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Nearest horizontal cluster in the trailing `lookback` bars.
///
/// Lows form support (below entry) and highs form resistance (above entry).
/// A cluster needs `min_touches` extremes within `band_percent` of entry of
/// each other; its price is the mean of the touching extremes.
pub fn nearest_cluster(
    bars: &[Bar],
    entry: f64,
    side: Side,
    lookback: usize,
    band_percent: f64,
    min_touches: usize,
) -> Option<PriceCluster> {
    let start = bars.len().saturating_sub(lookback);
    let extremes: Vec<f64> = bars[start..]
        .iter()
        .map(|bar| match side {
            Side::Below => bar.low,
            Side::Above => bar.high,
        })
        .filter(|price| side.contains(*price, entry))
        .collect();

    if extremes.len() < min_touches {
        return None;
    }

    let band = entry.abs() * band_percent / 100.0;

    // Nearest anchors first
    let mut anchors = extremes.clone();
    anchors.sort_by(|a, b| {
        (entry - a)
            .abs()
            .partial_cmp(&(entry - b).abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for anchor in anchors {
        let members: Vec<f64> = extremes
            .iter()
            .copied()
            .filter(|price| (price - anchor).abs() <= band)
            .collect();

        if members.len() >= min_touches {
            let price = members.iter().sum::<f64>() / members.len() as f64;
            return Some(PriceCluster {
                price,
                touches: members.len(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from(lows_highs: &[(f64, f64)]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        lows_highs
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| Bar {
                timestamp: start + Duration::days(i as i64),
                open: (low + high) / 2.0,
                high,
                low,
                close: (low + high) / 2.0,
                volume: 1_000_000.0,
                vwap: None,
            })
            .collect()
    }

    #[test]
    fn test_nearest_swing_respects_side_and_lookback() {
        let lows = [80.0, 96.0, 92.0, 94.0, 101.0];
        assert_eq!(nearest_swing(&lows, 100.0, Side::Below, 5), Some(96.0));
        // Only the three most recent levels: 92, 94, 101
        assert_eq!(nearest_swing(&lows, 100.0, Side::Below, 3), Some(94.0));
        assert_eq!(nearest_swing(&lows, 100.0, Side::Above, 5), Some(101.0));
        assert_eq!(nearest_swing(&[], 100.0, Side::Below, 5), None);
    }

    #[test]
    fn test_cluster_found_from_repeated_lows() {
        let bars = bars_from(&[
            (95.0, 99.0),
            (95.2, 99.5),
            (97.0, 99.8),
            (94.9, 98.0),
            (96.5, 99.0),
        ]);
        let cluster = nearest_cluster(&bars, 100.0, Side::Below, 20, 0.5, 3).unwrap();
        assert_eq!(cluster.touches, 3);
        assert_relative_eq!(cluster.price, (95.0 + 95.2 + 94.9) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cluster_needs_enough_touches() {
        let bars = bars_from(&[(95.0, 99.0), (97.0, 99.5), (92.0, 99.8)]);
        assert!(nearest_cluster(&bars, 100.0, Side::Below, 20, 0.5, 3).is_none());
    }

    #[test]
    fn test_cluster_resistance_above_entry() {
        let bars = bars_from(&[
            (95.0, 104.0),
            (96.0, 104.3),
            (97.0, 104.1),
            (96.5, 99.0),
        ]);
        let cluster = nearest_cluster(&bars, 100.0, Side::Above, 20, 0.5, 3).unwrap();
        assert_relative_eq!(cluster.price, (104.0 + 104.3 + 104.1) / 3.0, epsilon = 1e-9);
    }
}
