use analysis_core::Bias;

use crate::config::QualificationConfig;
use crate::models::{StopLevel, Timeframe};
use crate::traits::StopCalculator;

/// ATR-multiple stop with hard bounds.
///
/// Out-of-bounds stops are still returned (flagged) so the suppression
/// message can report the exact distance.
#[derive(Debug, Clone)]
pub struct AtrStopCalculator {
    swing_multiple: f64,
    day_multiple: f64,
    scalp_multiple: f64,
    min_multiple: f64,
    max_multiple: f64,
}

impl AtrStopCalculator {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            swing_multiple: config.swing_atr_multiple,
            day_multiple: config.day_atr_multiple,
            scalp_multiple: config.scalp_atr_multiple,
            min_multiple: config.min_stop_atr_multiple,
            max_multiple: config.max_stop_atr_multiple,
        }
    }

    pub fn multiple_for(&self, timeframe: Timeframe) -> Option<f64> {
        match timeframe {
            Timeframe::Swing => Some(self.swing_multiple),
            Timeframe::Day => Some(self.day_multiple),
            Timeframe::Scalp => Some(self.scalp_multiple),
            Timeframe::None => None,
        }
    }
}

impl Default for AtrStopCalculator {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl StopCalculator for AtrStopCalculator {
    fn calculate(&self, atr: f64, timeframe: Timeframe, entry_price: f64, bias: Bias) -> Option<StopLevel> {
        let multiple = self.multiple_for(timeframe)?;
        let distance = multiple * atr;

        // Zero ATR leaves nothing to size against: report a zero multiple so
        // the tight-stop rule fires instead of dividing by zero downstream.
        let distance_in_atr = if atr > 0.0 { multiple } else { 0.0 };

        // Neutral never reaches here from the assessor; long geometry is the fallback.
        let price = match bias {
            Bias::Bearish => entry_price + distance,
            Bias::Bullish | Bias::Neutral => entry_price - distance,
        };

        Some(StopLevel {
            price,
            distance_from_entry: distance,
            distance_in_atr_multiples: distance_in_atr,
            is_within_bounds: distance_in_atr >= self.min_multiple && distance_in_atr <= self.max_multiple,
        })
    }
}
