//! Stage seams of the qualification pipeline.
//!
//! Each stage has one default implementation in its own module. Swap a stage
//! by handing a different implementation to the matching
//! `RiskAssessor::with_*` builder; stages must stay pure so assessments remain
//! deterministic and shareable across threads.

use analysis_core::{Bias, IndicatorSnapshot, Signal};

use crate::error::QualificationResult;
use crate::models::*;

/// Buckets ATR% into a volatility regime
pub trait VolatilityClassifier: Send + Sync {
    /// Negative or NaN input is a contract violation, never clamped.
    fn classify(&self, atr_percent: f64) -> QualificationResult<VolatilityRegime>;
}

/// Picks one holding timeframe from regime and trend strength
pub trait TimeframeSelector: Send + Sync {
    fn select(&self, regime: VolatilityRegime, adx: f64) -> Timeframe;
}

/// Sizes the protective stop
pub trait StopCalculator: Send + Sync {
    /// Returns `None` only for [`Timeframe::None`].
    fn calculate(&self, atr: f64, timeframe: Timeframe, entry_price: f64, bias: Bias) -> Option<StopLevel>;
}

/// Finds the nearest structural level whose breach disproves the thesis
pub trait InvalidationDetector: Send + Sync {
    fn detect(&self, snapshot: &IndicatorSnapshot, entry_price: f64, bias: Bias) -> Option<InvalidationLevel>;
}

/// Derives targets and scores reward against risk
pub trait RiskRewardCalculator: Send + Sync {
    /// Candidate targets, primary first. Never empty for a directional bias.
    fn targets(
        &self,
        snapshot: &IndicatorSnapshot,
        entry_price: f64,
        stop: &StopLevel,
        bias: Bias,
    ) -> Vec<TargetLevel>;

    fn evaluate(&self, stop: &StopLevel, target: &TargetLevel) -> RiskReward;
}

/// Everything the suppression battery looks at
#[derive(Debug, Clone, Copy)]
pub struct SuppressionInput<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    pub regime: VolatilityRegime,
    pub stop: &'a StopLevel,
    pub risk_reward: &'a RiskReward,
    pub invalidation: Option<&'a InvalidationLevel>,
    pub signals: &'a [Signal],
}

/// Collects every violated rule, in a fixed order
pub trait SuppressionEvaluator: Send + Sync {
    fn evaluate(&self, input: &SuppressionInput<'_>) -> Vec<SuppressionReason>;
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleInput<'a> {
    pub timeframe: Timeframe,
    pub regime: VolatilityRegime,
    pub bias: Bias,
    pub atr: f64,
    pub entry_price: f64,
    pub target: &'a TargetLevel,
    pub risk_reward: &'a RiskReward,
}

impl VehicleInput<'_> {
    /// Reward distance as a percentage of entry
    pub fn expected_move_percent(&self) -> f64 {
        if self.entry_price > 0.0 {
            self.target.distance_from_entry * 100.0 / self.entry_price
        } else {
            0.0
        }
    }
}

/// Chooses the instrument used to express a qualified plan
pub trait VehicleSelector: Send + Sync {
    fn select(&self, input: &VehicleInput<'_>) -> Vehicle;
}
