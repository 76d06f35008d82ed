use analysis_core::Signal;

use crate::config::QualificationConfig;
use crate::models::{SuppressionCode, SuppressionReason};
use crate::traits::{SuppressionEvaluator, SuppressionInput};

type Rule = fn(&RuleBasedSuppressionEvaluator, &SuppressionInput<'_>) -> Option<SuppressionReason>;

/// Fixed battery of independent checks.
///
/// Every rule runs on every call so callers see the complete list of
/// problems. `NO_CLEAR_INVALIDATION` is soft: it is reported only alongside
/// at least one other fired rule and never vetoes a trade on its own.
#[derive(Debug, Clone)]
pub struct RuleBasedSuppressionEvaluator {
    min_stop_multiple: f64,
    max_stop_multiple: f64,
    min_risk_reward: f64,
    max_atr_percent: f64,
    min_trend_adx: f64,
    max_conflict_ratio: f64,
}

impl RuleBasedSuppressionEvaluator {
    const BATTERY: [Rule; 7] = [
        Self::stop_too_wide,
        Self::stop_too_tight,
        Self::rr_unfavorable,
        Self::no_clear_invalidation,
        Self::volatility_too_high,
        Self::no_trend,
        Self::conflicting_signals,
    ];

    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            min_stop_multiple: config.min_stop_atr_multiple,
            max_stop_multiple: config.max_stop_atr_multiple,
            min_risk_reward: config.min_risk_reward,
            max_atr_percent: config.max_atr_percent,
            min_trend_adx: config.min_trend_adx,
            max_conflict_ratio: config.max_conflict_ratio,
        }
    }

    fn stop_too_wide(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let multiple = input.stop.distance_in_atr_multiples;
        (multiple > self.max_stop_multiple).then(|| SuppressionReason {
            code: SuppressionCode::StopTooWide,
            message: format!(
                "Stop {:.2}x ATR away exceeds maximum {:.2}x",
                multiple, self.max_stop_multiple
            ),
            observed_value: multiple,
            threshold_value: self.max_stop_multiple,
        })
    }

    fn stop_too_tight(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let multiple = input.stop.distance_in_atr_multiples;
        (multiple < self.min_stop_multiple).then(|| SuppressionReason {
            code: SuppressionCode::StopTooTight,
            message: format!(
                "Stop {:.2}x ATR away is inside minimum {:.2}x",
                multiple, self.min_stop_multiple
            ),
            observed_value: multiple,
            threshold_value: self.min_stop_multiple,
        })
    }

    fn rr_unfavorable(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let ratio = input.risk_reward.ratio;
        (ratio < self.min_risk_reward).then(|| SuppressionReason {
            code: SuppressionCode::RrUnfavorable,
            message: format!(
                "Reward/risk {:.2} below minimum {:.2}",
                ratio, self.min_risk_reward
            ),
            observed_value: ratio,
            threshold_value: self.min_risk_reward,
        })
    }

    fn no_clear_invalidation(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        input.invalidation.is_none().then(|| SuppressionReason {
            code: SuppressionCode::NoClearInvalidation,
            message: "No swing, moving-average or support/resistance level defines where the thesis fails"
                .to_string(),
            observed_value: 0.0,
            threshold_value: 1.0,
        })
    }

    fn volatility_too_high(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let atr_percent = input.snapshot.atr_percent;
        (atr_percent > self.max_atr_percent).then(|| SuppressionReason {
            code: SuppressionCode::VolatilityTooHigh,
            message: format!(
                "ATR {:.2}% of price exceeds {:.2}% ({} volatility)",
                atr_percent,
                self.max_atr_percent,
                input.regime.as_str()
            ),
            observed_value: atr_percent,
            threshold_value: self.max_atr_percent,
        })
    }

    fn no_trend(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let adx = input.snapshot.adx;
        (adx < self.min_trend_adx).then(|| SuppressionReason {
            code: SuppressionCode::NoTrend,
            message: format!("ADX {:.1} below trend threshold {:.1}", adx, self.min_trend_adx),
            observed_value: adx,
            threshold_value: self.min_trend_adx,
        })
    }

    fn conflicting_signals(&self, input: &SuppressionInput<'_>) -> Option<SuppressionReason> {
        let ratio = conflict_ratio(input.signals);
        (ratio > self.max_conflict_ratio).then(|| SuppressionReason {
            code: SuppressionCode::ConflictingSignals,
            message: format!(
                "{:.0}% of directional signals disagree (max {:.0}%)",
                ratio * 100.0,
                self.max_conflict_ratio * 100.0
            ),
            observed_value: ratio,
            threshold_value: self.max_conflict_ratio,
        })
    }
}

impl Default for RuleBasedSuppressionEvaluator {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl SuppressionEvaluator for RuleBasedSuppressionEvaluator {
    fn evaluate(&self, input: &SuppressionInput<'_>) -> Vec<SuppressionReason> {
        let fired: Vec<SuppressionReason> = Self::BATTERY
            .iter()
            .filter_map(|rule| rule(self, input))
            .collect();

        let has_hard_reason = fired
            .iter()
            .any(|reason| reason.code != SuppressionCode::NoClearInvalidation);

        if has_hard_reason {
            fired
        } else {
            Vec::new()
        }
    }
}

/// `min(bullish, bearish) / directional` over the signal list; 0 when no
/// signal takes a side.
pub fn conflict_ratio(signals: &[Signal]) -> f64 {
    let bullish = signals.iter().filter(|s| s.direction.is_bullish()).count();
    let bearish = signals.iter().filter(|s| s.direction.is_bearish()).count();
    let directional = bullish + bearish;

    if directional == 0 {
        return 0.0;
    }
    bullish.min(bearish) as f64 / directional as f64
}

/// The single reason reported when no timeframe qualifies
pub fn no_timeframe_reason(adx: f64, trending_adx: f64) -> SuppressionReason {
    SuppressionReason {
        code: SuppressionCode::NoTrend,
        message: format!(
            "No timeframe qualifies: low volatility with ADX {:.1} below trending threshold {:.1}",
            adx, trending_adx
        ),
        observed_value: adx,
        threshold_value: trending_adx,
    }
}
