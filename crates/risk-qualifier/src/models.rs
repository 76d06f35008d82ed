use analysis_core::{Bias, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRegime {
    Low,
    Medium,
    High,
}

impl VolatilityRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityRegime::Low => "LOW",
            VolatilityRegime::Medium => "MEDIUM",
            VolatilityRegime::High => "HIGH",
        }
    }
}

/// Holding horizon for a trade. `None` means no timeframe qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timeframe {
    Swing,
    Day,
    Scalp,
    None,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Swing => "SWING",
            Timeframe::Day => "DAY",
            Timeframe::Scalp => "SCALP",
            Timeframe::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLevel {
    pub price: f64,
    pub distance_from_entry: f64,
    pub distance_in_atr_multiples: f64,
    pub is_within_bounds: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationBasis {
    // Declaration order is tie-break priority: most structurally significant first.
    SwingBreak,
    MovingAverageCross,
    SupportResistance,
}

impl InvalidationBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationBasis::SwingBreak => "swing_break",
            InvalidationBasis::MovingAverageCross => "moving_average_cross",
            InvalidationBasis::SupportResistance => "support_resistance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidationLevel {
    pub price: f64,
    pub basis: InvalidationBasis,
    pub description: String,
}

/// Where a target price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    SwingLevel,
    PriceCluster,
    Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLevel {
    pub price: f64,
    pub distance_from_entry: f64,
    pub source: TargetSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub ratio: f64,
    /// Ratio meets the configured minimum
    pub is_favorable: bool,
    /// Ratio meets the stricter preferred threshold (ranking only)
    pub is_preferred: bool,
}

/// Machine-readable suppression codes, listed in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuppressionCode {
    StopTooWide,
    StopTooTight,
    RrUnfavorable,
    NoClearInvalidation,
    VolatilityTooHigh,
    NoTrend,
    ConflictingSignals,
}

impl SuppressionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionCode::StopTooWide => "STOP_TOO_WIDE",
            SuppressionCode::StopTooTight => "STOP_TOO_TIGHT",
            SuppressionCode::RrUnfavorable => "RR_UNFAVORABLE",
            SuppressionCode::NoClearInvalidation => "NO_CLEAR_INVALIDATION",
            SuppressionCode::VolatilityTooHigh => "VOLATILITY_TOO_HIGH",
            SuppressionCode::NoTrend => "NO_TREND",
            SuppressionCode::ConflictingSignals => "CONFLICTING_SIGNALS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionReason {
    pub code: SuppressionCode,
    pub message: String,
    /// Exact input value that tripped the rule
    pub observed_value: f64,
    pub threshold_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleKind {
    Stock,
    OptionCall,
    OptionPut,
    OptionSpread,
}

impl VehicleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Stock => "STOCK",
            VehicleKind::OptionCall => "OPTION_CALL",
            VehicleKind::OptionPut => "OPTION_PUT",
            VehicleKind::OptionSpread => "OPTION_SPREAD",
        }
    }
}

/// Contract selection window for option vehicles. Put deltas are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEnvelope {
    pub dte_min: u32,
    pub dte_max: u32,
    pub delta_min: f64,
    pub delta_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub kind: VehicleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<OptionEnvelope>,
    /// Strike distance between spread legs, in price units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread_width: Option<f64>,
}

impl Vehicle {
    pub fn stock() -> Self {
        Self {
            kind: VehicleKind::Stock,
            envelope: None,
            spread_width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub timeframe: Timeframe,
    pub bias: Bias,
    pub entry_price: f64,
    pub stop: StopLevel,
    pub target: TargetLevel,
    pub invalidation: Option<InvalidationLevel>,
    pub risk_reward: RiskReward,
    pub vehicle: Vehicle,
    pub primary_signal: Signal,
    pub supporting_signals: Vec<Signal>,
}

/// Terminal state of an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentOutcome {
    TimeframeNone,
    Suppressed,
    Qualified,
}

/// Intermediate stage outputs, kept for explainability. Stages that did not
/// run are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentTrace {
    pub regime: VolatilityRegime,
    pub timeframe: Timeframe,
    pub bias: Bias,
    pub stop: Option<StopLevel>,
    pub invalidation: Option<InvalidationLevel>,
    pub target: Option<TargetLevel>,
    pub risk_reward: Option<RiskReward>,
    pub conflict_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub symbol: String,
    /// As-of time of the newest bar in the input window
    pub timestamp: DateTime<Utc>,
    pub outcome: AssessmentOutcome,
    pub trade_plans: Vec<TradePlan>,
    pub suppression_reasons: Vec<SuppressionReason>,
    pub trace: AssessmentTrace,
}

impl RiskAssessment {
    pub fn is_qualified(&self) -> bool {
        self.outcome == AssessmentOutcome::Qualified
    }

    pub fn codes(&self) -> Vec<SuppressionCode> {
        self.suppression_reasons.iter().map(|r| r.code).collect()
    }

    pub fn best_plan(&self) -> Option<&TradePlan> {
        self.trade_plans.first()
    }

    /// One-line human readable verdict
    pub fn summary(&self) -> String {
        match self.best_plan() {
            Some(plan) => format!(
                "{} {} {} via {}: entry {:.2}, stop {:.2}, target {:.2}, R:R {:.2} ({} plan{})",
                self.symbol,
                plan.timeframe.as_str(),
                plan.bias.as_str(),
                plan.vehicle.kind.as_str(),
                plan.entry_price,
                plan.stop.price,
                plan.target.price,
                plan.risk_reward.ratio,
                self.trade_plans.len(),
                if self.trade_plans.len() == 1 { "" } else { "s" },
            ),
            None => {
                let codes: Vec<&str> = self.suppression_reasons.iter().map(|r| r.code.as_str()).collect();
                format!("{} suppressed: {}", self.symbol, codes.join(", "))
            }
        }
    }
}
