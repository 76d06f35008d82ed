use analysis_core::{Bias, IndicatorProvider, IndicatorSnapshot, Signal};
use anyhow::Result;
use std::cmp::Ordering;

use crate::config::QualificationConfig;
use crate::contract::validate_request;
use crate::error::{QualificationError, QualificationResult};
use crate::invalidation::StructureInvalidationDetector;
use crate::models::*;
use crate::reward::StructuralRiskRewardCalculator;
use crate::signals::{attribute, resolve_bias};
use crate::stop::AtrStopCalculator;
use crate::suppression::{conflict_ratio, no_timeframe_reason, RuleBasedSuppressionEvaluator};
use crate::timeframe::RegimeTimeframeSelector;
use crate::traits::*;
use crate::vehicle::RegimeVehicleSelector;
use crate::volatility::AtrVolatilityClassifier;

/// Where an assessment is in the pipeline. Only `Pending -> Evaluating` and
/// transitions into a terminal outcome are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssessmentState {
    Pending,
    Evaluating,
    Done(AssessmentOutcome),
}

impl AssessmentState {
    fn advance(self, symbol: &str, next: AssessmentState) -> AssessmentState {
        tracing::debug!("{}: {:?} -> {:?}", symbol, self, next);
        next
    }
}

/// Runs the qualification pipeline for one instrument at a time.
///
/// Stateless between calls: the same inputs always produce the same
/// assessment, and a single assessor can be shared across threads.
pub struct RiskAssessor {
    config: QualificationConfig,
    volatility: Box<dyn VolatilityClassifier>,
    timeframe: Box<dyn TimeframeSelector>,
    stop: Box<dyn StopCalculator>,
    invalidation: Box<dyn InvalidationDetector>,
    reward: Box<dyn RiskRewardCalculator>,
    suppression: Box<dyn SuppressionEvaluator>,
    vehicle: Box<dyn VehicleSelector>,
}

impl RiskAssessor {
    /// Build an assessor with the default stage for every step
    pub fn new(config: QualificationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_stages_for(config))
    }

    pub fn from_env() -> Result<Self> {
        let config = QualificationConfig::from_env()?;
        tracing::info!(
            "Risk qualifier configured: min R:R {:.2}, max ATR {:.2}%, max {} plans",
            config.min_risk_reward,
            config.max_atr_percent,
            config.max_trade_plans
        );
        Self::new(config)
    }

    fn with_stages_for(config: QualificationConfig) -> Self {
        Self {
            volatility: Box::new(AtrVolatilityClassifier::new(&config)),
            timeframe: Box::new(RegimeTimeframeSelector::new(&config)),
            stop: Box::new(AtrStopCalculator::new(&config)),
            invalidation: Box::new(StructureInvalidationDetector::new(&config)),
            reward: Box::new(StructuralRiskRewardCalculator::new(&config)),
            suppression: Box::new(RuleBasedSuppressionEvaluator::new(&config)),
            vehicle: Box::new(RegimeVehicleSelector::new(&config)),
            config,
        }
    }

    pub fn config(&self) -> &QualificationConfig {
        &self.config
    }

    pub fn with_volatility_classifier(mut self, stage: impl VolatilityClassifier + 'static) -> Self {
        self.volatility = Box::new(stage);
        self
    }

    pub fn with_timeframe_selector(mut self, stage: impl TimeframeSelector + 'static) -> Self {
        self.timeframe = Box::new(stage);
        self
    }

    pub fn with_stop_calculator(mut self, stage: impl StopCalculator + 'static) -> Self {
        self.stop = Box::new(stage);
        self
    }

    pub fn with_invalidation_detector(mut self, stage: impl InvalidationDetector + 'static) -> Self {
        self.invalidation = Box::new(stage);
        self
    }

    pub fn with_risk_reward_calculator(mut self, stage: impl RiskRewardCalculator + 'static) -> Self {
        self.reward = Box::new(stage);
        self
    }

    pub fn with_suppression_evaluator(mut self, stage: impl SuppressionEvaluator + 'static) -> Self {
        self.suppression = Box::new(stage);
        self
    }

    pub fn with_vehicle_selector(mut self, stage: impl VehicleSelector + 'static) -> Self {
        self.vehicle = Box::new(stage);
        self
    }

    /// Qualify or suppress a trade on `symbol`.
    ///
    /// Returns `Err` only when the inputs break the contract; every valid
    /// input yields either at least one plan or at least one reason.
    pub fn assess(
        &self,
        symbol: &str,
        entry_price: f64,
        bias_hint: Option<Bias>,
        snapshot: &IndicatorSnapshot,
        signals: &[Signal],
    ) -> QualificationResult<RiskAssessment> {
        let result = self.run(symbol, entry_price, bias_hint, snapshot, signals);
        if let Err(e) = &result {
            tracing::warn!("Assessment of {} rejected: {}", symbol, e);
        }
        result
    }

    /// Fetch indicators for `symbol` and assess it. Entry defaults to the
    /// snapshot's current price.
    pub async fn assess_from_provider(
        &self,
        provider: &dyn IndicatorProvider,
        symbol: &str,
        lookback_days: i64,
        entry_price: Option<f64>,
        bias_hint: Option<Bias>,
    ) -> QualificationResult<RiskAssessment> {
        if provider.min_bars() < self.config.min_price_bars {
            tracing::warn!(
                "Provider guarantees {} bars but {} are required; short windows will be rejected",
                provider.min_bars(),
                self.config.min_price_bars
            );
        }

        let context = provider.fetch(symbol, lookback_days).await.map_err(|e| {
            tracing::warn!("Failed to fetch indicators for {}: {}", symbol, e);
            QualificationError::from(e)
        })?;
        let entry = entry_price.unwrap_or(context.snapshot.current_price);

        self.assess(symbol, entry, bias_hint, &context.snapshot, &context.signals)
    }

    fn run(
        &self,
        symbol: &str,
        entry_price: f64,
        bias_hint: Option<Bias>,
        snapshot: &IndicatorSnapshot,
        signals: &[Signal],
    ) -> QualificationResult<RiskAssessment> {
        let state = AssessmentState::Pending;
        validate_request(symbol, entry_price, snapshot, signals, self.config.min_price_bars)?;

        let timestamp = snapshot
            .as_of()
            .ok_or_else(|| QualificationError::contract("snapshot.bars", "price window is empty"))?;

        let regime = self.volatility.classify(snapshot.atr_percent)?;
        let bias = resolve_bias(bias_hint, signals, snapshot);
        let timeframe = self.timeframe.select(regime, snapshot.adx);

        tracing::debug!(
            "{}: regime {} (ATR {:.2}%), ADX {:.1}, bias {}, timeframe {}",
            symbol,
            regime.as_str(),
            snapshot.atr_percent,
            snapshot.adx,
            bias.as_str(),
            timeframe.as_str()
        );

        let mut trace = AssessmentTrace {
            regime,
            timeframe,
            bias,
            stop: None,
            invalidation: None,
            target: None,
            risk_reward: None,
            conflict_ratio: None,
        };

        if timeframe == Timeframe::None {
            state.advance(symbol, AssessmentState::Done(AssessmentOutcome::TimeframeNone));
            let assessment = RiskAssessment {
                symbol: symbol.to_string(),
                timestamp,
                outcome: AssessmentOutcome::TimeframeNone,
                trade_plans: Vec::new(),
                suppression_reasons: vec![no_timeframe_reason(snapshot.adx, self.config.trending_adx)],
                trace,
            };
            tracing::info!("{}", assessment.summary());
            return Ok(assessment);
        }

        let state = state.advance(symbol, AssessmentState::Evaluating);

        let stop = self
            .stop
            .calculate(snapshot.atr, timeframe, entry_price, bias)
            .ok_or_else(|| {
                QualificationError::contract("timeframe", format!("no stop multiple for {}", timeframe.as_str()))
            })?;
        let invalidation = self.invalidation.detect(snapshot, entry_price, bias);
        let targets = self.reward.targets(snapshot, entry_price, &stop, bias);
        let primary = targets.first().cloned().ok_or_else(|| {
            QualificationError::contract("bias", format!("no target can be derived for {} bias", bias.as_str()))
        })?;
        let risk_reward = self.reward.evaluate(&stop, &primary);

        trace.stop = Some(stop.clone());
        trace.invalidation = invalidation.clone();
        trace.target = Some(primary.clone());
        trace.risk_reward = Some(risk_reward.clone());
        trace.conflict_ratio = Some(conflict_ratio(signals));

        let mut reasons = self.suppression.evaluate(&SuppressionInput {
            snapshot,
            regime,
            stop: &stop,
            risk_reward: &risk_reward,
            invalidation: invalidation.as_ref(),
            signals,
        });

        let mut trade_plans = Vec::new();
        if reasons.is_empty() {
            trade_plans = self.build_plans(
                timeframe,
                regime,
                bias,
                entry_price,
                snapshot,
                &stop,
                invalidation.as_ref(),
                &targets,
                signals,
            );
            // A swapped-in evaluator may pass an unfavorable primary target;
            // with nothing tradeable the verdict must still carry a reason.
            if trade_plans.is_empty() {
                reasons.push(SuppressionReason {
                    code: SuppressionCode::RrUnfavorable,
                    message: format!(
                        "No target reaches minimum reward/risk {:.2}",
                        self.config.min_risk_reward
                    ),
                    observed_value: risk_reward.ratio,
                    threshold_value: self.config.min_risk_reward,
                });
            }
        }

        let outcome = if trade_plans.is_empty() {
            AssessmentOutcome::Suppressed
        } else {
            AssessmentOutcome::Qualified
        };
        state.advance(symbol, AssessmentState::Done(outcome));

        let assessment = RiskAssessment {
            symbol: symbol.to_string(),
            timestamp,
            outcome,
            trade_plans,
            suppression_reasons: reasons,
            trace,
        };
        tracing::info!("{}", assessment.summary());
        Ok(assessment)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_plans(
        &self,
        timeframe: Timeframe,
        regime: VolatilityRegime,
        bias: Bias,
        entry_price: f64,
        snapshot: &IndicatorSnapshot,
        stop: &StopLevel,
        invalidation: Option<&InvalidationLevel>,
        targets: &[TargetLevel],
        signals: &[Signal],
    ) -> Vec<TradePlan> {
        let Some((primary_signal, supporting_signals)) = attribute(signals, bias) else {
            return Vec::new();
        };

        let mut plans: Vec<TradePlan> = targets
            .iter()
            .filter_map(|target| {
                let risk_reward = self.reward.evaluate(stop, target);
                if !risk_reward.is_favorable {
                    return None;
                }
                let vehicle = self.vehicle.select(&VehicleInput {
                    timeframe,
                    regime,
                    bias,
                    atr: snapshot.atr,
                    entry_price,
                    target,
                    risk_reward: &risk_reward,
                });
                Some(TradePlan {
                    timeframe,
                    bias,
                    entry_price,
                    stop: stop.clone(),
                    target: target.clone(),
                    invalidation: invalidation.cloned(),
                    risk_reward,
                    vehicle,
                    primary_signal: primary_signal.clone(),
                    supporting_signals: supporting_signals.clone(),
                })
            })
            .collect();

        // Best ratio first. Every plan shares one stop and one bias, so equal
        // ratios mean equal reward distance; the stable sort keeps target order.
        plans.sort_by(|a, b| {
            b.risk_reward
                .ratio
                .partial_cmp(&a.risk_reward.ratio)
                .unwrap_or(Ordering::Equal)
        });
        plans.truncate(self.config.max_trade_plans);
        plans
    }
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::with_stages_for(QualificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTimeframe(Timeframe);

    impl TimeframeSelector for FixedTimeframe {
        fn select(&self, _regime: VolatilityRegime, _adx: f64) -> Timeframe {
            self.0
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = QualificationConfig {
            max_trade_plans: 0,
            ..Default::default()
        };
        assert!(RiskAssessor::new(config).is_err());
    }

    #[test]
    fn test_builder_swaps_stage() {
        let assessor = RiskAssessor::default().with_timeframe_selector(FixedTimeframe(Timeframe::None));
        assert_eq!(assessor.timeframe.select(VolatilityRegime::High, 50.0), Timeframe::None);
    }

    #[test]
    fn test_state_advance_returns_next() {
        let next = AssessmentState::Pending.advance("TEST", AssessmentState::Evaluating);
        assert_eq!(next, AssessmentState::Evaluating);
    }
}
