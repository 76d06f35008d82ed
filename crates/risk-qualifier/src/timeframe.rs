use crate::config::QualificationConfig;
use crate::models::{Timeframe, VolatilityRegime};
use crate::traits::TimeframeSelector;

/// Decision table over regime and ADX; first match wins
#[derive(Debug, Clone)]
pub struct RegimeTimeframeSelector {
    trending_adx: f64,
}

impl RegimeTimeframeSelector {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            trending_adx: config.trending_adx,
        }
    }
}

impl Default for RegimeTimeframeSelector {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl TimeframeSelector for RegimeTimeframeSelector {
    fn select(&self, regime: VolatilityRegime, adx: f64) -> Timeframe {
        let trending = adx >= self.trending_adx;

        match regime {
            VolatilityRegime::Low | VolatilityRegime::Medium if trending => Timeframe::Swing,
            VolatilityRegime::Medium => Timeframe::Day,
            VolatilityRegime::High => Timeframe::Scalp,
            // Quiet and trendless: nothing to ride and nothing to scalp
            VolatilityRegime::Low => Timeframe::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_low_and_medium_are_swing() {
        let selector = RegimeTimeframeSelector::default();
        assert_eq!(selector.select(VolatilityRegime::Low, 25.0), Timeframe::Swing);
        assert_eq!(selector.select(VolatilityRegime::Medium, 30.0), Timeframe::Swing);
    }

    #[test]
    fn test_trendless_medium_is_day() {
        let selector = RegimeTimeframeSelector::default();
        assert_eq!(selector.select(VolatilityRegime::Medium, 24.9), Timeframe::Day);
        assert_eq!(selector.select(VolatilityRegime::Medium, 5.0), Timeframe::Day);
    }

    #[test]
    fn test_high_volatility_is_scalp_regardless_of_trend() {
        let selector = RegimeTimeframeSelector::default();
        assert_eq!(selector.select(VolatilityRegime::High, 43.9), Timeframe::Scalp);
        assert_eq!(selector.select(VolatilityRegime::High, 10.0), Timeframe::Scalp);
    }

    #[test]
    fn test_trendless_low_has_no_timeframe() {
        let selector = RegimeTimeframeSelector::default();
        assert_eq!(selector.select(VolatilityRegime::Low, 18.5), Timeframe::None);
    }

    #[test]
    fn test_custom_trending_threshold() {
        let config = QualificationConfig {
            trending_adx: 30.0,
            ..QualificationConfig::default()
        };
        let selector = RegimeTimeframeSelector::new(&config);
        assert_eq!(selector.select(VolatilityRegime::Medium, 28.0), Timeframe::Day);
    }
}
