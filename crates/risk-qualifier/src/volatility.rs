use crate::config::QualificationConfig;
use crate::error::{QualificationError, QualificationResult};
use crate::models::VolatilityRegime;
use crate::traits::VolatilityClassifier;

/// Threshold lookup on ATR as a percentage of price
#[derive(Debug, Clone)]
pub struct AtrVolatilityClassifier {
    low_below: f64,
    high_above: f64,
}

impl AtrVolatilityClassifier {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            low_below: config.low_volatility_atr_percent,
            high_above: config.high_volatility_atr_percent,
        }
    }
}

impl Default for AtrVolatilityClassifier {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl VolatilityClassifier for AtrVolatilityClassifier {
    fn classify(&self, atr_percent: f64) -> QualificationResult<VolatilityRegime> {
        if atr_percent.is_nan() || atr_percent < 0.0 {
            return Err(QualificationError::contract(
                "atr_percent",
                format!("must be a non-negative number, got {}", atr_percent),
            ));
        }

        Ok(match atr_percent {
            x if x < self.low_below => VolatilityRegime::Low,
            x if x <= self.high_above => VolatilityRegime::Medium,
            _ => VolatilityRegime::High,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_buckets() {
        let classifier = AtrVolatilityClassifier::default();
        assert_eq!(classifier.classify(0.0).unwrap(), VolatilityRegime::Low);
        assert_eq!(classifier.classify(1.2).unwrap(), VolatilityRegime::Low);
        assert_eq!(classifier.classify(2.0).unwrap(), VolatilityRegime::Medium);
        assert_eq!(classifier.classify(4.75).unwrap(), VolatilityRegime::High);
    }

    #[test]
    fn test_medium_is_closed_on_both_ends() {
        let classifier = AtrVolatilityClassifier::default();
        assert_eq!(classifier.classify(1.5).unwrap(), VolatilityRegime::Medium);
        assert_eq!(classifier.classify(3.0).unwrap(), VolatilityRegime::Medium);
        assert_eq!(classifier.classify(3.0000001).unwrap(), VolatilityRegime::High);
        assert_eq!(classifier.classify(1.4999999).unwrap(), VolatilityRegime::Low);
    }

    #[test]
    fn test_negative_and_nan_fail_loudly() {
        let classifier = AtrVolatilityClassifier::default();
        assert!(classifier.classify(-0.1).unwrap_err().is_contract_violation());
        assert!(classifier.classify(f64::NAN).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_infinite_is_high() {
        let classifier = AtrVolatilityClassifier::default();
        assert_eq!(classifier.classify(f64::INFINITY).unwrap(), VolatilityRegime::High);
    }
}
