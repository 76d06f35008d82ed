use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Named threshold sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Default,
    Aggressive,
}

impl FromStr for RiskProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "default" | "balanced" => Ok(RiskProfile::Default),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => bail!("unknown risk profile '{}'", other),
        }
    }
}

/// Every threshold the qualification pipeline reads.
///
/// Passed to [`crate::RiskAssessor`] at construction; there is no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationConfig {
    // Volatility regime bounds (ATR % of price). MEDIUM is closed on both ends.
    pub low_volatility_atr_percent: f64,  // 1.5
    pub high_volatility_atr_percent: f64, // 3.0

    // Trend thresholds: below trending_adx no swing timeframe qualifies,
    // below min_trend_adx the trade is suppressed outright.
    pub trending_adx: f64,  // 25.0
    pub min_trend_adx: f64, // 20.0

    // Stop distance in ATR multiples per timeframe
    pub swing_atr_multiple: f64, // 2.0
    pub day_atr_multiple: f64,   // 1.5
    pub scalp_atr_multiple: f64, // 1.0
    pub min_stop_atr_multiple: f64, // 0.5
    pub max_stop_atr_multiple: f64, // 3.0

    // Reward to risk
    pub min_risk_reward: f64,       // 1.5
    pub preferred_risk_reward: f64, // 2.0

    // Suppression
    pub max_atr_percent: f64,    // 3.0
    pub max_conflict_ratio: f64, // 0.4

    // Structure scans
    pub min_price_bars: usize,             // 20
    pub invalidation_lookback_bars: usize, // 20
    pub swing_lookback: usize,             // 5 most recent swing levels
    pub cluster_band_percent: f64,         // 0.5% of entry
    pub min_cluster_touches: usize,        // 3

    // Vehicle selection
    pub min_option_move_percent: f64, // 3.0
    pub option_dte_min: u32,          // 30
    pub option_dte_max: u32,          // 45
    pub option_delta_min: f64,        // 0.40
    pub option_delta_max: f64,        // 0.60
    pub spread_width_atr: f64,        // 1.0

    pub max_trade_plans: usize, // 3
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            low_volatility_atr_percent: 1.5,
            high_volatility_atr_percent: 3.0,
            trending_adx: 25.0,
            min_trend_adx: 20.0,
            swing_atr_multiple: 2.0,
            day_atr_multiple: 1.5,
            scalp_atr_multiple: 1.0,
            min_stop_atr_multiple: 0.5,
            max_stop_atr_multiple: 3.0,
            min_risk_reward: 1.5,
            preferred_risk_reward: 2.0,
            max_atr_percent: 3.0,
            max_conflict_ratio: 0.4,
            min_price_bars: 20,
            invalidation_lookback_bars: 20,
            swing_lookback: 5,
            cluster_band_percent: 0.5,
            min_cluster_touches: 3,
            min_option_move_percent: 3.0,
            option_dte_min: 30,
            option_dte_max: 45,
            option_delta_min: 0.40,
            option_delta_max: 0.60,
            spread_width_atr: 1.0,
            max_trade_plans: 3,
        }
    }
}

impl QualificationConfig {
    /// Stricter gates: demands more reward, less noise and a firmer trend
    pub fn conservative() -> Self {
        Self {
            min_trend_adx: 22.0,
            max_stop_atr_multiple: 2.5,
            min_risk_reward: 2.0,
            preferred_risk_reward: 2.5,
            max_atr_percent: 2.5,
            max_conflict_ratio: 0.25,
            min_cluster_touches: 4,
            max_trade_plans: 2,
            ..Self::default()
        }
    }

    /// Looser gates for higher risk tolerance
    pub fn aggressive() -> Self {
        Self {
            min_trend_adx: 18.0,
            max_stop_atr_multiple: 3.5,
            min_risk_reward: 1.2,
            preferred_risk_reward: 1.8,
            max_atr_percent: 4.5,
            max_conflict_ratio: 0.5,
            min_option_move_percent: 2.0,
            ..Self::default()
        }
    }

    pub fn for_profile(profile: RiskProfile) -> Self {
        match profile {
            RiskProfile::Conservative => Self::conservative(),
            RiskProfile::Default => Self::default(),
            RiskProfile::Aggressive => Self::aggressive(),
        }
    }

    /// Load from the process environment (and `.env` when present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `RISK_PROFILE` picks the base
    /// profile; individual variables override single thresholds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match lookup("RISK_PROFILE") {
            Some(raw) => raw.parse::<RiskProfile>().context("Invalid RISK_PROFILE")?,
            None => RiskProfile::Default,
        };
        let mut config = Self::for_profile(profile);

        override_from(&lookup, "MIN_RISK_REWARD", &mut config.min_risk_reward)?;
        override_from(&lookup, "PREFERRED_RISK_REWARD", &mut config.preferred_risk_reward)?;
        override_from(&lookup, "MAX_ATR_PERCENT", &mut config.max_atr_percent)?;
        override_from(&lookup, "MAX_CONFLICT_RATIO", &mut config.max_conflict_ratio)?;
        override_from(&lookup, "MIN_TREND_ADX", &mut config.min_trend_adx)?;
        override_from(&lookup, "TRENDING_ADX", &mut config.trending_adx)?;
        override_from(&lookup, "MAX_TRADE_PLANS", &mut config.max_trade_plans)?;
        override_from(&lookup, "MIN_PRICE_BARS", &mut config.min_price_bars)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject threshold sets that would make the pipeline incoherent
    pub fn validate(&self) -> Result<()> {
        if !(self.low_volatility_atr_percent > 0.0
            && self.low_volatility_atr_percent <= self.high_volatility_atr_percent)
        {
            bail!("low_volatility_atr_percent must be > 0 and <= high_volatility_atr_percent");
        }
        if self.min_trend_adx < 0.0 || self.trending_adx < 0.0 {
            bail!("ADX thresholds must be non-negative");
        }
        for (name, multiple) in [
            ("swing_atr_multiple", self.swing_atr_multiple),
            ("day_atr_multiple", self.day_atr_multiple),
            ("scalp_atr_multiple", self.scalp_atr_multiple),
        ] {
            if !multiple.is_finite() || multiple < 0.0 {
                bail!("{} must be a non-negative number", name);
            }
        }
        if self.min_stop_atr_multiple < 0.0 || self.min_stop_atr_multiple > self.max_stop_atr_multiple {
            bail!("min_stop_atr_multiple must be >= 0 and <= max_stop_atr_multiple");
        }
        if self.min_risk_reward <= 0.0 {
            bail!("min_risk_reward must be positive");
        }
        if self.preferred_risk_reward < self.min_risk_reward {
            bail!("preferred_risk_reward must be >= min_risk_reward");
        }
        if !(0.0..=1.0).contains(&self.max_conflict_ratio) {
            bail!("max_conflict_ratio must be between 0 and 1");
        }
        if self.max_trade_plans == 0 || self.max_trade_plans > 3 {
            bail!("max_trade_plans must be between 1 and 3");
        }
        if self.min_price_bars == 0 || self.invalidation_lookback_bars == 0 {
            bail!("price window sizes must be positive");
        }
        if self.option_dte_min > self.option_dte_max {
            bail!("option_dte_min must be <= option_dte_max");
        }
        if !(0.0..=1.0).contains(&self.option_delta_min)
            || !(0.0..=1.0).contains(&self.option_delta_max)
            || self.option_delta_min > self.option_delta_max
        {
            bail!("option delta range must satisfy 0 <= min <= max <= 1");
        }
        if self.cluster_band_percent <= 0.0 || self.min_cluster_touches < 2 {
            bail!("cluster detection needs a positive band and at least 2 touches");
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}='{}'", key, raw))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_profiles_validate() {
        assert!(QualificationConfig::default().validate().is_ok());
        assert!(QualificationConfig::conservative().validate().is_ok());
        assert!(QualificationConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let config = QualificationConfig::default();
        assert_eq!(config.trending_adx, 25.0);
        assert_eq!(config.min_trend_adx, 20.0);
        assert_eq!(config.min_risk_reward, 1.5);
        assert_eq!(config.preferred_risk_reward, 2.0);
        assert_eq!(config.max_trade_plans, 3);
    }

    #[test]
    fn test_conservative_is_stricter() {
        let base = QualificationConfig::default();
        let strict = QualificationConfig::conservative();
        assert!(strict.min_risk_reward > base.min_risk_reward);
        assert!(strict.max_atr_percent < base.max_atr_percent);
        assert!(strict.max_conflict_ratio < base.max_conflict_ratio);
    }

    #[test]
    fn test_lookup_without_vars_is_default() {
        let config = QualificationConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, QualificationConfig::default());
    }

    #[test]
    fn test_lookup_profile_and_override() {
        let config = QualificationConfig::from_lookup(lookup_from(&[
            ("RISK_PROFILE", "Aggressive"),
            ("MAX_TRADE_PLANS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.max_atr_percent, 4.5);
        assert_eq!(config.max_trade_plans, 2);
    }

    #[test]
    fn test_lookup_parse_error_names_variable() {
        let err = QualificationConfig::from_lookup(lookup_from(&[("MIN_RISK_REWARD", "lots")]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("MIN_RISK_REWARD"));
    }

    #[test]
    fn test_lookup_rejects_unknown_profile() {
        assert!(QualificationConfig::from_lookup(lookup_from(&[("RISK_PROFILE", "yolo")])).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_reward_thresholds() {
        let config = QualificationConfig {
            min_risk_reward: 2.0,
            preferred_risk_reward: 1.5,
            ..QualificationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_plan_cap_above_three() {
        let config = QualificationConfig {
            max_trade_plans: 4,
            ..QualificationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
