use analysis_core::Bias;

use crate::config::QualificationConfig;
use crate::models::{OptionEnvelope, Timeframe, Vehicle, VehicleKind, VolatilityRegime};
use crate::traits::{VehicleInput, VehicleSelector};

/// Stock by default; options only when the expected move pays for them.
///
/// High volatility prefers a defined-risk spread over naked premium, any
/// other swing trade gets a single-leg call or put.
#[derive(Debug, Clone)]
pub struct RegimeVehicleSelector {
    min_move_percent: f64,
    dte_min: u32,
    dte_max: u32,
    delta_min: f64,
    delta_max: f64,
    spread_width_atr: f64,
}

impl RegimeVehicleSelector {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            min_move_percent: config.min_option_move_percent,
            dte_min: config.option_dte_min,
            dte_max: config.option_dte_max,
            delta_min: config.option_delta_min,
            delta_max: config.option_delta_max,
            spread_width_atr: config.spread_width_atr,
        }
    }

    fn envelope(&self, bias: Bias) -> OptionEnvelope {
        let (delta_min, delta_max) = match bias {
            Bias::Bearish => (-self.delta_max, -self.delta_min),
            _ => (self.delta_min, self.delta_max),
        };
        OptionEnvelope {
            dte_min: self.dte_min,
            dte_max: self.dte_max,
            delta_min,
            delta_max,
        }
    }
}

impl Default for RegimeVehicleSelector {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}

impl VehicleSelector for RegimeVehicleSelector {
    fn select(&self, input: &VehicleInput<'_>) -> Vehicle {
        if !input.bias.is_directional() || input.expected_move_percent() < self.min_move_percent {
            return Vehicle::stock();
        }

        if input.regime == VolatilityRegime::High {
            return Vehicle {
                kind: VehicleKind::OptionSpread,
                envelope: Some(self.envelope(input.bias)),
                spread_width: Some(self.spread_width_atr * input.atr),
            };
        }

        if input.timeframe != Timeframe::Swing {
            return Vehicle::stock();
        }

        let kind = match input.bias {
            Bias::Bearish => VehicleKind::OptionPut,
            _ => VehicleKind::OptionCall,
        };

        Vehicle {
            kind,
            envelope: Some(self.envelope(input.bias)),
            spread_width: None,
        }
    }
}
