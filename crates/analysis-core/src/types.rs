use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// Directional strength attached to a detected signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl SignalDirection {
    pub fn is_bullish(&self) -> bool {
        matches!(self, SignalDirection::StrongBullish | SignalDirection::Bullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, SignalDirection::StrongBearish | SignalDirection::Bearish)
    }

    /// Signed vote used when netting signals into a bias: strong signals count double.
    pub fn weight(&self) -> i32 {
        match self {
            SignalDirection::StrongBullish => 2,
            SignalDirection::Bullish => 1,
            SignalDirection::Neutral => 0,
            SignalDirection::Bearish => -1,
            SignalDirection::StrongBearish => -2,
        }
    }

    /// The trade bias this direction argues for
    pub fn bias(&self) -> Bias {
        if self.is_bullish() {
            Bias::Bullish
        } else if self.is_bearish() {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::StrongBullish => "strong_bullish",
            SignalDirection::Bullish => "bullish",
            SignalDirection::Neutral => "neutral",
            SignalDirection::Bearish => "bearish",
            SignalDirection::StrongBearish => "strong_bearish",
        }
    }
}

/// A pattern- or indicator-based signal detected upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    /// Category tag, e.g. "momentum", "trend", "candlestick"
    pub category: String,
    pub direction: SignalDirection,
    pub score: f64,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        direction: SignalDirection,
        score: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            direction,
            score,
        }
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Bias::Neutral)
    }

    /// +1.0 for long, -1.0 for short, 0.0 for neutral
    pub fn sign(&self) -> f64 {
        match self {
            Bias::Bullish => 1.0,
            Bias::Bearish => -1.0,
            Bias::Neutral => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Neutral => "neutral",
        }
    }
}

/// Indicator values computed once per analysis request by the upstream provider.
///
/// Swing levels and bars are ordered oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Average true range in price units
    pub atr: f64,
    /// ATR as a percentage of the current price
    pub atr_percent: f64,
    /// Average directional index (trend strength, direction-agnostic)
    pub adx: f64,
    pub current_price: f64,
    #[serde(default)]
    pub swing_highs: Vec<f64>,
    #[serde(default)]
    pub swing_lows: Vec<f64>,
    pub sma_short: f64,
    pub sma_medium: f64,
    /// Trailing OHLC window backing the structural scans
    pub bars: Vec<Bar>,
}

impl IndicatorSnapshot {
    /// Timestamp of the most recent bar in the window
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|bar| bar.timestamp)
    }
}

/// Everything the provider returns for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub symbol: String,
    pub snapshot: IndicatorSnapshot,
    pub signals: Vec<Signal>,
}
