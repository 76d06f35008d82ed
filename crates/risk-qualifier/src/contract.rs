//! Input contract checks. Any failure rejects the whole assessment; nothing
//! is defaulted or clamped.

use analysis_core::{IndicatorSnapshot, Signal};

use crate::error::{QualificationError, QualificationResult};

fn require(condition: bool, field: &str, reason: impl FnOnce() -> String) -> QualificationResult<()> {
    if condition {
        Ok(())
    } else {
        Err(QualificationError::contract(field, reason()))
    }
}

fn non_negative(value: f64, field: &str) -> QualificationResult<()> {
    require(value.is_finite() && value >= 0.0, field, || {
        format!("must be a finite non-negative number, got {}", value)
    })
}

fn positive(value: f64, field: &str) -> QualificationResult<()> {
    require(value.is_finite() && value > 0.0, field, || {
        format!("must be a finite positive number, got {}", value)
    })
}

pub fn validate_request(
    symbol: &str,
    entry_price: f64,
    snapshot: &IndicatorSnapshot,
    signals: &[Signal],
    min_price_bars: usize,
) -> QualificationResult<()> {
    require(!symbol.trim().is_empty(), "symbol", || "must not be empty".to_string())?;
    positive(entry_price, "entry_price")?;
    validate_snapshot(snapshot, min_price_bars)?;
    validate_signals(signals)
}

pub fn validate_snapshot(snapshot: &IndicatorSnapshot, min_price_bars: usize) -> QualificationResult<()> {
    non_negative(snapshot.atr, "snapshot.atr")?;
    non_negative(snapshot.atr_percent, "snapshot.atr_percent")?;
    non_negative(snapshot.adx, "snapshot.adx")?;
    positive(snapshot.current_price, "snapshot.current_price")?;
    require(snapshot.sma_short.is_finite(), "snapshot.sma_short", || {
        format!("must be finite, got {}", snapshot.sma_short)
    })?;
    require(snapshot.sma_medium.is_finite(), "snapshot.sma_medium", || {
        format!("must be finite, got {}", snapshot.sma_medium)
    })?;

    for (field, levels) in [
        ("snapshot.swing_highs", &snapshot.swing_highs),
        ("snapshot.swing_lows", &snapshot.swing_lows),
    ] {
        if let Some(bad) = levels.iter().find(|level| !level.is_finite()) {
            return Err(QualificationError::contract(field, format!("contains non-finite level {}", bad)));
        }
    }

    require(snapshot.bars.len() >= min_price_bars, "snapshot.bars", || {
        format!(
            "price window has {} bars, need at least {}",
            snapshot.bars.len(),
            min_price_bars.max(1)
        )
    })?;
    require(!snapshot.bars.is_empty(), "snapshot.bars", || "price window is empty".to_string())?;

    for (i, bar) in snapshot.bars.iter().enumerate() {
        let finite = [bar.open, bar.high, bar.low, bar.close].iter().all(|p| p.is_finite());
        require(finite, "snapshot.bars", || format!("bar {} has a non-finite price", i))?;
        require(bar.high >= bar.low, "snapshot.bars", || {
            format!("bar {} has high {} below low {}", i, bar.high, bar.low)
        })?;
    }

    Ok(())
}

pub fn validate_signals(signals: &[Signal]) -> QualificationResult<()> {
    require(!signals.is_empty(), "signals", || "signal list must not be empty".to_string())?;

    if let Some(signal) = signals.iter().find(|signal| !signal.score.is_finite()) {
        return Err(QualificationError::contract(
            "signals",
            format!("signal '{}' has non-finite score {}", signal.name, signal.score),
        ));
    }
    Ok(())
}
