use analysis_core::{Bias, IndicatorSnapshot, Signal};

/// Highest-scored signal matching `filter`; the earliest wins ties.
fn top_signal<'a, F>(signals: &'a [Signal], filter: F) -> Option<&'a Signal>
where
    F: Fn(&Signal) -> bool,
{
    signals
        .iter()
        .filter(|signal| filter(*signal))
        .fold(None, |best: Option<&Signal>, signal| match best {
            Some(current) if current.score >= signal.score => Some(current),
            _ => Some(signal),
        })
}

/// Highest-scored signal of any direction
pub fn strongest(signals: &[Signal]) -> Option<&Signal> {
    top_signal(signals, |_| true)
}

/// Settle on a trade direction.
///
/// A directional hint wins. Otherwise signals vote (strong signals count
/// double); a tied vote defers to the highest-scored directional signal, and
/// with no directional signals at all price is read against the medium
/// moving average.
pub fn resolve_bias(hint: Option<Bias>, signals: &[Signal], snapshot: &IndicatorSnapshot) -> Bias {
    if let Some(bias) = hint.filter(Bias::is_directional) {
        return bias;
    }

    let net: i32 = signals.iter().map(|signal| signal.direction.weight()).sum();
    if net > 0 {
        return Bias::Bullish;
    }
    if net < 0 {
        return Bias::Bearish;
    }

    if let Some(signal) = top_signal(signals, |s| s.direction.bias().is_directional()) {
        return signal.direction.bias();
    }

    if snapshot.current_price >= snapshot.sma_medium {
        Bias::Bullish
    } else {
        Bias::Bearish
    }
}

/// The signal a plan is attributed to, and the other signals agreeing with it.
///
/// Falls back to the strongest signal overall when none agrees with `bias`.
/// A directional hint against every signal therefore yields a primary signal
/// opposing the plan bias, with no supporting signals.
pub fn attribute(signals: &[Signal], bias: Bias) -> Option<(Signal, Vec<Signal>)> {
    let aligned = |signal: &Signal| signal.direction.bias() == bias;
    let primary = top_signal(signals, aligned).or_else(|| strongest(signals))?;

    let mut supporting: Vec<Signal> = signals
        .iter()
        .filter(|signal| aligned(*signal) && !std::ptr::eq(*signal, primary))
        .cloned()
        .collect();
    supporting.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    Some((primary.clone(), supporting))
}
