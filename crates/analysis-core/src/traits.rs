use async_trait::async_trait;
use crate::{MarketContext, ProviderError};

/// Source of indicator snapshots and detected signals for a symbol.
///
/// Implementations must return a non-empty signal list and a price window of
/// at least their advertised minimum, or fail with
/// [`ProviderError::InsufficientData`].
#[async_trait]
pub trait IndicatorProvider: Send + Sync {
    async fn fetch(&self, symbol: &str, lookback_days: i64) -> Result<MarketContext, ProviderError>;

    /// Fewest bars this provider will ever hand out
    fn min_bars(&self) -> usize;
}
