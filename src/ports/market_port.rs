//! Market data access port trait.

use chrono::NaiveDate;

use crate::domain::error::QuantscreenError;
use crate::domain::security::SecurityId;
use crate::domain::window::MarketSnapshot;

pub trait MarketDataPort {
    /// Trading days in the half-open range, oldest first.
    fn trading_days(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, QuantscreenError>;

    /// Point-in-time snapshot for one evaluation date: the universe, its
    /// metadata, and `lookback` rows of each data series up to the date.
    fn snapshot(
        &self,
        date: NaiveDate,
        lookback: usize,
    ) -> Result<MarketSnapshot, QuantscreenError>;

    /// Whether the security can be ordered on this date.
    fn can_trade(&self, id: &SecurityId, date: NaiveDate) -> bool;
}
