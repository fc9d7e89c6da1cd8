//! Daily portfolio metrics recorded at the close for post-hoc analysis.

use chrono::NaiveDate;

use super::security::SecurityId;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    /// Sum of absolute position weights.
    pub leverage: f64,
    /// Signed sum of position weights.
    pub net_exposure: f64,
    /// Number of nonzero positions.
    pub position_count: usize,
}

/// Compute the day's metrics from current holdings (weight per security).
pub fn daily_metrics(date: NaiveDate, holdings: &[(SecurityId, f64)]) -> DailyMetrics {
    let leverage = holdings.iter().map(|(_, w)| w.abs()).sum();
    let net_exposure = holdings.iter().map(|(_, w)| w).sum();
    let position_count = holdings.iter().filter(|(_, w)| *w != 0.0).count();
    DailyMetrics {
        date,
        leverage,
        net_exposure,
        position_count,
    }
}
