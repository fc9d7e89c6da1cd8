//! Order submission and portfolio accounting port trait.

use crate::domain::error::QuantscreenError;
use crate::domain::metrics::DailyMetrics;
use crate::domain::security::SecurityId;
use crate::domain::weights::TargetPortfolio;

pub trait ExecutionPort {
    /// Submit target weights; the adapter moves each position to its target.
    fn order_target_weights(
        &mut self,
        targets: &TargetPortfolio,
    ) -> Result<(), QuantscreenError>;

    /// Current holdings as (security, weight) pairs, in security order.
    fn holdings(&self) -> Vec<(SecurityId, f64)>;

    /// Record the day's closing metrics.
    fn record_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), QuantscreenError>;
}
