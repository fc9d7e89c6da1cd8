//! In-memory execution adapter: applies target weights instantly and keeps
//! an order log and a metrics history that can be written out as CSV.
//!
//! Weights, not share counts, are simulated. The cost style is carried so a
//! broker-backed adapter can share the same configuration surface; here it
//! only feeds the slippage estimate on each order.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::error::QuantscreenError;
use crate::domain::metrics::DailyMetrics;
use crate::domain::security::SecurityId;
use crate::domain::weights::TargetPortfolio;
use crate::ports::execution_port::ExecutionPort;

/// Execution cost configuration, in the units brokers quote them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionStyle {
    pub slippage_bps: f64,
    /// Fraction of daily volume an order may consume.
    pub volume_limit: f64,
    pub commission_per_share: f64,
    pub min_commission: f64,
}

impl Default for ExecutionStyle {
    fn default() -> Self {
        ExecutionStyle {
            slippage_bps: 5.0,
            volume_limit: 0.1,
            commission_per_share: 0.05,
            min_commission: 1.0,
        }
    }
}

/// One submitted order: the weight move and the slippage estimate for it,
/// as a fraction of capital.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub security: SecurityId,
    pub previous: f64,
    pub target: f64,
    pub slippage_cost: f64,
}

#[derive(Default)]
pub struct PaperExecutionAdapter {
    style: ExecutionStyle,
    weights: BTreeMap<SecurityId, f64>,
    orders: Vec<OrderRecord>,
    metrics: Vec<DailyMetrics>,
}

impl PaperExecutionAdapter {
    pub fn new(style: ExecutionStyle) -> Self {
        PaperExecutionAdapter {
            style,
            weights: BTreeMap::new(),
            orders: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn metrics(&self) -> &[DailyMetrics] {
        &self.metrics
    }

    /// Total slippage estimate across all orders, as a fraction of capital.
    pub fn total_slippage(&self) -> f64 {
        self.orders.iter().map(|o| o.slippage_cost).sum()
    }

    pub fn write_orders_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), QuantscreenError> {
        let mut wtr = csv::Writer::from_path(path.as_ref()).map_err(csv_error)?;
        wtr.write_record(["security", "previous", "target", "slippage_cost"])
            .map_err(csv_error)?;
        for order in &self.orders {
            wtr.write_record([
                order.security.as_str().to_string(),
                order.previous.to_string(),
                order.target.to_string(),
                order.slippage_cost.to_string(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_metrics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), QuantscreenError> {
        let mut wtr = csv::Writer::from_path(path.as_ref()).map_err(csv_error)?;
        wtr.write_record(["date", "leverage", "net_exposure", "position_count"])
            .map_err(csv_error)?;
        for m in &self.metrics {
            wtr.write_record([
                m.date.format("%Y-%m-%d").to_string(),
                m.leverage.to_string(),
                m.net_exposure.to_string(),
                m.position_count.to_string(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> QuantscreenError {
    QuantscreenError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

impl ExecutionPort for PaperExecutionAdapter {
    fn order_target_weights(
        &mut self,
        targets: &TargetPortfolio,
    ) -> Result<(), QuantscreenError> {
        for (id, target) in targets.iter() {
            let previous = self.weights.get(id).copied().unwrap_or(0.0);
            if previous == target {
                continue;
            }
            let slippage_cost = (target - previous).abs() * self.style.slippage_bps / 10_000.0;
            self.orders.push(OrderRecord {
                security: id.clone(),
                previous,
                target,
                slippage_cost,
            });
            if target == 0.0 {
                self.weights.remove(id);
            } else {
                self.weights.insert(id.clone(), target);
            }
        }
        Ok(())
    }

    fn holdings(&self) -> Vec<(SecurityId, f64)> {
        self.weights.iter().map(|(id, w)| (id.clone(), *w)).collect()
    }

    fn record_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), QuantscreenError> {
        self.metrics.push(metrics.clone());
        Ok(())
    }
}
