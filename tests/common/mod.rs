#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use quantscreen::domain::error::QuantscreenError;
use quantscreen::domain::metrics::DailyMetrics;
use quantscreen::domain::security::{SecurityId, SecurityMeta};
use quantscreen::domain::weights::TargetPortfolio;
use quantscreen::domain::window::{DateWindow, FactorWindow, Field, MarketSnapshot};
use quantscreen::ports::execution_port::ExecutionPort;
use quantscreen::ports::market_port::MarketDataPort;
use std::collections::{BTreeMap, HashMap, HashSet};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ids(names: &[&str]) -> Vec<SecurityId> {
    names.iter().map(|n| SecurityId::new(*n)).collect()
}

/// Weekday dates in [from, to), a stand-in trading calendar.
pub fn weekdays(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut d = from;
    while d < to {
        if d.weekday().num_days_from_monday() < 5 {
            days.push(d);
        }
        d = d + chrono::Days::new(1);
    }
    days
}

pub fn large_cap_meta(sector: i64) -> SecurityMeta {
    SecurityMeta {
        sector: Some(sector),
        market_cap: 5e9,
        ..SecurityMeta::default()
    }
}

/// Market port backed by full-history windows; snapshots slice the last
/// `lookback` rows at or before the requested date.
pub struct MockMarketPort {
    pub days: Vec<NaiveDate>,
    pub securities: Vec<SecurityId>,
    pub meta: HashMap<SecurityId, SecurityMeta>,
    pub series: HashMap<Field, FactorWindow>,
    pub asof: HashMap<Field, DateWindow>,
    pub halted: HashSet<SecurityId>,
}

impl MockMarketPort {
    pub fn new(days: Vec<NaiveDate>, securities: Vec<SecurityId>) -> Self {
        let meta = securities
            .iter()
            .map(|id| (id.clone(), large_cap_meta(311)))
            .collect();
        MockMarketPort {
            days,
            securities,
            meta,
            series: HashMap::new(),
            asof: HashMap::new(),
            halted: HashSet::new(),
        }
    }

    /// Set a field to the same per-security values on every trading day.
    pub fn with_constant(mut self, field: Field, values: Vec<f64>) -> Self {
        let rows = vec![values; self.days.len()];
        let window = FactorWindow::new(self.days.clone(), self.securities.clone(), rows).unwrap();
        self.series.insert(field, window);
        self
    }

    pub fn with_series(mut self, field: Field, window: FactorWindow) -> Self {
        self.series.insert(field, window);
        self
    }

    pub fn with_asof(mut self, field: Field, window: DateWindow) -> Self {
        self.asof.insert(field, window);
        self
    }

    pub fn with_meta(mut self, name: &str, meta: SecurityMeta) -> Self {
        self.meta.insert(SecurityId::new(name), meta);
        self
    }

    pub fn with_halted(mut self, name: &str) -> Self {
        self.halted.insert(SecurityId::new(name));
        self
    }
}

impl MarketDataPort for MockMarketPort {
    fn trading_days(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, QuantscreenError> {
        Ok(self
            .days
            .iter()
            .copied()
            .filter(|d| *d >= start_date && *d < end_date)
            .collect())
    }

    fn snapshot(
        &self,
        date: NaiveDate,
        lookback: usize,
    ) -> Result<MarketSnapshot, QuantscreenError> {
        let mut snap = MarketSnapshot::new(date, self.securities.clone());
        snap.meta = self.meta.clone();
        for (field, window) in &self.series {
            let keep: Vec<usize> = window
                .dates
                .iter()
                .enumerate()
                .filter(|(_, d)| **d <= date)
                .map(|(i, _)| i)
                .collect();
            let tail: Vec<usize> = keep
                .iter()
                .rev()
                .take(lookback)
                .rev()
                .copied()
                .collect();
            let sliced = FactorWindow::new(
                tail.iter().map(|&i| window.dates[i]).collect(),
                window.securities.clone(),
                tail.iter().map(|&i| window.values[i].clone()).collect(),
            )?;
            snap.series.insert(*field, sliced);
            if let Some(asof) = self.asof.get(field) {
                let sliced = DateWindow::new(
                    tail.iter().map(|&i| asof.dates[i]).collect(),
                    asof.securities.clone(),
                    tail.iter().map(|&i| asof.values[i].clone()).collect(),
                )?;
                snap.asof.insert(*field, sliced);
            }
        }
        Ok(snap)
    }

    fn can_trade(&self, id: &SecurityId, _date: NaiveDate) -> bool {
        !self.halted.contains(id)
    }
}

/// Execution port that applies targets instantly and keeps every submission.
#[derive(Default)]
pub struct MockExecutionPort {
    pub weights: BTreeMap<SecurityId, f64>,
    pub submissions: Vec<TargetPortfolio>,
    pub metrics: Vec<DailyMetrics>,
}

impl ExecutionPort for MockExecutionPort {
    fn order_target_weights(
        &mut self,
        targets: &TargetPortfolio,
    ) -> Result<(), QuantscreenError> {
        for (id, w) in targets.iter() {
            if w == 0.0 {
                self.weights.remove(id);
            } else {
                self.weights.insert(id.clone(), w);
            }
        }
        self.submissions.push(targets.clone());
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
