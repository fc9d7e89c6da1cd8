//! The daily simulation loop: refresh the pipeline before the open, trade
//! when a scheduler comes due, record metrics at the close.
//!
//! Each day's evaluation happens once, before the open; every scheduled
//! callback that day trades against that same output.

use chrono::{Datelike, NaiveDate};

use super::error::QuantscreenError;
use super::metrics::daily_metrics;
use super::rebalance::{build_liquidation_targets, build_rebalance_targets};
use super::schedule::{ClockDay, Scheduler, SchedulerState};
use super::security::SecurityId;
use super::strategy::Strategy;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_port::MarketDataPort;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub days: usize,
    pub rebalances: usize,
    pub liquidations: usize,
}

/// Annotate a run of trading days with month positions for the schedulers.
pub fn clock_days(dates: &[NaiveDate]) -> Vec<ClockDay> {
    let month_of = |d: &NaiveDate| (d.year(), d.month());
    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let key = month_of(&date);
            let of_month = dates[..i].iter().rev().take_while(|d| month_of(d) == key).count();
            let left = dates[i + 1..].iter().take_while(|d| month_of(d) == key).count();
            ClockDay {
                date,
                trading_day_of_month: of_month,
                trading_days_left: left,
            }
        })
        .collect()
}

/// Run one strategy across the date range, trading through the execution
/// port whenever its schedule comes due.
pub fn run(
    strategy: &Strategy,
    market: &dyn MarketDataPort,
    exec: &mut dyn ExecutionPort,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<RunSummary, QuantscreenError> {
    let days = clock_days(&market.trading_days(start_date, end_date)?);
    let lookback = strategy.kind.lookback();

    let mut rebalance = Scheduler::new(strategy.rebalance.clone());
    let mut liquidate = strategy.liquidate.clone().map(Scheduler::new);
    let mut summary = RunSummary::default();

    for day in &days {
        // Pre-market: evaluate the pipeline for today.
        let snapshot = market.snapshot(day.date, lookback)?;
        let output = strategy.evaluate(&snapshot)?;

        let date = day.date;
        let can_trade = |id: &SecurityId| market.can_trade(id, date);

        rebalance = rebalance.observe(day);
        if rebalance.state() == SchedulerState::Due {
            let held: Vec<SecurityId> =
                exec.holdings().into_iter().map(|(id, _)| id).collect();
            let outcome = build_rebalance_targets(
                &output,
                strategy.allocator,
                strategy.gross_leverage,
                strategy.pipeline.selection.capacity(),
                &held,
                &can_trade,
            );
            exec.order_target_weights(&outcome.targets)?;
            summary.rebalances += 1;
            rebalance = rebalance.submitted();
        }

        if let Some(sched) = liquidate.take() {
            let mut sched = sched.observe(day);
            if sched.state() == SchedulerState::Due {
                let held: Vec<SecurityId> =
                    exec.holdings().into_iter().map(|(id, _)| id).collect();
                let outcome = build_liquidation_targets(&output, &held, &can_trade);
                if !outcome.targets.is_empty() {
                    exec.order_target_weights(&outcome.targets)?;
                    summary.liquidations += 1;
                }
                sched = sched.submitted();
            }
            liquidate = Some(sched);
        }

        // Close: record the day's book.
        let metrics = daily_metrics(day.date, &exec.holdings());
        exec.record_metrics(&metrics)?;
        summary.days += 1;
    }

    Ok(summary)
}
