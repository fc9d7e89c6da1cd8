//! Building the target-weight map for a Due rebalance: allocate across the
//! selection, zero out dropped holdings, skip whatever cannot trade today.

use super::pipeline::PipelineOutput;
use super::security::SecurityId;
use super::weights::{Allocator, TargetPortfolio, position_weight};

/// Targets to submit plus the securities skipped because they could not be
/// traded today. Skipped names are retried implicitly at the next Due
/// transition; nothing escalates.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceOutcome {
    pub targets: TargetPortfolio,
    pub skipped: Vec<SecurityId>,
}

/// Full rebalance: weight the long (and short) selections, and set every
/// held-but-deselected security to zero. `capacity` is the configured slot
/// count of the selection rule; equal weight divides by it, so a thin
/// screen leaves budget uninvested rather than concentrating it.
pub fn build_rebalance_targets(
    output: &PipelineOutput,
    allocator: Allocator,
    gross_leverage: f64,
    capacity: usize,
    held: &[SecurityId],
    can_trade: &dyn Fn(&SecurityId) -> bool,
) -> RebalanceOutcome {
    let mut targets = TargetPortfolio::new();
    let mut skipped = Vec::new();

    // Long and short magnitudes stay symmetric even when one side comes up
    // short of its target count.
    let (long_weight, short_weight) = match allocator {
        Allocator::LongShort => {
            let total = output.longs.len() + output.shorts.len();
            let w = if total == 0 {
                0.0
            } else {
                gross_leverage / total as f64
            };
            (w, w)
        }
        Allocator::EqualWeight { .. } => {
            let w = position_weight(allocator, gross_leverage, capacity);
            (w, w)
        }
        Allocator::CappedEqualWeight { .. } => (
            position_weight(allocator, gross_leverage, output.longs.len()),
            position_weight(allocator, gross_leverage, output.shorts.len()),
        ),
    };

    for id in &output.longs {
        if can_trade(id) {
            targets.set(id.clone(), long_weight);
        } else {
            skipped.push(id.clone());
        }
    }

    for id in &output.shorts {
        if can_trade(id) {
            targets.set(id.clone(), -short_weight);
        } else {
            skipped.push(id.clone());
        }
    }

    liquidate_dropped(output, held, can_trade, &mut targets, &mut skipped);

    RebalanceOutcome { targets, skipped }
}

/// Liquidation-only pass: zero out held securities no longer selected,
/// without touching the ones still in the selection. Used by strategies
/// whose sell schedule is separate from their buy schedule.
pub fn build_liquidation_targets(
    output: &PipelineOutput,
    held: &[SecurityId],
    can_trade: &dyn Fn(&SecurityId) -> bool,
) -> RebalanceOutcome {
    let mut targets = TargetPortfolio::new();
    let mut skipped = Vec::new();
    liquidate_dropped(output, held, can_trade, &mut targets, &mut skipped);
    RebalanceOutcome { targets, skipped }
}

fn liquidate_dropped(
    output: &PipelineOutput,
    held: &[SecurityId],
    can_trade: &dyn Fn(&SecurityId) -> bool,
    targets: &mut TargetPortfolio,
    skipped: &mut Vec<SecurityId>,
) {
    for id in held {
        if output.is_selected(id) || targets.contains(id) {
            continue;
        }
        if can_trade(id) {
            targets.set(id.clone(), 0.0);
        } else {
            skipped.push(id.clone());
        }
    }
}
