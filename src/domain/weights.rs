//! Target portfolio weights and the allocation rules the strategies use.

use std::collections::BTreeMap;

use super::security::SecurityId;

/// How the gross leverage budget is spread across the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocator {
    /// gross_leverage * safety_margin spread over the configured slot
    /// count, whether or not the screen fills every slot.
    EqualWeight { safety_margin: f64 },
    /// gross_leverage / |selection|, clamped (not rescaled) to the
    /// per-position cap.
    CappedEqualWeight { max_position: f64 },
    /// gross_leverage / (2 * per_side) long, same magnitude negative short.
    LongShort,
}

/// Mapping from selected securities to target weights (fractions of
/// capital). Iteration order is the security order, so submissions are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetPortfolio {
    targets: BTreeMap<SecurityId, f64>,
}

impl TargetPortfolio {
    pub fn new() -> Self {
        TargetPortfolio {
            targets: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, id: SecurityId, weight: f64) {
        self.targets.insert(id, weight);
    }

    pub fn weight(&self, id: &SecurityId) -> Option<f64> {
        self.targets.get(id).copied()
    }

    pub fn contains(&self, id: &SecurityId) -> bool {
        self.targets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SecurityId, f64)> {
        self.targets.iter().map(|(id, w)| (id, *w))
    }

    /// Sum of absolute weights.
    pub fn gross(&self) -> f64 {
        self.targets.values().map(|w| w.abs()).sum()
    }

    /// Signed sum of weights.
    pub fn net(&self) -> f64 {
        self.targets.values().sum()
    }
}

/// Per-position long weight for a selection of `n`. Zero when the selection
/// is empty — never a division by zero.
pub fn position_weight(allocator: Allocator, gross_leverage: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    match allocator {
        Allocator::EqualWeight { safety_margin } => gross_leverage * safety_margin / n as f64,
        Allocator::CappedEqualWeight { max_position } => {
            (gross_leverage / n as f64).min(max_position)
        }
        Allocator::LongShort => gross_leverage / (2.0 * n as f64),
    }
}
