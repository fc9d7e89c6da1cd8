//! Pipeline model: named score columns, a filter list, a scoring recipe,
//! and a selection rule, evaluated together against one market snapshot.
//!
//! The evaluated output is cached by the runner between the pre-market
//! refresh and the day's rebalance callback. "No output yet" is an explicit
//! `Option`, checked by the caller, not an exception to swallow.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::QuantscreenError;
use super::filter::{Predicate, apply_predicates};
use super::rank::{Component, RankOrder, SelectBest, composite, rank, select};
use super::security::SecurityId;
use super::window::MarketSnapshot;

/// Named per-security score columns, all the same length as the universe.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreColumns {
    len: usize,
    columns: HashMap<String, Vec<f64>>,
}

impl ScoreColumns {
    pub fn new(len: usize) -> Self {
        ScoreColumns {
            len,
            columns: HashMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), QuantscreenError> {
        if values.len() != self.len {
            return Err(QuantscreenError::WindowShape {
                reason: format!(
                    "score column has {} values for a universe of {}",
                    values.len(),
                    self.len
                ),
            });
        }
        self.columns.insert(name.into(), values);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One rank-based component of a composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankComponent {
    pub column: String,
    pub weight: f64,
    pub order: RankOrder,
}

/// How the composite score is produced from the score columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Scoring {
    /// Weighted sum of per-factor ordinal ranks over the filtered universe,
    /// divided by `divisor`. Low composite is good when each component gives
    /// rank 1 to its best value.
    RankSum {
        components: Vec<RankComponent>,
        divisor: f64,
    },
    /// Use a raw score column directly.
    Raw { column: String },
}

/// How many securities to pick, and from which end of the composite.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Top { n: usize, best: SelectBest },
    /// Long the n highest and short the n lowest composites; the two sets
    /// are kept disjoint (longs win contested securities).
    LongShort { per_side: usize },
}

impl Selection {
    pub fn capacity(&self) -> usize {
        match self {
            Selection::Top { n, .. } => *n,
            Selection::LongShort { per_side } => *per_side,
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        match self {
            Selection::Top { n, .. } => *n = capacity,
            Selection::LongShort { per_side } => *per_side = capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub predicates: Vec<Predicate>,
    pub scoring: Scoring,
    pub selection: Selection,
}

/// Result of evaluating a pipeline for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub date: NaiveDate,
    pub securities: Vec<SecurityId>,
    pub composite: Vec<f64>,
    pub mask: Vec<bool>,
    pub longs: Vec<SecurityId>,
    pub shorts: Vec<SecurityId>,
}

impl PipelineOutput {
    pub fn is_selected(&self, id: &SecurityId) -> bool {
        self.longs.contains(id) || self.shorts.contains(id)
    }

    /// Composite score for one security, NaN when not in the universe.
    pub fn composite_of(&self, id: &SecurityId) -> f64 {
        self.securities
            .iter()
            .position(|s| s == id)
            .map(|i| self.composite[i])
            .unwrap_or(f64::NAN)
    }
}

impl Pipeline {
    /// Filter, score, and select against precomputed score columns.
    pub fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
        columns: &ScoreColumns,
    ) -> Result<PipelineOutput, QuantscreenError> {
        let mask = apply_predicates(snapshot, columns, &self.predicates)?;

        let composite_scores = match &self.scoring {
            Scoring::RankSum { components, divisor } => {
                let ranked: Vec<Vec<f64>> = components
                    .iter()
                    .map(|c| {
                        let values = columns.get(&c.column).ok_or_else(|| {
                            QuantscreenError::UnknownColumn {
                                name: c.column.clone(),
                            }
                        })?;
                        Ok(rank(values, &mask, c.order))
                    })
                    .collect::<Result<_, QuantscreenError>>()?;
                let parts: Vec<Component<'_>> = components
                    .iter()
                    .zip(ranked.iter())
                    .map(|(c, r)| Component {
                        weight: c.weight / divisor,
                        values: r,
                    })
                    .collect();
                composite(&parts)
            }
            Scoring::Raw { column } => columns
                .get(column)
                .ok_or_else(|| QuantscreenError::UnknownColumn {
                    name: column.clone(),
                })?
                .to_vec(),
        };

        let (longs, shorts) = match &self.selection {
            Selection::Top { n, best } => {
                let picked = select(&composite_scores, &mask, *n, *best);
                (to_ids(snapshot, &picked), Vec::new())
            }
            Selection::LongShort { per_side } => {
                let longs = select(&composite_scores, &mask, *per_side, SelectBest::Highest);
                let mut short_mask = mask.clone();
                for &i in &longs {
                    short_mask[i] = false;
                }
                let shorts = select(&composite_scores, &short_mask, *per_side, SelectBest::Lowest);
                (to_ids(snapshot, &longs), to_ids(snapshot, &shorts))
            }
        };

        Ok(PipelineOutput {
            date: snapshot.date,
            securities: snapshot.securities.clone(),
            composite: composite_scores,
            mask,
            longs,
            shorts,
        })
    }
}

fn to_ids(snapshot: &MarketSnapshot, indices: &[usize]) -> Vec<SecurityId> {
    indices
        .iter()
        .map(|&i| snapshot.securities[i].clone())
        .collect()
}
