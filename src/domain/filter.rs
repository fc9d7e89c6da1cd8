//! Universe filtering: boolean predicates over security metadata and
//! computed score columns, composed by logical AND.
//!
//! Predicates are evaluated in list order, each narrowing the running mask.
//! Order matters for `TopKBy`, which ranks only the securities that survived
//! the predicates before it — this is how "top 2000 by market cap, then the
//! 600 least volatile of those" is expressed. No predicate can see the
//! Selection Set.

use super::error::QuantscreenError;
use super::pipeline::ScoreColumns;
use super::rank::{RankOrder, rank};
use super::window::MarketSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Sector code must be present and not in the exclusion list.
    SectorNotIn(Vec<i64>),
    HasSector,
    /// Market cap must be at least this (NaN fails).
    MinMarketCap(f64),
    HasMarketCap,
    PrimaryShareOnly,
    CommonStockOnly,
    NotDepositaryReceipt,
    NotOtc,
    NotWhenIssued,
    NotLimitedPartnership,
    /// Named score column strictly above a threshold (NaN fails).
    ScoreAbove { column: String, threshold: f64 },
    /// Named score column strictly below a threshold (NaN fails).
    ScoreBelow { column: String, threshold: f64 },
    /// Score at or outside a band: keep when score <= low or score >= high.
    ScoreOutside { column: String, low: f64, high: f64 },
    /// Keep only the k best by a reference column, ranked among securities
    /// still in the mask. Ascending keeps the smallest values.
    TopKBy {
        column: String,
        k: usize,
        order: RankOrder,
    },
}

/// Apply predicates in order, ANDing into a single eligibility mask aligned
/// with the snapshot's security list.
pub fn apply_predicates(
    snapshot: &MarketSnapshot,
    columns: &ScoreColumns,
    predicates: &[Predicate],
) -> Result<Vec<bool>, QuantscreenError> {
    let mut mask = vec![true; snapshot.securities.len()];

    for predicate in predicates {
        match predicate {
            Predicate::SectorNotIn(excluded) => {
                apply_meta(snapshot, &mut mask, |meta| {
                    meta.sector.is_some_and(|s| !excluded.contains(&s))
                });
            }
            Predicate::HasSector => {
                apply_meta(snapshot, &mut mask, |meta| meta.sector.is_some());
            }
            Predicate::MinMarketCap(min) => {
                apply_meta(snapshot, &mut mask, |meta| meta.market_cap >= *min);
            }
            Predicate::HasMarketCap => {
                apply_meta(snapshot, &mut mask, |meta| !meta.market_cap.is_nan());
            }
            Predicate::PrimaryShareOnly => {
                apply_meta(snapshot, &mut mask, |meta| meta.primary_share);
            }
            Predicate::CommonStockOnly => {
                apply_meta(snapshot, &mut mask, |meta| meta.common_stock);
            }
            Predicate::NotDepositaryReceipt => {
                apply_meta(snapshot, &mut mask, |meta| !meta.depositary_receipt);
            }
            Predicate::NotOtc => {
                apply_meta(snapshot, &mut mask, |meta| !meta.otc);
            }
            Predicate::NotWhenIssued => {
                apply_meta(snapshot, &mut mask, |meta| !meta.when_issued);
            }
            Predicate::NotLimitedPartnership => {
                apply_meta(snapshot, &mut mask, |meta| !meta.limited_partnership);
            }
            Predicate::ScoreAbove { column, threshold } => {
                let values = lookup(columns, column)?;
                for (i, keep) in mask.iter_mut().enumerate() {
                    *keep = *keep && values[i] > *threshold;
                }
            }
            Predicate::ScoreBelow { column, threshold } => {
                let values = lookup(columns, column)?;
                for (i, keep) in mask.iter_mut().enumerate() {
                    *keep = *keep && values[i] < *threshold;
                }
            }
            Predicate::ScoreOutside { column, low, high } => {
                let values = lookup(columns, column)?;
                for (i, keep) in mask.iter_mut().enumerate() {
                    *keep = *keep && (values[i] <= *low || values[i] >= *high);
                }
            }
            Predicate::TopKBy { column, k, order } => {
                let values = lookup(columns, column)?;
                let ranks = rank(values, &mask, *order);
                for (i, keep) in mask.iter_mut().enumerate() {
                    *keep = *keep && !ranks[i].is_nan() && ranks[i] <= *k as f64;
                }
            }
        }
    }

    Ok(mask)
}

fn apply_meta(
    snapshot: &MarketSnapshot,
    mask: &mut [bool],
    keep: impl Fn(&crate::domain::security::SecurityMeta) -> bool,
) {
    for (i, id) in snapshot.securities.iter().enumerate() {
        if mask[i] {
            mask[i] = keep(&snapshot.meta_of(id));
        }
    }
}

fn lookup<'a>(
    columns: &'a ScoreColumns,
    name: &str,
) -> Result<&'a [f64], QuantscreenError> {
    columns.get(name).ok_or_else(|| QuantscreenError::UnknownColumn {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::security::{SECTOR_FINANCIALS, SECTOR_UTILITIES, SecurityId, SecurityMeta};
    use chrono::NaiveDate;

    fn snapshot(metas: Vec<(&str, SecurityMeta)>) -> MarketSnapshot {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let ids: Vec<SecurityId> = metas.iter().map(|(n, _)| SecurityId::new(*n)).collect();
        let mut snap = MarketSnapshot::new(date, ids.clone());
        for (i, (_, meta)) in metas.into_iter().enumerate() {
            snap.meta.insert(ids[i].clone(), meta);
        }
        snap
    }

    fn meta(sector: Option<i64>, market_cap: f64) -> SecurityMeta {
        SecurityMeta {
            sector,
            market_cap,
            ..SecurityMeta::default()
        }
    }

    #[test]
    fn sector_exclusion() {
        let snap = snapshot(vec![
            ("BANK", meta(Some(SECTOR_FINANCIALS), 5e9)),
            ("UTIL", meta(Some(SECTOR_UTILITIES), 5e9)),
            ("TECH", meta(Some(311), 5e9)),
            ("NOSEC", meta(None, 5e9)),
        ]);
        let columns = ScoreColumns::new(4);
        let mask = apply_predicates(
            &snap,
            &columns,
            &[Predicate::SectorNotIn(vec![SECTOR_FINANCIALS, SECTOR_UTILITIES])],
        )
        .unwrap();
        assert_eq!(mask, vec![false, false, true, false]);
    }

    #[test]
    fn min_market_cap_nan_fails() {
        let snap = snapshot(vec![
            ("BIG", meta(Some(311), 2e9)),
            ("SMALL", meta(Some(311), 5e8)),
            ("UNKNOWN", meta(Some(311), f64::NAN)),
        ]);
        let columns = ScoreColumns::new(3);
        let mask =
            apply_predicates(&snap, &columns, &[Predicate::MinMarketCap(1e9)]).unwrap();
        assert_eq!(mask, vec![true, false, false]);
    }

    #[test]
    fn tradability_flags() {
        let bad = SecurityMeta {
            otc: true,
            limited_partnership: true,
            ..SecurityMeta::default()
        };
        let snap = snapshot(vec![("GOOD", SecurityMeta::default()), ("BAD", bad)]);
        let columns = ScoreColumns::new(2);
        let mask = apply_predicates(
            &snap,
            &columns,
            &[
                Predicate::PrimaryShareOnly,
                Predicate::CommonStockOnly,
                Predicate::NotDepositaryReceipt,
                Predicate::NotOtc,
                Predicate::NotWhenIssued,
                Predicate::NotLimitedPartnership,
            ],
        )
        .unwrap();
        assert_eq!(mask, vec![true, false]);
    }

    #[test]
    fn score_above_excludes_nan() {
        let snap = snapshot(vec![
            ("A", SecurityMeta::default()),
            ("B", SecurityMeta::default()),
            ("C", SecurityMeta::default()),
        ]);
        let mut columns = ScoreColumns::new(3);
        columns
            .insert("ebit_ttm", vec![10.0, -5.0, f64::NAN])
            .unwrap();
        let mask = apply_predicates(
            &snap,
            &columns,
            &[Predicate::ScoreAbove {
                column: "ebit_ttm".into(),
                threshold: 0.0,
            }],
        )
        .unwrap();
        assert_eq!(mask, vec![true, false, false]);
    }

    #[test]
    fn score_outside_band_keeps_both_tails() {
        let snap = snapshot(vec![
            ("HI", SecurityMeta::default()),
            ("MID", SecurityMeta::default()),
            ("LO", SecurityMeta::default()),
        ]);
        let mut columns = ScoreColumns::new(3);
        columns.insert("fscore", vec![8.0, 5.0, 2.0]).unwrap();
        let mask = apply_predicates(
            &snap,
            &columns,
            &[Predicate::ScoreOutside {
                column: "fscore".into(),
                low: 3.0,
                high: 7.0,
            }],
        )
        .unwrap();
        assert_eq!(mask, vec![true, false, true]);
    }

    #[test]
    fn top_k_ranks_only_surviving_securities() {
        let snap = snapshot(vec![
            ("A", meta(Some(311), 10e9)),
            ("B", meta(Some(311), 8e9)),
            ("C", meta(None, 9e9)),
            ("D", meta(Some(311), 1e9)),
        ]);
        let mut columns = ScoreColumns::new(4);
        columns
            .insert("market_cap", vec![10e9, 8e9, 9e9, 1e9])
            .unwrap();
        // C is dropped by HasSector before TopKBy ranks, so the top 2 by
        // market cap are A and B.
        let mask = apply_predicates(
            &snap,
            &columns,
            &[
                Predicate::HasSector,
                Predicate::TopKBy {
                    column: "market_cap".into(),
                    k: 2,
                    order: RankOrder::Descending,
                },
            ],
        )
        .unwrap();
        assert_eq!(mask, vec![true, true, false, false]);
    }

    #[test]
    fn unknown_column_is_error() {
        let snap = snapshot(vec![("A", SecurityMeta::default())]);
        let columns = ScoreColumns::new(1);
        let result = apply_predicates(
            &snap,
            &columns,
            &[Predicate::ScoreAbove {
                column: "missing".into(),
                threshold: 0.0,
            }],
        );
        assert!(matches!(result, Err(QuantscreenError::UnknownColumn { .. })));
    }

    #[test]
    fn empty_predicate_list_keeps_everything() {
        let snap = snapshot(vec![("A", SecurityMeta::default())]);
        let columns = ScoreColumns::new(1);
        let mask = apply_predicates(&snap, &columns, &[]).unwrap();
        assert_eq!(mask, vec![true]);
    }
}
