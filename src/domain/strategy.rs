//! The four built-in screening strategies.
//!
//! Each strategy bundles a factor recipe (which score columns to compute
//! from the snapshot), a filter list, a selection rule, an allocator, and a
//! rebalance schedule.

use super::error::QuantscreenError;
use super::factor;
use super::filter::Predicate;
use super::fscore::{FScoreInputs, MetricPair, piotroski_f_score};
use super::pipeline::{Pipeline, PipelineOutput, RankComponent, ScoreColumns, Scoring, Selection};
use super::rank::{RankOrder, SelectBest};
use super::schedule::RebalanceRule;
use super::security::{SECTOR_FINANCIALS, SECTOR_UTILITIES};
use super::ttm::trailing_twelve_months;
use super::weights::Allocator;
use super::window::{Field, MarketSnapshot};

/// Factor recipe identifier; drives which score columns get computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    MagicFormula,
    AcquirersMultiple,
    PiotroskiFScore,
    ValueComposite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub kind: StrategyKind,
    pub pipeline: Pipeline,
    pub allocator: Allocator,
    pub gross_leverage: f64,
    pub rebalance: RebalanceRule,
    /// Separate sell schedule for strategies whose liquidation runs on its
    /// own calendar (for the rest, the rebalance itself liquidates).
    pub liquidate: Option<RebalanceRule>,
    pub long_only: bool,
}

impl Strategy {
    /// Compute the factor columns and run the pipeline for one snapshot.
    pub fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
    ) -> Result<PipelineOutput, QuantscreenError> {
        let columns = self.kind.compute_columns(snapshot)?;
        self.pipeline.evaluate(snapshot, &columns)
    }
}

/// Joel Greenblatt's Magic Formula: rank by earnings yield plus return on
/// invested capital, buy the top 25 in January, sell down in December.
pub fn magic_formula() -> Strategy {
    Strategy {
        name: "magic-formula".into(),
        description: "Earnings yield + ROIC rank sum, top 25, yearly Jan/Dec cycle".into(),
        kind: StrategyKind::MagicFormula,
        pipeline: Pipeline {
            predicates: vec![
                Predicate::HasSector,
                Predicate::MinMarketCap(1e9),
                Predicate::SectorNotIn(vec![SECTOR_FINANCIALS, SECTOR_UTILITIES]),
            ],
            scoring: Scoring::RankSum {
                components: vec![
                    RankComponent {
                        column: "earnings_yield".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                    RankComponent {
                        column: "roic".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                ],
                divisor: 1.0,
            },
            selection: Selection::Top {
                n: 25,
                best: SelectBest::Lowest,
            },
        },
        allocator: Allocator::CappedEqualWeight { max_position: 0.04 },
        gross_leverage: 1.0,
        rebalance: RebalanceRule::MonthStart {
            days_offset: 4,
            month: Some(1),
        },
        liquidate: Some(RebalanceRule::EveryDay { month: Some(12) }),
        long_only: true,
    }
}

/// Tobias Carlisle's Acquirer's Multiple: lowest EV over trailing-twelve-
/// month EBIT, top 25 equal weight, rebalanced yearly in the month the
/// strategy first ran.
pub fn acquirers_multiple() -> Strategy {
    Strategy {
        name: "acquirers-multiple".into(),
        description: "Lowest EV/EBIT(TTM), top 25, anchored yearly rebalance".into(),
        kind: StrategyKind::AcquirersMultiple,
        pipeline: Pipeline {
            predicates: vec![
                Predicate::PrimaryShareOnly,
                Predicate::CommonStockOnly,
                Predicate::NotDepositaryReceipt,
                Predicate::NotOtc,
                Predicate::NotWhenIssued,
                Predicate::NotLimitedPartnership,
                Predicate::HasMarketCap,
                Predicate::SectorNotIn(vec![SECTOR_FINANCIALS]),
                Predicate::ScoreAbove {
                    column: "ebit_ttm".into(),
                    threshold: 0.0,
                },
            ],
            scoring: Scoring::Raw {
                column: "ev_over_ebit".into(),
            },
            selection: Selection::Top {
                n: 25,
                best: SelectBest::Lowest,
            },
        },
        allocator: Allocator::EqualWeight {
            safety_margin: 0.99,
        },
        gross_leverage: 1.0,
        rebalance: RebalanceRule::AnchoredMonthly,
        liquidate: None,
        long_only: true,
    }
}

/// Piotroski F-Score long/short: long the strongest composites, short the
/// weakest, ten a side, at each month end.
pub fn piotroski_fscore() -> Strategy {
    Strategy {
        name: "piotroski-fscore".into(),
        description: "F-Score >= 7 long / <= 3 short, 10 a side, monthly".into(),
        kind: StrategyKind::PiotroskiFScore,
        pipeline: Pipeline {
            predicates: vec![
                Predicate::ScoreAbove {
                    column: "ev_to_ebitda".into(),
                    threshold: 0.0,
                },
                Predicate::MinMarketCap(1e9),
                Predicate::ScoreOutside {
                    column: "fscore".into(),
                    low: 3.0,
                    high: 7.0,
                },
            ],
            scoring: Scoring::Raw {
                column: "fscore".into(),
            },
            selection: Selection::LongShort { per_side: 10 },
        },
        allocator: Allocator::LongShort,
        gross_leverage: 1.0,
        rebalance: RebalanceRule::MonthEnd { days_offset: 0 },
        liquidate: None,
        long_only: false,
    }
}

/// Multi-ratio value composite over the largest low-volatility names with
/// positive momentum, top 25 monthly.
pub fn value_composite() -> Strategy {
    Strategy {
        name: "value-composite".into(),
        description: "Seven-ratio rank blend over low-volatility large caps, top 25".into(),
        kind: StrategyKind::ValueComposite,
        pipeline: Pipeline {
            predicates: vec![
                Predicate::HasSector,
                Predicate::TopKBy {
                    column: "market_cap".into(),
                    k: 2000,
                    order: RankOrder::Descending,
                },
                Predicate::TopKBy {
                    column: "volatility".into(),
                    k: 600,
                    order: RankOrder::Ascending,
                },
                Predicate::ScoreAbove {
                    column: "momentum".into(),
                    threshold: 1.0,
                },
            ],
            scoring: Scoring::RankSum {
                components: vec![
                    RankComponent {
                        column: "pb_ratio".into(),
                        weight: 1.0,
                        order: RankOrder::Ascending,
                    },
                    RankComponent {
                        column: "pe_ratio".into(),
                        weight: 1.0,
                        order: RankOrder::Ascending,
                    },
                    RankComponent {
                        column: "dividend_yield".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                    RankComponent {
                        column: "roa".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                    RankComponent {
                        column: "roe".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                    RankComponent {
                        column: "roic".into(),
                        weight: 2.0,
                        order: RankOrder::Descending,
                    },
                    RankComponent {
                        column: "earnings_yield".into(),
                        weight: 1.0,
                        order: RankOrder::Descending,
                    },
                ],
                divisor: 8.0,
            },
            selection: Selection::Top {
                n: 25,
                best: SelectBest::Lowest,
            },
        },
        allocator: Allocator::CappedEqualWeight { max_position: 0.04 },
        gross_leverage: 1.0,
        rebalance: RebalanceRule::MonthStart {
            days_offset: 0,
            month: None,
        },
        liquidate: None,
        long_only: true,
    }
}

/// All built-in strategies.
pub fn all() -> Vec<Strategy> {
    vec![
        magic_formula(),
        acquirers_multiple(),
        piotroski_fscore(),
        value_composite(),
    ]
}

/// Look up a built-in strategy by its kebab-case name.
pub fn by_name(name: &str) -> Result<Strategy, QuantscreenError> {
    all()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| QuantscreenError::UnknownStrategy {
            name: name.to_string(),
        })
}

impl StrategyKind {
    /// Rows of history each snapshot needs. The trailing-twelve-month sum
    /// looks back a full year of daily observations; the F-Score compares
    /// against the year-ago row; momentum and volatility need 30 closes.
    pub fn lookback(&self) -> usize {
        match self {
            StrategyKind::MagicFormula => 1,
            StrategyKind::AcquirersMultiple => 261,
            StrategyKind::PiotroskiFScore => 252,
            StrategyKind::ValueComposite => 30,
        }
    }

    /// Compute this recipe's score columns from the snapshot. Missing
    /// series become NaN columns; only shape violations are errors.
    pub fn compute_columns(
        &self,
        snapshot: &MarketSnapshot,
    ) -> Result<ScoreColumns, QuantscreenError> {
        let n = snapshot.securities.len();
        let mut columns = ScoreColumns::new(n);

        match self {
            StrategyKind::MagicFormula => {
                let ebit = snapshot.latest(Field::Ebit);
                let ev = snapshot.latest(Field::EnterpriseValue);
                columns.insert("earnings_yield", factor::ratio(&ebit, &ev))?;
                columns.insert("roic", snapshot.latest(Field::Roic))?;
            }
            StrategyKind::AcquirersMultiple => {
                let ebit_ttm = match (
                    snapshot.window(Field::Ebit),
                    snapshot.asof_window(Field::Ebit),
                ) {
                    (Some(values), Some(asof)) => trailing_twelve_months(values, asof)?.total,
                    _ => vec![f64::NAN; n],
                };
                let ev = snapshot.latest(Field::EnterpriseValue);
                columns.insert("ev_over_ebit", factor::ratio(&ev, &ebit_ttm))?;
                columns.insert("ebit_ttm", ebit_ttm)?;
            }
            StrategyKind::PiotroskiFScore => {
                let inputs = FScoreInputs {
                    roa: metric_pair(snapshot, Field::Roa),
                    operating_cash_flow: snapshot.latest(Field::OperatingCashFlow),
                    cash_flow_from_ops: snapshot.latest(Field::CashFlowFromOps),
                    long_term_debt_equity: metric_pair(snapshot, Field::LongTermDebtEquity),
                    current_ratio: metric_pair(snapshot, Field::CurrentRatio),
                    shares_outstanding: metric_pair(snapshot, Field::SharesOutstanding),
                    gross_margin: metric_pair(snapshot, Field::GrossMargin),
                    assets_turnover: metric_pair(snapshot, Field::AssetsTurnover),
                };
                columns.insert("fscore", piotroski_f_score(&inputs))?;
                columns.insert("ev_to_ebitda", snapshot.latest(Field::EvToEbitda))?;
            }
            StrategyKind::ValueComposite => {
                columns.insert("market_cap", snapshot.market_caps())?;
                match snapshot.window(Field::Close) {
                    Some(close) => {
                        columns.insert("momentum", factor::momentum(close))?;
                        columns.insert("volatility", factor::volatility(close, 15))?;
                    }
                    None => {
                        columns.insert("momentum", vec![f64::NAN; n])?;
                        columns.insert("volatility", vec![f64::NAN; n])?;
                    }
                }
                for field in [
                    Field::PbRatio,
                    Field::PeRatio,
                    Field::DividendYield,
                    Field::Roa,
                    Field::Roe,
                    Field::Roic,
                ] {
                    let values = match snapshot.window(field) {
                        Some(w) => factor::filled_latest(w),
                        None => vec![f64::NAN; n],
                    };
                    columns.insert(field.to_string(), values)?;
                }
                let ebit = snapshot.latest(Field::Ebit);
                let ev = snapshot.latest(Field::EnterpriseValue);
                columns.insert("earnings_yield", factor::ratio(&ebit, &ev))?;
            }
        }

        Ok(columns)
    }
}

fn metric_pair(snapshot: &MarketSnapshot, field: Field) -> MetricPair {
    match snapshot.window(field) {
        Some(w) => MetricPair::from_window(w),
        None => MetricPair {
            prior: vec![f64::NAN; snapshot.securities.len()],
            current: vec![f64::NAN; snapshot.securities.len()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::security::{SecurityId, SecurityMeta};
    use crate::domain::window::{DateWindow, FactorWindow};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<SecurityId> {
        names.iter().map(|n| SecurityId::new(*n)).collect()
    }

    fn single_row(snapshot: &mut MarketSnapshot, field: Field, values: Vec<f64>) {
        let w = FactorWindow::new(
            vec![snapshot.date],
            snapshot.securities.clone(),
            vec![values],
        )
        .unwrap();
        snapshot.series.insert(field, w);
    }

    fn base_snapshot(names: &[&str]) -> MarketSnapshot {
        let securities = ids(names);
        let mut snap = MarketSnapshot::new(date(2024, 6, 3), securities.clone());
        for id in &securities {
            snap.meta.insert(
                id.clone(),
                SecurityMeta {
                    sector: Some(311),
                    market_cap: 5e9,
                    ..SecurityMeta::default()
                },
            );
        }
        snap
    }

    #[test]
    fn by_name_finds_all_builtins() {
        for strategy in all() {
            let found = by_name(&strategy.name).unwrap();
            assert_eq!(found.name, strategy.name);
        }
    }

    #[test]
    fn by_name_rejects_unknown() {
        let result = by_name("dogs-of-the-dow");
        assert!(matches!(
            result,
            Err(QuantscreenError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn magic_formula_ranks_by_yield_plus_roic() {
        let mut snap = base_snapshot(&["CHEAP", "MIXED", "DEAR"]);
        single_row(&mut snap, Field::Ebit, vec![30.0, 20.0, 5.0]);
        single_row(&mut snap, Field::EnterpriseValue, vec![100.0, 100.0, 100.0]);
        single_row(&mut snap, Field::Roic, vec![0.30, 0.20, 0.05]);

        let mut strategy = magic_formula();
        strategy.pipeline.selection.set_capacity(2);
        let out = strategy.evaluate(&snap).unwrap();
        assert_eq!(out.longs, ids(&["CHEAP", "MIXED"]));
    }

    #[test]
    fn magic_formula_excludes_financials_and_small_caps() {
        let mut snap = base_snapshot(&["GOOD", "BANK", "TINY"]);
        snap.meta.get_mut(&SecurityId::new("BANK")).unwrap().sector = Some(SECTOR_FINANCIALS);
        snap.meta
            .get_mut(&SecurityId::new("TINY"))
            .unwrap()
            .market_cap = 5e8;
        single_row(&mut snap, Field::Ebit, vec![10.0, 10.0, 10.0]);
        single_row(&mut snap, Field::EnterpriseValue, vec![100.0, 100.0, 100.0]);
        single_row(&mut snap, Field::Roic, vec![0.10, 0.10, 0.10]);

        let out = magic_formula().evaluate(&snap).unwrap();
        assert_eq!(out.longs, ids(&["GOOD"]));
    }

    #[test]
    fn acquirers_multiple_requires_positive_ttm_ebit() {
        let mut snap = base_snapshot(&["CHEAP", "LOSS"]);
        let dates = vec![date(2024, 3, 1), date(2024, 6, 3)];
        let values = FactorWindow::new(
            dates.clone(),
            snap.securities.clone(),
            vec![vec![10.0, -5.0], vec![12.0, -6.0]],
        )
        .unwrap();
        let asof = DateWindow::new(
            dates,
            snap.securities.clone(),
            vec![
                vec![Some(date(2024, 2, 15)), Some(date(2024, 2, 15))],
                vec![Some(date(2024, 5, 15)), Some(date(2024, 5, 15))],
            ],
        )
        .unwrap();
        snap.series.insert(Field::Ebit, values);
        snap.asof.insert(Field::Ebit, asof);
        single_row(&mut snap, Field::EnterpriseValue, vec![200.0, 200.0]);

        let out = acquirers_multiple().evaluate(&snap).unwrap();
        assert_eq!(out.longs, ids(&["CHEAP"]));
        // TTM is the sum of the two distinct quarters: 10 + 12.
        assert_eq!(out.composite_of(&SecurityId::new("CHEAP")), 200.0 / 22.0);
    }

    #[test]
    fn piotroski_gates_on_score_band() {
        let mut snap = base_snapshot(&["STRONG", "BLAND", "WEAK"]);
        let dates = vec![date(2023, 6, 1), date(2024, 6, 3)];
        let securities = snap.securities.clone();
        let pair_window = |prior: [f64; 3], current: [f64; 3]| {
            FactorWindow::new(
                dates.clone(),
                securities.clone(),
                vec![prior.to_vec(), current.to_vec()],
            )
            .unwrap()
        };
        snap.series.insert(
            Field::Roa,
            pair_window([0.05, 0.05, 0.10], [0.10, 0.06, -0.05]),
        );
        snap.series.insert(
            Field::LongTermDebtEquity,
            pair_window([0.8, 0.6, 0.5], [0.5, 0.6, 0.9]),
        );
        snap.series.insert(
            Field::CurrentRatio,
            pair_window([1.2, 1.2, 1.5], [1.5, 1.2, 1.1]),
        );
        snap.series.insert(
            Field::SharesOutstanding,
            pair_window([100.0, 100.0, 100.0], [100.0, 100.0, 120.0]),
        );
        snap.series.insert(
            Field::GrossMargin,
            pair_window([0.30, 0.30, 0.35], [0.35, 0.30, 0.25]),
        );
        snap.series.insert(
            Field::AssetsTurnover,
            pair_window([0.9, 0.9, 1.1], [1.1, 0.9, 0.8]),
        );
        single_row(
            &mut snap,
            Field::OperatingCashFlow,
            vec![1000.0, 10.0, -100.0],
        );
        single_row(&mut snap, Field::CashFlowFromOps, vec![500.0, -1.0, -200.0]);
        single_row(&mut snap, Field::EvToEbitda, vec![8.0, 8.0, 8.0]);

        let out = piotroski_fscore().evaluate(&snap).unwrap();
        // STRONG scores 9, WEAK scores 0, BLAND sits mid-band and is
        // filtered out before selection.
        assert_eq!(out.longs, ids(&["STRONG"]));
        assert_eq!(out.shorts, ids(&["WEAK"]));
        assert!(!out.mask[1]);
    }

    #[test]
    fn value_composite_momentum_gate() {
        let mut snap = base_snapshot(&["UP", "DOWN"]);
        // 30 rows; UP trends up, DOWN trends down.
        let dates: Vec<NaiveDate> = (0..30)
            .map(|i| date(2024, 4, 1) + chrono::Days::new(i))
            .collect();
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![100.0 + i as f64, 100.0 - i as f64])
            .collect();
        let close = FactorWindow::new(dates, snap.securities.clone(), rows).unwrap();
        snap.series.insert(Field::Close, close);

        for field in [
            Field::PbRatio,
            Field::PeRatio,
            Field::DividendYield,
            Field::Roa,
            Field::Roe,
            Field::Roic,
        ] {
            single_row(&mut snap, field, vec![1.0, 1.0]);
        }
        single_row(&mut snap, Field::Ebit, vec![10.0, 10.0]);
        single_row(&mut snap, Field::EnterpriseValue, vec![100.0, 100.0]);

        let out = value_composite().evaluate(&snap).unwrap();
        assert_eq!(out.longs, ids(&["UP"]));
        assert!(!out.mask[1]);
    }

    #[test]
    fn value_composite_forward_fills_sparse_ratios() {
        let mut snap = base_snapshot(&["A"]);
        let dates: Vec<NaiveDate> = (0..30)
            .map(|i| date(2024, 4, 1) + chrono::Days::new(i))
            .collect();
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![100.0 + i as f64]).collect();
        snap.series.insert(
            Field::Close,
            FactorWindow::new(dates, snap.securities.clone(), rows).unwrap(),
        );

        // P/B reported once, mid-window; the latest row alone would be NaN.
        let mut pb_rows = vec![vec![f64::NAN]; 3];
        pb_rows[1] = vec![2.5];
        snap.series.insert(
            Field::PbRatio,
            FactorWindow::new(
                vec![date(2024, 5, 1), date(2024, 5, 15), date(2024, 6, 3)],
                snap.securities.clone(),
                pb_rows,
            )
            .unwrap(),
        );
        for field in [
            Field::PeRatio,
            Field::DividendYield,
            Field::Roa,
            Field::Roe,
            Field::Roic,
        ] {
            single_row(&mut snap, field, vec![1.0]);
        }
        single_row(&mut snap, Field::Ebit, vec![10.0]);
        single_row(&mut snap, Field::EnterpriseValue, vec![100.0]);

        let columns = StrategyKind::ValueComposite.compute_columns(&snap).unwrap();
        assert_eq!(columns.get("pb_ratio").unwrap(), &[2.5]);
    }
}
