//! Piotroski F-Score: a 0-9 composite of profitability, leverage, and
//! operating-efficiency checks against the year-ago observation.
//!
//! Each check contributes one point when it holds. A comparison involving
//! NaN scores zero, and a security with no usable input at all scores NaN so
//! that missing data cannot read as a conviction short.

use super::window::FactorWindow;

/// Year-ago and current observations for one metric, aligned by security.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPair {
    pub prior: Vec<f64>,
    pub current: Vec<f64>,
}

impl MetricPair {
    /// First window row as the year-ago value, last row as the current one.
    pub fn from_window(window: &FactorWindow) -> Self {
        let prior = match window.values.first() {
            Some(row) => row.clone(),
            None => vec![f64::NAN; window.width()],
        };
        MetricPair {
            prior,
            current: window.last_row(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FScoreInputs {
    pub roa: MetricPair,
    pub operating_cash_flow: Vec<f64>,
    pub cash_flow_from_ops: Vec<f64>,
    pub long_term_debt_equity: MetricPair,
    pub current_ratio: MetricPair,
    pub shares_outstanding: MetricPair,
    pub gross_margin: MetricPair,
    pub assets_turnover: MetricPair,
}

fn point(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Compute the 0-9 F-Score per security.
pub fn piotroski_f_score(inputs: &FScoreInputs) -> Vec<f64> {
    let n = inputs.roa.current.len();
    let mut scores = Vec::with_capacity(n);

    for i in 0..n {
        let roa_now = inputs.roa.current[i];
        let roa_then = inputs.roa.prior[i];
        let ocf = inputs.operating_cash_flow[i];
        let cffo = inputs.cash_flow_from_ops[i];
        let ltde_now = inputs.long_term_debt_equity.current[i];
        let ltde_then = inputs.long_term_debt_equity.prior[i];
        let cr_now = inputs.current_ratio.current[i];
        let cr_then = inputs.current_ratio.prior[i];
        let sh_now = inputs.shares_outstanding.current[i];
        let sh_then = inputs.shares_outstanding.prior[i];
        let gm_now = inputs.gross_margin.current[i];
        let gm_then = inputs.gross_margin.prior[i];
        let at_now = inputs.assets_turnover.current[i];
        let at_then = inputs.assets_turnover.prior[i];

        let all_missing = [
            roa_now, roa_then, ocf, cffo, ltde_now, ltde_then, cr_now, cr_then, sh_now, sh_then,
            gm_now, gm_then, at_now, at_then,
        ]
        .iter()
        .all(|v| v.is_nan());
        if all_missing {
            scores.push(f64::NAN);
            continue;
        }

        let profitability = point(roa_now > 0.0)
            + point(ocf > 0.0)
            + point(roa_now > roa_then)
            + point(cffo > roa_now);

        let leverage = point(ltde_now < ltde_then)
            + point(cr_now > cr_then)
            + point(sh_now <= sh_then);

        let efficiency = point(gm_now > gm_then) + point(at_now > at_then);

        scores.push(profitability + leverage + efficiency);
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(prior: f64, current: f64) -> MetricPair {
        MetricPair {
            prior: vec![prior],
            current: vec![current],
        }
    }

    fn strong_inputs() -> FScoreInputs {
        FScoreInputs {
            roa: pair(0.05, 0.10),
            operating_cash_flow: vec![1000.0],
            cash_flow_from_ops: vec![500.0],
            long_term_debt_equity: pair(0.8, 0.5),
            current_ratio: pair(1.2, 1.5),
            shares_outstanding: pair(100.0, 100.0),
            gross_margin: pair(0.30, 0.35),
            assets_turnover: pair(0.9, 1.1),
        }
    }

    #[test]
    fn perfect_nine() {
        let scores = piotroski_f_score(&strong_inputs());
        assert_eq!(scores, vec![9.0]);
    }

    #[test]
    fn weak_company_scores_low() {
        let inputs = FScoreInputs {
            roa: pair(0.10, -0.05),
            operating_cash_flow: vec![-100.0],
            cash_flow_from_ops: vec![-200.0],
            long_term_debt_equity: pair(0.5, 0.9),
            current_ratio: pair(1.5, 1.1),
            shares_outstanding: pair(100.0, 120.0),
            gross_margin: pair(0.35, 0.25),
            assets_turnover: pair(1.1, 0.8),
        };
        // -200 > -0.05 is false, so even the cash-flow-vs-ROA check fails.
        let scores = piotroski_f_score(&inputs);
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn share_issuance_loses_the_point() {
        let mut inputs = strong_inputs();
        inputs.shares_outstanding = pair(100.0, 110.0);
        assert_eq!(piotroski_f_score(&inputs), vec![8.0]);
    }

    #[test]
    fn nan_comparison_scores_zero_for_that_check() {
        let mut inputs = strong_inputs();
        inputs.gross_margin = pair(f64::NAN, 0.35);
        assert_eq!(piotroski_f_score(&inputs), vec![8.0]);
    }

    #[test]
    fn all_nan_security_scores_nan() {
        let nan_pair = pair(f64::NAN, f64::NAN);
        let inputs = FScoreInputs {
            roa: nan_pair.clone(),
            operating_cash_flow: vec![f64::NAN],
            cash_flow_from_ops: vec![f64::NAN],
            long_term_debt_equity: nan_pair.clone(),
            current_ratio: nan_pair.clone(),
            shares_outstanding: nan_pair.clone(),
            gross_margin: nan_pair.clone(),
            assets_turnover: nan_pair,
        };
        assert!(piotroski_f_score(&inputs)[0].is_nan());
    }

    #[test]
    fn scores_are_per_security() {
        let inputs = FScoreInputs {
            roa: MetricPair {
                prior: vec![0.05, 0.10],
                current: vec![0.10, -0.05],
            },
            operating_cash_flow: vec![1000.0, -100.0],
            cash_flow_from_ops: vec![500.0, -200.0],
            long_term_debt_equity: MetricPair {
                prior: vec![0.8, 0.5],
                current: vec![0.5, 0.9],
            },
            current_ratio: MetricPair {
                prior: vec![1.2, 1.5],
                current: vec![1.5, 1.1],
            },
            shares_outstanding: MetricPair {
                prior: vec![100.0, 100.0],
                current: vec![100.0, 120.0],
            },
            gross_margin: MetricPair {
                prior: vec![0.30, 0.35],
                current: vec![0.35, 0.25],
            },
            assets_turnover: MetricPair {
                prior: vec![0.9, 1.1],
                current: vec![1.1, 0.8],
            },
        };
        assert_eq!(piotroski_f_score(&inputs), vec![9.0, 0.0]);
    }

    #[test]
    fn metric_pair_from_window_reads_first_and_last_rows() {
        use crate::domain::security::SecurityId;
        use chrono::NaiveDate;

        let w = FactorWindow::new(
            vec![
                NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            ],
            vec![SecurityId::new("A")],
            vec![vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap();
        let pair = MetricPair::from_window(&w);
        assert_eq!(pair.prior, vec![1.0]);
        assert_eq!(pair.current, vec![3.0]);
    }
}
