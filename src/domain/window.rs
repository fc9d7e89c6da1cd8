//! Point-in-time data windows (time x security) and the evaluation-date
//! snapshot bundle handed to strategy pipelines.
//!
//! Windows are row-major: `values[row][col]` where rows run oldest to newest
//! and columns line up with the `securities` list. Missing data is NaN, never
//! an error.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use super::error::QuantscreenError;
use super::security::{SecurityId, SecurityMeta};

/// Fundamental and price fields a snapshot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ebit,
    EnterpriseValue,
    EvToEbitda,
    MarketCap,
    PbRatio,
    PeRatio,
    Roa,
    Roe,
    Roic,
    DividendYield,
    Close,
    OperatingCashFlow,
    CashFlowFromOps,
    LongTermDebtEquity,
    CurrentRatio,
    SharesOutstanding,
    GrossMargin,
    AssetsTurnover,
}

impl Field {
    /// Parse the snake_case name used in data files.
    pub fn parse(name: &str) -> Option<Field> {
        let field = match name {
            "ebit" => Field::Ebit,
            "enterprise_value" => Field::EnterpriseValue,
            "ev_to_ebitda" => Field::EvToEbitda,
            "market_cap" => Field::MarketCap,
            "pb_ratio" => Field::PbRatio,
            "pe_ratio" => Field::PeRatio,
            "roa" => Field::Roa,
            "roe" => Field::Roe,
            "roic" => Field::Roic,
            "dividend_yield" => Field::DividendYield,
            "close" => Field::Close,
            "operating_cash_flow" => Field::OperatingCashFlow,
            "cash_flow_from_ops" => Field::CashFlowFromOps,
            "long_term_debt_equity" => Field::LongTermDebtEquity,
            "current_ratio" => Field::CurrentRatio,
            "shares_outstanding" => Field::SharesOutstanding,
            "gross_margin" => Field::GrossMargin,
            "assets_turnover" => Field::AssetsTurnover,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Ebit => "ebit",
            Field::EnterpriseValue => "enterprise_value",
            Field::EvToEbitda => "ev_to_ebitda",
            Field::MarketCap => "market_cap",
            Field::PbRatio => "pb_ratio",
            Field::PeRatio => "pe_ratio",
            Field::Roa => "roa",
            Field::Roe => "roe",
            Field::Roic => "roic",
            Field::DividendYield => "dividend_yield",
            Field::Close => "close",
            Field::OperatingCashFlow => "operating_cash_flow",
            Field::CashFlowFromOps => "cash_flow_from_ops",
            Field::LongTermDebtEquity => "long_term_debt_equity",
            Field::CurrentRatio => "current_ratio",
            Field::SharesOutstanding => "shares_outstanding",
            Field::GrossMargin => "gross_margin",
            Field::AssetsTurnover => "assets_turnover",
        };
        write!(f, "{}", name)
    }
}

/// 2-D numeric window: rows are observation dates (oldest first), columns
/// are securities.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorWindow {
    pub dates: Vec<NaiveDate>,
    pub securities: Vec<SecurityId>,
    pub values: Vec<Vec<f64>>,
}

impl FactorWindow {
    pub fn new(
        dates: Vec<NaiveDate>,
        securities: Vec<SecurityId>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, QuantscreenError> {
        if values.len() != dates.len() {
            return Err(QuantscreenError::WindowShape {
                reason: format!("{} rows of values for {} dates", values.len(), dates.len()),
            });
        }
        for row in &values {
            if row.len() != securities.len() {
                return Err(QuantscreenError::WindowShape {
                    reason: format!(
                        "row width {} does not match {} securities",
                        row.len(),
                        securities.len()
                    ),
                });
            }
        }
        Ok(FactorWindow {
            dates,
            securities,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.dates.len()
    }

    pub fn width(&self) -> usize {
        self.securities.len()
    }

    /// Last row of the window; all-NaN when the window is empty.
    pub fn last_row(&self) -> Vec<f64> {
        match self.values.last() {
            Some(row) => row.clone(),
            None => vec![f64::NAN; self.width()],
        }
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[col]).collect()
    }
}

/// As-of (report) dates aligned with a [`FactorWindow`]. A `None` cell means
/// the observation carried no report date.
#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    pub dates: Vec<NaiveDate>,
    pub securities: Vec<SecurityId>,
    pub values: Vec<Vec<Option<NaiveDate>>>,
}

impl DateWindow {
    pub fn new(
        dates: Vec<NaiveDate>,
        securities: Vec<SecurityId>,
        values: Vec<Vec<Option<NaiveDate>>>,
    ) -> Result<Self, QuantscreenError> {
        if values.len() != dates.len() {
            return Err(QuantscreenError::WindowShape {
                reason: format!("{} rows of as-of dates for {} dates", values.len(), dates.len()),
            });
        }
        for row in &values {
            if row.len() != securities.len() {
                return Err(QuantscreenError::WindowShape {
                    reason: format!(
                        "as-of row width {} does not match {} securities",
                        row.len(),
                        securities.len()
                    ),
                });
            }
        }
        Ok(DateWindow {
            dates,
            securities,
            values,
        })
    }

    pub fn column(&self, col: usize) -> Vec<Option<NaiveDate>> {
        self.values.iter().map(|row| row[col]).collect()
    }
}

/// Everything a pipeline needs for one evaluation date. Recomputed fully on
/// each scheduled evaluation; nothing here persists across days.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub date: NaiveDate,
    pub securities: Vec<SecurityId>,
    pub meta: HashMap<SecurityId, SecurityMeta>,
    pub series: HashMap<Field, FactorWindow>,
    pub asof: HashMap<Field, DateWindow>,
}

impl MarketSnapshot {
    pub fn new(date: NaiveDate, securities: Vec<SecurityId>) -> Self {
        MarketSnapshot {
            date,
            securities,
            meta: HashMap::new(),
            series: HashMap::new(),
            asof: HashMap::new(),
        }
    }

    pub fn window(&self, field: Field) -> Option<&FactorWindow> {
        self.series.get(&field)
    }

    pub fn asof_window(&self, field: Field) -> Option<&DateWindow> {
        self.asof.get(&field)
    }

    /// Latest value per security for a field; all-NaN when the series is
    /// absent or empty.
    pub fn latest(&self, field: Field) -> Vec<f64> {
        match self.series.get(&field) {
            Some(w) => w.last_row(),
            None => vec![f64::NAN; self.securities.len()],
        }
    }

    pub fn meta_of(&self, id: &SecurityId) -> SecurityMeta {
        self.meta.get(id).cloned().unwrap_or_default()
    }

    /// Market caps in universe order, pulled from metadata.
    pub fn market_caps(&self) -> Vec<f64> {
        self.securities
            .iter()
            .map(|id| self.meta_of(id).market_cap)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<SecurityId> {
        names.iter().map(|n| SecurityId::new(*n)).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn field_parse_round_trips() {
        for name in [
            "ebit",
            "enterprise_value",
            "ev_to_ebitda",
            "market_cap",
            "pb_ratio",
            "pe_ratio",
            "roa",
            "roe",
            "roic",
            "dividend_yield",
            "close",
            "operating_cash_flow",
            "cash_flow_from_ops",
            "long_term_debt_equity",
            "current_ratio",
            "shares_outstanding",
            "gross_margin",
            "assets_turnover",
        ] {
            let field = Field::parse(name).unwrap();
            assert_eq!(field.to_string(), name);
        }
    }

    #[test]
    fn field_parse_rejects_unknown() {
        assert!(Field::parse("free_cash_flow").is_none());
    }

    #[test]
    fn window_shape_is_validated() {
        let result = FactorWindow::new(
            vec![date(2024, 1, 1), date(2024, 1, 2)],
            ids(&["A", "B"]),
            vec![vec![1.0, 2.0]],
        );
        assert!(matches!(result, Err(QuantscreenError::WindowShape { .. })));

        let result = FactorWindow::new(
            vec![date(2024, 1, 1)],
            ids(&["A", "B"]),
            vec![vec![1.0]],
        );
        assert!(matches!(result, Err(QuantscreenError::WindowShape { .. })));
    }

    #[test]
    fn last_row_and_column() {
        let w = FactorWindow::new(
            vec![date(2024, 1, 1), date(2024, 1, 2)],
            ids(&["A", "B"]),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();
        assert_eq!(w.last_row(), vec![3.0, 4.0]);
        assert_eq!(w.column(1), vec![2.0, 4.0]);
    }

    #[test]
    fn empty_window_last_row_is_nan() {
        let w = FactorWindow::new(vec![], ids(&["A", "B"]), vec![]).unwrap();
        let row = w.last_row();
        assert_eq!(row.len(), 2);
        assert!(row.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn snapshot_latest_without_series_is_nan() {
        let snap = MarketSnapshot::new(date(2024, 6, 3), ids(&["A", "B", "C"]));
        let latest = snap.latest(Field::Ebit);
        assert_eq!(latest.len(), 3);
        assert!(latest.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn snapshot_meta_defaults_for_unknown_security() {
        let snap = MarketSnapshot::new(date(2024, 6, 3), ids(&["A"]));
        let meta = snap.meta_of(&SecurityId::new("A"));
        assert!(meta.market_cap.is_nan());
    }
}
