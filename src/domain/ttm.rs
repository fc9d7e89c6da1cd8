//! Trailing-twelve-month aggregation of quarterly fundamentals.
//!
//! Quarterly feeds repeat each observation daily until the next report and
//! occasionally restate an old fiscal period. Summing a raw window would
//! count the same quarter many times, so the aggregate keys on the as-of
//! (report) date: keep observations reported within 52 weeks of the latest
//! as-of date in the column, take one value per distinct as-of date (first
//! occurrence in window order wins), and sum those.
//!
//! Known ambiguity, preserved on purpose: when more than four distinct
//! quarterly dates fall inside the 52-week lookback, all of them are summed
//! rather than capping at four.

use chrono::{Duration, NaiveDate};

use super::error::QuantscreenError;
use super::window::{DateWindow, FactorWindow};

const LOOKBACK_WEEKS: i64 = 52;

/// Per-security TTM sum plus the as-of date of the most recent window row.
#[derive(Debug, Clone, PartialEq)]
pub struct TtmOutput {
    pub total: Vec<f64>,
    pub asof: Vec<Option<NaiveDate>>,
}

pub fn trailing_twelve_months(
    values: &FactorWindow,
    asof: &DateWindow,
) -> Result<TtmOutput, QuantscreenError> {
    if values.rows() != asof.values.len() || values.width() != asof.securities.len() {
        return Err(QuantscreenError::WindowShape {
            reason: format!(
                "value window {}x{} does not match as-of window {}x{}",
                values.rows(),
                values.width(),
                asof.values.len(),
                asof.securities.len()
            ),
        });
    }

    let lookback = Duration::weeks(LOOKBACK_WEEKS);
    let mut total = Vec::with_capacity(values.width());
    let mut latest_asof = Vec::with_capacity(values.width());

    for col in 0..values.width() {
        let dates = asof.column(col);
        let latest = dates.iter().rev().find_map(|d| *d);

        let last_row_asof = dates.last().copied().flatten();
        latest_asof.push(last_row_asof);

        let Some(latest) = latest else {
            total.push(f64::NAN);
            continue;
        };

        let mut seen: Vec<NaiveDate> = Vec::new();
        let mut sum = 0.0;
        let mut any = false;
        for (row, date) in dates.iter().enumerate() {
            let Some(date) = date else { continue };
            if *date + lookback <= latest {
                continue;
            }
            if seen.contains(date) {
                continue;
            }
            seen.push(*date);
            sum += values.values[row][col];
            any = true;
        }
        total.push(if any { sum } else { f64::NAN });
    }

    Ok(TtmOutput {
        total,
        asof: latest_asof,
    })
}
