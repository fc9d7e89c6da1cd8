//! Factor computations over point-in-time windows.
//!
//! Every function produces one value per security column and propagates NaN
//! instead of raising: a zero or NaN denominator, a too-short window, or a
//! missing observation all yield NaN for that security and leave the rest of
//! the batch untouched.

use super::window::FactorWindow;

/// Latest observation per security (last window row).
pub fn latest(window: &FactorWindow) -> Vec<f64> {
    window.last_row()
}

/// Elementwise `numer / denom`. NaN if either side is NaN or the denominator
/// is zero.
pub fn ratio(numer: &[f64], denom: &[f64]) -> Vec<f64> {
    numer
        .iter()
        .zip(denom.iter())
        .map(|(&n, &d)| {
            if n.is_nan() || d.is_nan() || d == 0.0 {
                f64::NAN
            } else {
                n / d
            }
        })
        .collect()
}

/// Forward-fill scattered NaNs down each security column: a NaN cell takes
/// the most recent preceding non-NaN value in the same window. Leading NaNs
/// stay NaN. O(rows) per column.
pub fn forward_fill(window: &FactorWindow) -> FactorWindow {
    let mut filled = window.clone();
    for col in 0..filled.width() {
        let mut last_seen = f64::NAN;
        for row in 0..filled.rows() {
            let v = filled.values[row][col];
            if v.is_nan() {
                filled.values[row][col] = last_seen;
            } else {
                last_seen = v;
            }
        }
    }
    filled
}

/// Forward-fill, then take the latest row. This is how the sparse valuation
/// ratios (P/B, P/E, dividend yield, ROA/ROE/ROIC) are read.
pub fn filled_latest(window: &FactorWindow) -> Vec<f64> {
    forward_fill(window).last_row()
}

/// Price momentum: close 10 rows before the window end divided by close at
/// the window start. NaN per security when the window is shorter than 10
/// rows or either price is missing or zero.
pub fn momentum(close: &FactorWindow) -> Vec<f64> {
    let rows = close.rows();
    if rows < 10 {
        return vec![f64::NAN; close.width()];
    }
    let recent = &close.values[rows - 10];
    let start = &close.values[0];
    ratio(recent, start)
}

/// Population standard deviation of close over the last `period` rows.
/// NaN per security when fewer than `period` rows are available or any
/// price in the span is missing.
pub fn volatility(close: &FactorWindow, period: usize) -> Vec<f64> {
    let rows = close.rows();
    if rows < period || period == 0 {
        return vec![f64::NAN; close.width()];
    }
    let start = rows - period;
    (0..close.width())
        .map(|col| {
            let span: Vec<f64> = (start..rows).map(|row| close.values[row][col]).collect();
            if span.iter().any(|v| v.is_nan()) {
                return f64::NAN;
            }
            let mean = span.iter().sum::<f64>() / period as f64;
            let variance = span
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            variance.sqrt()
        })
        .collect()
}
