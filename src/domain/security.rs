//! Security identity and the per-date metadata consumed by universe filters.

use std::fmt;

/// Morningstar-style sector code for financial companies.
pub const SECTOR_FINANCIALS: i64 = 103;
/// Morningstar-style sector code for utilities.
pub const SECTOR_UTILITIES: i64 = 207;

/// Ticker identifier for a tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecurityId(String);

impl SecurityId {
    pub fn new(ticker: impl Into<String>) -> Self {
        SecurityId(ticker.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing and classification attributes for one security on one
/// observation date, supplied by the market data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityMeta {
    pub sector: Option<i64>,
    /// Most recent market capitalization; NaN when unknown.
    pub market_cap: f64,
    pub primary_share: bool,
    pub common_stock: bool,
    pub depositary_receipt: bool,
    pub otc: bool,
    pub when_issued: bool,
    pub limited_partnership: bool,
}

impl Default for SecurityMeta {
    fn default() -> Self {
        SecurityMeta {
            sector: None,
            market_cap: f64::NAN,
            primary_share: true,
            common_stock: true,
            depositary_receipt: false,
            otc: false,
            when_issued: false,
            limited_partnership: false,
        }
    }
}
