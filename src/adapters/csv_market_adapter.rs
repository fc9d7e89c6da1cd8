//! CSV file market data adapter for offline runs.
//!
//! Expects three files under the data directory:
//!   securities.csv   — security,sector,market_cap,primary_share,common_stock,
//!                      depositary_receipt,otc,when_issued,limited_partnership
//!   prices.csv       — security,date,close
//!   fundamentals.csv — security,field,date,asof_date,value
//!
//! Everything is loaded up front; snapshots are assembled per date from the
//! in-memory series. Blank numeric cells become NaN, blank as-of cells
//! become None.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::domain::error::QuantscreenError;
use crate::domain::security::{SecurityId, SecurityMeta};
use crate::domain::window::{DateWindow, FactorWindow, Field, MarketSnapshot};
use crate::ports::market_port::MarketDataPort;

#[derive(Default)]
struct DayObservations {
    values: HashMap<SecurityId, f64>,
    asof: HashMap<SecurityId, NaiveDate>,
}

pub struct CsvMarketAdapter {
    securities: Vec<SecurityId>,
    meta: HashMap<SecurityId, SecurityMeta>,
    prices: BTreeMap<NaiveDate, HashMap<SecurityId, f64>>,
    fundamentals: HashMap<Field, BTreeMap<NaiveDate, DayObservations>>,
}

impl CsvMarketAdapter {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, QuantscreenError> {
        let dir = data_dir.as_ref();
        let mut adapter = CsvMarketAdapter {
            securities: Vec::new(),
            meta: HashMap::new(),
            prices: BTreeMap::new(),
            fundamentals: HashMap::new(),
        };
        adapter.load_securities(&dir.join("securities.csv"))?;
        adapter.load_prices(&dir.join("prices.csv"))?;
        adapter.load_fundamentals(&dir.join("fundamentals.csv"))?;
        adapter.securities.sort();
        Ok(adapter)
    }

    fn load_securities(&mut self, path: &PathBuf) -> Result<(), QuantscreenError> {
        let mut rdr = open_reader(path)?;
        for result in rdr.records() {
            let record = parse_record(result, path)?;
            let id = SecurityId::new(cell(&record, 0, "security", path)?);
            let meta = SecurityMeta {
                sector: parse_opt_i64(cell(&record, 1, "sector", path)?, path)?,
                market_cap: parse_f64(cell(&record, 2, "market_cap", path)?, path)?,
                primary_share: parse_bool(cell(&record, 3, "primary_share", path)?),
                common_stock: parse_bool(cell(&record, 4, "common_stock", path)?),
                depositary_receipt: parse_bool(cell(&record, 5, "depositary_receipt", path)?),
                otc: parse_bool(cell(&record, 6, "otc", path)?),
                when_issued: parse_bool(cell(&record, 7, "when_issued", path)?),
                limited_partnership: parse_bool(cell(&record, 8, "limited_partnership", path)?),
            };
            self.securities.push(id.clone());
            self.meta.insert(id, meta);
        }
        if self.securities.is_empty() {
            return Err(QuantscreenError::Data {
                reason: format!("{}: no securities", path.display()),
            });
        }
        Ok(())
    }

    fn load_prices(&mut self, path: &PathBuf) -> Result<(), QuantscreenError> {
        let mut rdr = open_reader(path)?;
        for result in rdr.records() {
            let record = parse_record(result, path)?;
            let id = SecurityId::new(cell(&record, 0, "security", path)?);
            let date = parse_date(cell(&record, 1, "date", path)?, path)?;
            let close = parse_f64(cell(&record, 2, "close", path)?, path)?;
            self.prices.entry(date).or_default().insert(id, close);
        }
        Ok(())
    }

    fn load_fundamentals(&mut self, path: &PathBuf) -> Result<(), QuantscreenError> {
        let mut rdr = open_reader(path)?;
        for result in rdr.records() {
            let record = parse_record(result, path)?;
            let id = SecurityId::new(cell(&record, 0, "security", path)?);
            let field_name = cell(&record, 1, "field", path)?;
            let field = Field::parse(field_name).ok_or_else(|| QuantscreenError::Data {
                reason: format!("{}: unknown field {:?}", path.display(), field_name),
            })?;
            let date = parse_date(cell(&record, 2, "date", path)?, path)?;
            let asof_raw = cell(&record, 3, "asof_date", path)?;
            let value = parse_f64(cell(&record, 4, "value", path)?, path)?;

            let day = self
                .fundamentals
                .entry(field)
                .or_default()
                .entry(date)
                .or_default();
            day.values.insert(id.clone(), value);
            if !asof_raw.is_empty() {
                day.asof.insert(id, parse_date(asof_raw, path)?);
            }
        }
        Ok(())
    }

    fn close_window(&self, date: NaiveDate, lookback: usize) -> FactorWindow {
        let dates: Vec<NaiveDate> = tail_dates(self.prices.keys(), date, lookback);
        let values = dates
            .iter()
            .map(|d| {
                let row = &self.prices[d];
                self.securities
                    .iter()
                    .map(|id| row.get(id).copied().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();
        FactorWindow {
            dates,
            securities: self.securities.clone(),
            values,
        }
    }

    fn fundamental_windows(
        &self,
        field: Field,
        series: &BTreeMap<NaiveDate, DayObservations>,
        date: NaiveDate,
        lookback: usize,
    ) -> (Field, FactorWindow, DateWindow) {
        let dates: Vec<NaiveDate> = tail_dates(series.keys(), date, lookback);
        let mut values = Vec::with_capacity(dates.len());
        let mut asof = Vec::with_capacity(dates.len());
        for d in &dates {
            let day = &series[d];
            values.push(
                self.securities
                    .iter()
                    .map(|id| day.values.get(id).copied().unwrap_or(f64::NAN))
                    .collect::<Vec<f64>>(),
            );
            asof.push(
                self.securities
                    .iter()
                    .map(|id| day.asof.get(id).copied())
                    .collect::<Vec<Option<NaiveDate>>>(),
            );
        }
        let window = FactorWindow {
            dates: dates.clone(),
            securities: self.securities.clone(),
            values,
        };
        let asof_window = DateWindow {
            dates,
            securities: self.securities.clone(),
            values: asof,
        };
        (field, window, asof_window)
    }
}

impl MarketDataPort for CsvMarketAdapter {
    fn trading_days(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, QuantscreenError> {
        Ok(self
            .prices
            .range(start_date..end_date)
            .map(|(d, _)| *d)
            .collect())
    }

    fn snapshot(
        &self,
        date: NaiveDate,
        lookback: usize,
    ) -> Result<MarketSnapshot, QuantscreenError> {
        let mut snap = MarketSnapshot::new(date, self.securities.clone());
        snap.meta = self.meta.clone();

        if !self.prices.is_empty() {
            snap.series
                .insert(Field::Close, self.close_window(date, lookback));
        }
        for (field, series) in &self.fundamentals {
            let (field, window, asof) =
                self.fundamental_windows(*field, series, date, lookback);
            snap.series.insert(field, window);
            snap.asof.insert(field, asof);
        }
        Ok(snap)
    }

    fn can_trade(&self, id: &SecurityId, date: NaiveDate) -> bool {
        self.prices
            .get(&date)
            .is_some_and(|row| row.contains_key(id))
    }
}

fn open_reader(path: &PathBuf) -> Result<csv::Reader<std::fs::File>, QuantscreenError> {
    csv::Reader::from_path(path).map_err(|e| QuantscreenError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_record(
    result: Result<csv::StringRecord, csv::Error>,
    path: &PathBuf,
) -> Result<csv::StringRecord, QuantscreenError> {
    result.map_err(|e| QuantscreenError::Data {
        reason: format!("{}: CSV parse error: {}", path.display(), e),
    })
}

fn cell<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    path: &PathBuf,
) -> Result<&'a str, QuantscreenError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| QuantscreenError::Data {
            reason: format!("{}: missing {} column", path.display(), name),
        })
}

fn parse_date(value: &str, path: &PathBuf) -> Result<NaiveDate, QuantscreenError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| QuantscreenError::Data {
        reason: format!("{}: invalid date {:?}: {}", path.display(), value, e),
    })
}

fn parse_f64(value: &str, path: &PathBuf) -> Result<f64, QuantscreenError> {
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse().map_err(|e| QuantscreenError::Data {
        reason: format!("{}: invalid number {:?}: {}", path.display(), value, e),
    })
}

fn parse_opt_i64(value: &str, path: &PathBuf) -> Result<Option<i64>, QuantscreenError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e| QuantscreenError::Data {
            reason: format!("{}: invalid sector {:?}: {}", path.display(), value, e),
        })
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1")
}

/// The last `lookback` dates at or before `date`, oldest first.
fn tail_dates<'a, I>(dates: I, date: NaiveDate, lookback: usize) -> Vec<NaiveDate>
where
    I: DoubleEndedIterator<Item = &'a NaiveDate>,
{
    let mut out: Vec<NaiveDate> = dates
        .rev()
        .filter(|d| **d <= date)
        .take(lookback)
        .copied()
        .collect();
    out.reverse();
    out
}
