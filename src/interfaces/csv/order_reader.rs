use crate::domain::order::OrderStatus;
use crate::error::{MarketError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One row of an orders export: the amount a store earned on an order.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderLine {
    pub order_id: String,
    pub store_id: String,
    pub amount: Decimal,
    pub status: OrderStatus,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| MarketError::Validation(format!("Unrecognised date '{}'", raw)))
}

/// Streams order lines from a CSV source.
///
/// Whitespace around fields is trimmed and short rows are tolerated so a
/// malformed line surfaces as one `Err` item instead of aborting the read.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn lines(self) -> impl Iterator<Item = Result<OrderLine>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(MarketError::from))
    }
}

/// A per-store commission rate override, `store_id, rate`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RateLine {
    pub store_id: String,
    pub rate: Decimal,
}

pub fn read_rates<R: Read>(source: R) -> impl Iterator<Item = Result<RateLine>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
        .into_deserialize()
        .map(|result| result.map_err(MarketError::from))
}
