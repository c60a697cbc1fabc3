use crate::error::AggregateError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One row as delivered by the data-access layer.
///
/// Every field is optional and amounts/quantities are kept as raw values, so a
/// bad cell never aborts loading a whole result set. Validation happens in
/// [`crate::aggregate::parse_row`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, alias = "timestamp", alias = "order_date")]
    pub date: Option<String>,
    #[serde(default, alias = "total", alias = "revenue")]
    pub amount: Option<RawValue>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<RawValue>,
    #[serde(
        default,
        alias = "seller",
        alias = "customer",
        alias = "product",
        alias = "category"
    )]
    pub group_key: Option<String>,
}

/// A numeric cell that may arrive as a number or as text.
///
/// Some sources encode decimals as strings (`"12.50"`), others as numbers.
/// Accept both; anything else is kept verbatim so the row can be reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        struct RawValueVisitor;

        impl<'de> Visitor<'de> for RawValueVisitor {
            type Value = RawValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a number or a string")
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Number(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Number(v as f64))
            }

            // Integers wider than 64 bits still belong to one row, not the whole file.
            fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_u128<E>(self, v: u128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Number(v as f64))
            }

            // CSV type inference turns "true"/"false" cells into booleans.
            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Text(v.to_string()))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Text(s.to_string()))
            }

            fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Text(s))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// A validated row: parsed date, finite non-negative amount, trimmed key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub amount: f64,
    pub quantity: Option<u64>,
    pub group_key: Option<String>,
}

/// Why a row was left out of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SkipReason {
    #[error("missing date")]
    MissingDate,
    #[error("unparsable date {0:?}")]
    InvalidDate(String),
    #[error("missing amount")]
    MissingAmount,
    #[error("unparsable amount {0:?}")]
    InvalidAmount(String),
    #[error("negative amount")]
    NegativeAmount,
    #[error("unparsable quantity {0:?}")]
    InvalidQuantity(String),
    #[error("missing group key")]
    MissingGroupKey,
    #[error("amount overflows the bucket total")]
    AmountOverflow,
    #[error("quantity overflows the bucket total")]
    QuantityOverflow,
}

/// A row excluded from aggregation, by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: SkipReason,
}

/// Grouping identity of one series entry.
///
/// Within a single series all buckets share a variant, so the derived
/// ordering is chronological for time buckets and lexicographic for groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
    Group(String),
}

impl Bucket {
    /// Display label for charts: `2024-01-05`, `Jan-2024`, `2024`, or the key itself.
    pub fn label(&self) -> String {
        match self {
            Bucket::Day(d) => d.format("%Y-%m-%d").to_string(),
            Bucket::Month { year, month } => match month_name(*month) {
                Some(name) => format!("{}-{}", &name[..3], year),
                None => format!("{year}-{month:02}"),
            },
            Bucket::Year(y) => y.to_string(),
            Bucket::Group(key) => key.clone(),
        }
    }

    /// Full month name for `Month` buckets ("January").
    pub fn month_name(&self) -> Option<&'static str> {
        match self {
            Bucket::Month { month, .. } => month_name(*month),
            _ => None,
        }
    }
}

fn month_name(month: u32) -> Option<&'static str> {
    let m = u8::try_from(month).ok()?;
    chrono::Month::try_from(m).ok().map(|m| m.name())
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordering of `ByGroupKey` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupOrder {
    /// Order of first occurrence in the input.
    #[default]
    Insertion,
    /// Descending by aggregated amount; ties by ascending key.
    AmountDesc,
}

/// How rows are partitioned before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketKind {
    ByDay,
    ByMonth,
    ByYear,
    ByGroupKey(GroupOrder),
}

/// Year restriction applied before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn matches(&self, year: i32) -> bool {
        match *self {
            YearFilter::All => true,
            YearFilter::Year(y) => y == year,
        }
    }
}

impl FromStr for YearFilter {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(YearFilter::All);
        }
        s.parse::<i32>()
            .map(YearFilter::Year)
            .map_err(|_| AggregateError::InvalidYearFilter(s.to_string()))
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => f.write_str("all"),
            YearFilter::Year(y) => write!(f, "{y}"),
        }
    }
}

/// One aggregated bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub bucket: Bucket,
    pub label: String,
    pub amount: f64,
    pub quantity: u64,
    pub count: usize,
    /// Fraction of the whole series total, fixed at aggregation time.
    pub share: f64,
}

impl SeriesEntry {
    pub(crate) fn new(bucket: Bucket) -> Self {
        let label = bucket.label();
        Self {
            bucket,
            label,
            amount: 0.0,
            quantity: 0,
            count: 0,
            share: 0.0,
        }
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub kind: BucketKind,
    pub year_filter: YearFilter,
    pub entries: Vec<SeriesEntry>,
    /// Rows excluded because of a data defect.
    pub skipped: Vec<SkippedRow>,
    /// Valid rows excluded only by the year filter.
    pub filtered_out: usize,
}

impl Series {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of input rows folded into the buckets.
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Ordered `(label, amount)` pairs for charting.
    pub fn points(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|e| (e.label.clone(), e.amount))
            .collect()
    }

    /// Keep only the first `n` entries (e.g. a top-N ranking). Shares still
    /// refer to the untruncated total.
    pub fn top(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels_carry_the_year() {
        let dec = Bucket::Month { year: 2023, month: 12 };
        let jan = Bucket::Month { year: 2024, month: 1 };
        assert_eq!(dec.label(), "Dec-2023");
        assert_eq!(jan.label(), "Jan-2024");
        assert_eq!(jan.month_name(), Some("January"));
        assert!(dec < jan);
    }

    #[test]
    fn year_filter_parses_all_and_years() {
        assert_eq!("all".parse::<YearFilter>().unwrap(), YearFilter::All);
        assert_eq!("ALL".parse::<YearFilter>().unwrap(), YearFilter::All);
        assert_eq!(" 2024 ".parse::<YearFilter>().unwrap(), YearFilter::Year(2024));
        assert!(matches!(
            "last-year".parse::<YearFilter>(),
            Err(AggregateError::InvalidYearFilter(_))
        ));
    }
}
