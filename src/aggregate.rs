//! Period aggregation: validate rows, apply the year filter, and fold each
//! surviving record into its bucket.
use crate::error::{AggregateError, Result};
use crate::stats;
use crate::models::{
    Bucket, BucketKind, GroupOrder, RawValue, Record, Row, Series, SeriesEntry, SkipReason,
    SkippedRow, YearFilter,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeSet, HashMap};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Group `rows` into a [`Series`].
///
/// Rows with a missing or unparsable date/amount/quantity, and rows without a
/// group key under [`BucketKind::ByGroupKey`], are excluded and listed in
/// `Series::skipped`. Valid rows outside `year_filter` are only counted in
/// `Series::filtered_out`. A row whose amount or quantity would overflow its
/// bucket's running sum is skipped too.
///
/// ### Ordering
/// - `ByDay`, `ByMonth`, `ByYear`: ascending chronological.
/// - `ByGroupKey(Insertion)`: first occurrence in `rows`.
/// - `ByGroupKey(AmountDesc)`: descending amount, ties by ascending key.
///
/// ### Errors
/// [`AggregateError::InvalidInput`] when grouping by key and no row carries a
/// group key at all. An empty `rows` slice is never an error.
pub fn aggregate(rows: &[Row], kind: BucketKind, year_filter: YearFilter) -> Result<Series> {
    if matches!(kind, BucketKind::ByGroupKey(_))
        && !rows.is_empty()
        && !rows.iter().any(|r| clean_key(r.group_key.as_deref()).is_some())
    {
        return Err(AggregateError::InvalidInput { field: "group_key" });
    }

    let mut entries: Vec<SeriesEntry> = Vec::new();
    let mut index: HashMap<Bucket, usize> = HashMap::new();
    let mut skipped = Vec::new();
    let mut filtered_out = 0;

    for (i, row) in rows.iter().enumerate() {
        let record = match parse_row(row) {
            Ok(r) => r,
            Err(reason) => {
                skipped.push(SkippedRow { index: i, reason });
                continue;
            }
        };
        if !year_filter.matches(record.date.year()) {
            filtered_out += 1;
            continue;
        }
        let Some(bucket) = bucket_for(&record, kind) else {
            skipped.push(SkippedRow {
                index: i,
                reason: SkipReason::MissingGroupKey,
            });
            continue;
        };

        let slot = *index.entry(bucket.clone()).or_insert_with(|| {
            entries.push(SeriesEntry::new(bucket));
            entries.len() - 1
        });
        let entry = &mut entries[slot];
        let amount = entry.amount + record.amount;
        if !amount.is_finite() {
            skipped.push(SkippedRow {
                index: i,
                reason: SkipReason::AmountOverflow,
            });
            continue;
        }
        let Some(quantity) = entry.quantity.checked_add(record.quantity.unwrap_or(0)) else {
            skipped.push(SkippedRow {
                index: i,
                reason: SkipReason::QuantityOverflow,
            });
            continue;
        };
        entry.amount = amount;
        entry.quantity = quantity;
        entry.count += 1;
    }

    // Shares are fixed against the full total so a later `Series::top` keeps them.
    let total = stats::finite_sum(entries.iter().map(|e| e.amount));
    for entry in &mut entries {
        entry.share = stats::ratio(entry.amount, total);
    }

    match kind {
        BucketKind::ByGroupKey(GroupOrder::Insertion) => {}
        BucketKind::ByGroupKey(GroupOrder::AmountDesc) => entries.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.bucket.cmp(&b.bucket))
        }),
        BucketKind::ByDay | BucketKind::ByMonth | BucketKind::ByYear => {
            entries.sort_by(|a, b| a.bucket.cmp(&b.bucket))
        }
    }

    Ok(Series {
        kind,
        year_filter,
        entries,
        skipped,
        filtered_out,
    })
}

/// Years that have at least one valid row, ascending. Used to populate year selectors.
pub fn available_years(rows: &[Row]) -> Vec<i32> {
    rows.iter()
        .filter_map(|r| parse_row(r).ok())
        .map(|r| r.date.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Validate one row into a [`Record`].
pub fn parse_row(row: &Row) -> std::result::Result<Record, SkipReason> {
    let date = match row.date.as_deref().map(str::trim) {
        None | Some("") => return Err(SkipReason::MissingDate),
        Some(text) => parse_date(text).ok_or_else(|| SkipReason::InvalidDate(text.to_string()))?,
    };
    Ok(Record {
        date,
        amount: parse_amount(row.amount.as_ref())?,
        quantity: parse_quantity(row.quantity.as_ref())?,
        group_key: clean_key(row.group_key.as_deref()).map(str::to_string),
    })
}

/// Parse an ISO-8601 date, RFC 3339 timestamp, or naive datetime to its calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_amount(raw: Option<&RawValue>) -> std::result::Result<f64, SkipReason> {
    let value = match raw {
        None => return Err(SkipReason::MissingAmount),
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(t)) => {
            let t = t.trim();
            if t.is_empty() {
                return Err(SkipReason::MissingAmount);
            }
            t.parse::<f64>()
                .map_err(|_| SkipReason::InvalidAmount(t.to_string()))?
        }
    };
    if !value.is_finite() {
        return Err(SkipReason::InvalidAmount(value.to_string()));
    }
    if value < 0.0 {
        return Err(SkipReason::NegativeAmount);
    }
    Ok(value)
}

// Absent quantity is fine (revenue-only rows); a present but bad one is not.
fn parse_quantity(raw: Option<&RawValue>) -> std::result::Result<Option<u64>, SkipReason> {
    let n = match raw {
        None => return Ok(None),
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(t)) => {
            let t = t.trim();
            if t.is_empty() {
                return Ok(None);
            }
            if let Ok(q) = t.parse::<u64>() {
                return Ok(Some(q));
            }
            t.parse::<f64>()
                .map_err(|_| SkipReason::InvalidQuantity(t.to_string()))?
        }
    };
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n < u64::MAX as f64 {
        Ok(Some(n as u64))
    } else {
        Err(SkipReason::InvalidQuantity(n.to_string()))
    }
}

fn clean_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

fn bucket_for(record: &Record, kind: BucketKind) -> Option<Bucket> {
    let d = record.date;
    match kind {
        BucketKind::ByDay => Some(Bucket::Day(d)),
        BucketKind::ByMonth => Some(Bucket::Month {
            year: d.year(),
            month: d.month(),
        }),
        BucketKind::ByYear => Some(Bucket::Year(d.year())),
        BucketKind::ByGroupKey(_) => record.group_key.clone().map(Bucket::Group),
    }
}
