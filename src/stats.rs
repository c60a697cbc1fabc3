use crate::models::{Bucket, Series, SeriesEntry};
use serde::{Deserialize, Serialize};

/// Numeric field of a series entry that statistics can be taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Amount,
    Quantity,
    Count,
    /// Amount per quantity unit (0 when the bucket has no quantity).
    AmountPerUnit,
    /// Amount per record (0 for an empty bucket).
    AverageOrderValue,
}

impl Field {
    pub fn value(self, entry: &SeriesEntry) -> f64 {
        match self {
            Field::Amount => entry.amount,
            Field::Quantity => entry.quantity as f64,
            Field::Count => entry.count as f64,
            Field::AmountPerUnit => per_unit(entry.amount, entry.quantity),
            Field::AverageOrderValue => ratio(entry.amount, entry.count as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Max,
    Min,
}

/// The bucket reaching an extremum and the value it reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub bucket: Bucket,
    pub label: String,
    pub value: f64,
}

/// Headline statistics for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of buckets.
    pub count: usize,
    /// Number of rows folded into the buckets.
    pub record_count: usize,
    pub total: f64,
    pub total_quantity: u64,
    /// Total per bucket.
    pub mean: f64,
    pub median: f64,
    /// Total per record.
    pub average_order_value: f64,
    pub max: Option<Extremum>,
    pub min: Option<Extremum>,
    /// Rows excluded for data defects.
    pub skipped: usize,
}

/// Reduce a series to its [`Summary`]. Never fails; an empty series gives zeros.
pub fn summarize(series: &Series) -> Summary {
    let count = series.len();
    let record_count = series.record_count();
    let total = finite_sum(series.entries.iter().map(|e| e.amount));
    let total_quantity = series
        .entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.quantity));
    let amounts: Vec<f64> = series.entries.iter().map(|e| e.amount).collect();

    Summary {
        count,
        record_count,
        total,
        total_quantity,
        mean: ratio(total, count as f64),
        median: median(&amounts),
        average_order_value: ratio(total, record_count as f64),
        max: extremum(series, Field::Amount, Direction::Max).map(|e| to_extremum(e, Field::Amount)),
        min: extremum(series, Field::Amount, Direction::Min).map(|e| to_extremum(e, Field::Amount)),
        skipped: series.skipped.len(),
    }
}

/// Single linear scan for the best entry by `field`.
///
/// On ties the first entry in series order wins, so the result follows the
/// series ordering and is the same on every call.
pub fn extremum(series: &Series, field: Field, direction: Direction) -> Option<&SeriesEntry> {
    let mut best: Option<(&SeriesEntry, f64)> = None;
    for entry in &series.entries {
        let v = field.value(entry);
        let better = match best {
            None => true,
            Some((_, b)) => match direction {
                Direction::Max => v > b,
                Direction::Min => v < b,
            },
        };
        if better {
            best = Some((entry, v));
        }
    }
    best.map(|(e, _)| e)
}

fn to_extremum(entry: &SeriesEntry, field: Field) -> Extremum {
    Extremum {
        bucket: entry.bucket.clone(),
        label: entry.label.clone(),
        value: field.value(entry),
    }
}

/// Fraction of the series total held by `bucket`; 0 when the total is 0
/// or the bucket is not in the series.
///
/// The total is the one seen at aggregation, so a truncated ranking still
/// reports each bucket's share of everything.
pub fn share(series: &Series, bucket: &Bucket) -> f64 {
    series
        .entries
        .iter()
        .find(|e| &e.bucket == bucket)
        .map_or(0.0, |e| e.share)
}

/// Share of total for every entry, in series order.
pub fn shares(series: &Series) -> Vec<(Bucket, f64)> {
    series
        .entries
        .iter()
        .map(|e| (e.bucket.clone(), e.share))
        .collect()
}

/// Sum that saturates at `f64::MAX` instead of reaching infinity.
pub fn finite_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values
        .into_iter()
        .fold(0.0, |acc, v| (acc + v).clamp(-f64::MAX, f64::MAX))
}

/// `numerator / denominator`, or 0 when the denominator is 0 or the result is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let r = numerator / denominator;
    if r.is_finite() { r } else { 0.0 }
}

/// Amount per quantity unit; 0 when no units were sold.
pub fn per_unit(amount: f64, quantity: u64) -> f64 {
    ratio(amount, quantity as f64)
}

/// Average amount per record across the whole series.
pub fn average_order_value(series: &Series) -> f64 {
    let total = finite_sum(series.entries.iter().map(|e| e.amount));
    ratio(total, series.record_count() as f64)
}

/// Median of `values`; 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    let mut vals = values.to_vec();
    vals.sort_by(f64::total_cmp);
    let n = vals.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        vals[n / 2]
    } else {
        vals[n / 2 - 1] / 2.0 + vals[n / 2] / 2.0
    }
}
