//! salesdash
//!
//! A lightweight Rust library for turning raw sales rows (a date, an amount, an
//! optional quantity and an optional seller/customer/product key) into the
//! bucketed series and headline statistics that analytics dashboards display.
//! Pairs with the `salesdash` CLI.
//!
//! ### Features
//! - Bucket rows by day, month, year, or group key, with an optional year filter
//! - Rank groups by revenue with a deterministic tie-break
//! - Summary statistics (total, mean, median, average order value, extrema, shares)
//! - Malformed rows are excluded and itemized, never folded into totals
//! - Load rows from CSV or JSON; save series as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use salesdash::{BucketKind, YearFilter, aggregate, stats, storage};
//!
//! let rows = storage::load_rows("orders.csv")?;
//! let series = aggregate(&rows, BucketKind::ByMonth, YearFilter::Year(2024))?;
//! let summary = stats::summarize(&series);
//! println!("{} buckets, total {}", summary.count, summary.total);
//! storage::save_series_csv(&series, "monthly_2024.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod error;
pub mod models;
pub mod report;
pub mod stats;
pub mod storage;

pub use aggregate::{aggregate, available_years};
pub use error::AggregateError;
pub use models::{
    Bucket, BucketKind, GroupOrder, RawValue, Record, Row, Series, SeriesEntry, SkipReason,
    SkippedRow, YearFilter,
};
pub use stats::{Direction, Field, Summary};
