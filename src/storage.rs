use crate::models::{Row, Series};
use crate::stats::Summary;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Load rows, picking the reader from the file extension (`.json`, otherwise CSV).
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        load_rows_json(path)
    } else {
        load_rows_csv(path)
    }
}

/// Load rows from a CSV file with a header line.
///
/// Columns are matched by name (`date`, `amount`, `quantity`, `group_key` or their
/// aliases such as `seller`); unknown columns are ignored and empty cells are absent.
pub fn load_rows_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<Row>().enumerate() {
        // Line 1 is the header.
        let row = rec.with_context(|| format!("{}: malformed line {}", path.display(), i + 2))?;
        rows.push(row);
    }
    log::debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load rows from a JSON array of objects.
pub fn load_rows_json<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows: Vec<Row> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", path.display()))?;
    log::debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Save a series as CSV: `bucket,amount,quantity,count,share`.
pub fn save_series_csv<P: AsRef<Path>>(series: &Series, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["bucket", "amount", "quantity", "count", "share"])?;
    for e in &series.entries {
        wtr.serialize((sanitize_cell(&e.label), e.amount, e.quantity, e.count, e.share))?;
    }
    wtr.flush()?;
    log::info!("wrote {} buckets to {}", series.len(), path.display());
    Ok(())
}

/// Save a series (entries, skipped rows, filter info) as pretty JSON.
pub fn save_series_json<P: AsRef<Path>>(series: &Series, path: P) -> Result<()> {
    write_json(series, path.as_ref())
}

/// Save a summary as pretty JSON.
pub fn save_summary_json<P: AsRef<Path>>(summary: &Summary, path: P) -> Result<()> {
    write_json(summary, path.as_ref())
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Prefix text cells that a spreadsheet would evaluate as a formula.
fn sanitize_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{s}"),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::models::{BucketKind, GroupOrder, YearFilter};
    use tempfile::tempdir;

    fn row(date: &str, amount: f64, key: &str) -> Row {
        Row {
            date: Some(date.into()),
            amount: Some(amount.into()),
            quantity: None,
            group_key: Some(key.into()),
        }
    }

    #[test]
    fn formula_starters_are_prefixed() {
        assert_eq!(sanitize_cell("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_cell("@foo"), "'@foo");
        assert_eq!(sanitize_cell("Jan-2024"), "Jan-2024");
    }

    #[test]
    fn write_series_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("s.csv");
        let jsonp = dir.path().join("s.json");
        let rows = vec![row("2024-01-01", 10.0, "A"), row("2024-01-02", 30.0, "B")];
        let series = aggregate(
            &rows,
            BucketKind::ByGroupKey(GroupOrder::AmountDesc),
            YearFilter::All,
        )
        .unwrap();
        save_series_csv(&series, &csvp).unwrap();
        save_series_json(&series, &jsonp).unwrap();

        let txt = std::fs::read_to_string(&csvp).unwrap();
        let mut lines = txt.lines();
        assert_eq!(lines.next(), Some("bucket,amount,quantity,count,share"));
        assert_eq!(lines.next(), Some("B,30.0,0,1,0.75"));
        assert!(jsonp.exists());
    }
}
