use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use salesdash::{BucketKind, GroupOrder, YearFilter, aggregate, available_years};
use salesdash::{report, stats, storage};

#[derive(Parser, Debug)]
#[command(
    name = "salesdash",
    version,
    about = "Bucket, rank & summarize sales records for dashboards"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate rows into a series (and optionally save it and print stats).
    Series(SeriesArgs),
    /// List the years present in the input.
    Years(YearsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum By {
    Day,
    Month,
    Year,
    /// Seller, customer, or product key.
    Group,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SeriesArgs {
    /// Input rows (.csv or .json).
    #[arg(short, long)]
    input: PathBuf,
    /// Bucketing dimension.
    #[arg(short, long, value_enum, default_value_t = By::Month)]
    by: By,
    /// Rank groups by amount, highest first (requires --by group).
    #[arg(long, default_value_t = false)]
    rank: bool,
    /// Keep only the first N buckets.
    #[arg(long)]
    top: Option<usize>,
    /// Year filter: "all" or a year like 2024.
    #[arg(short, long, default_value = "all")]
    year: YearFilter,
    /// Save the series to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print summary statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Save the summary statistics as JSON.
    #[arg(long)]
    stats_out: Option<PathBuf>,
    /// Locale tag for number formatting (en, de, fr, es, it, pt, nl).
    #[arg(long, default_value = "en")]
    locale: String,
}

#[derive(Args, Debug)]
struct YearsArgs {
    /// Input rows (.csv or .json).
    #[arg(short, long)]
    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Series(args) => cmd_series(args),
        Command::Years(args) => cmd_years(args),
    }
}

fn bucket_kind(by: By, rank: bool) -> Result<BucketKind> {
    Ok(match (by, rank) {
        (By::Group, true) => BucketKind::ByGroupKey(GroupOrder::AmountDesc),
        (By::Group, false) => BucketKind::ByGroupKey(GroupOrder::Insertion),
        (_, true) => anyhow::bail!("--rank requires --by group"),
        (By::Day, false) => BucketKind::ByDay,
        (By::Month, false) => BucketKind::ByMonth,
        (By::Year, false) => BucketKind::ByYear,
    })
}

fn cmd_series(args: SeriesArgs) -> Result<()> {
    let kind = bucket_kind(args.by, args.rank)?;
    let rows = storage::load_rows(&args.input)?;
    let mut series = aggregate(&rows, kind, args.year)?;

    if !series.skipped.is_empty() {
        log::warn!(
            "skipped {} of {} rows with data defects",
            series.skipped.len(),
            rows.len()
        );
        for s in &series.skipped {
            log::debug!("row {}: {}", s.index, s.reason);
        }
    }
    if series.filtered_out > 0 {
        log::info!(
            "{} rows outside year filter {}",
            series.filtered_out,
            series.year_filter
        );
    }

    // Summarize before truncating so headline totals cover every bucket.
    let summary = stats::summarize(&series);
    if let Some(n) = args.top {
        series = series.top(n);
    }

    for line in report::series_lines(&series, &args.locale) {
        println!("{line}");
    }

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_series_csv(&series, path)?,
            "json" => storage::save_series_json(&series, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} buckets to {}", series.len(), path.display());
    }

    if args.stats {
        for line in report::summary_lines(&summary, &args.locale) {
            println!("{line}");
        }
    }
    if let Some(path) = args.stats_out.as_ref() {
        storage::save_summary_json(&summary, path)?;
        eprintln!("Saved summary to {}", path.display());
    }

    Ok(())
}

fn cmd_years(args: YearsArgs) -> Result<()> {
    let rows = storage::load_rows(&args.input)?;
    for year in available_years(&rows) {
        println!("{year}");
    }
    Ok(())
}
