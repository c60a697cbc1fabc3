//! Text rendering of series and summaries for terminals and logs.

use crate::models::Series;
use crate::stats::Summary;
use num_format::{Locale, ToFormattedString};

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Format a monetary amount with grouping and two decimals, e.g. `1,234.50` / `1.234,50`.
pub fn format_amount(value: f64, locale_tag: &str) -> String {
    if !value.is_finite() {
        return "NA".to_string();
    }
    let (locale, dec_sep) = map_locale(locale_tag);
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_formatted_string(locale);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{whole}{dec_sep}{:02}", cents % 100)
}

/// Format a share (0..=1) as a percentage with one decimal.
pub fn format_share(share: f64, locale_tag: &str) -> String {
    let (_, dec_sep) = map_locale(locale_tag);
    let s = format!("{:.1}%", share * 100.0);
    if dec_sep == '.' { s } else { s.replace('.', &dec_sep.to_string()) }
}

/// One line per bucket: label, amount, quantity, count, share.
pub fn series_lines(series: &Series, locale_tag: &str) -> Vec<String> {
    let width = series
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0);
    series
        .entries
        .iter()
        .map(|e| {
            format!(
                "{:<width$}  amount={} quantity={} count={} share={}",
                e.label,
                format_amount(e.amount, locale_tag),
                e.quantity.to_formatted_string(map_locale(locale_tag).0),
                e.count,
                format_share(e.share, locale_tag),
            )
        })
        .collect()
}

/// Headline lines for a summary card.
pub fn summary_lines(summary: &Summary, locale_tag: &str) -> Vec<String> {
    let fmt = |v: f64| format_amount(v, locale_tag);
    let mut out = vec![
        format!(
            "buckets={} records={} skipped={}",
            summary.count, summary.record_count, summary.skipped
        ),
        format!(
            "total={} mean={} median={} avg_order={}",
            fmt(summary.total),
            fmt(summary.mean),
            fmt(summary.median),
            fmt(summary.average_order_value)
        ),
    ];
    if let Some(max) = &summary.max {
        out.push(format!("max={} ({})", fmt(max.value), max.label));
    }
    if let Some(min) = &summary.min {
        out.push(format!("min={} ({})", fmt(min.value), min.label));
    }
    out
}
