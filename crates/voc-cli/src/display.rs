//! Terminal rendering for enrichment reports.
//!
//! Renders [`Insights`] as KPI tiles, an ASCII bar chart of negative volume
//! per group, an issue share table, and the urgent action list as an Arrow
//! pretty-printed table.

use std::fmt::Write;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use voc_ai::Enrichment;
use voc_ai::insights::{self, Insights};
use voc_core::reviews;

const BAR_WIDTH: usize = 40;
const MAX_TEXT_CHARS: usize = 60;

/// Counts from the pipeline run that the enriched table alone cannot show.
pub struct RunSummary {
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub elapsed_secs: f64,
}

// ── Public API ──

/// Render the full text report.
///
/// `limit` caps the rows shown in the action table.
pub fn render_report(
    enriched: &RecordBatch,
    report: &Insights,
    run: &RunSummary,
    limit: usize,
) -> anyhow::Result<String> {
    let mut out = String::new();

    writeln!(out, "=== Review Enrichment Report ===")?;
    writeln!(out)?;
    render_kpis(&mut out, report)?;
    if run.dropped_rows > 0 {
        writeln!(
            out,
            "  ({} of {} rows had no review text and were skipped)",
            thousands(run.dropped_rows),
            thousands(run.input_rows)
        )?;
    }
    writeln!(out)?;

    render_group_chart(&mut out, report)?;
    render_issue_shares(&mut out, report)?;
    render_action_list(&mut out, enriched, report.negative_count, limit)?;

    writeln!(out, "Finished in {:.2}s", run.elapsed_secs)?;
    Ok(out)
}

/// One line per scored text for the `score` subcommand.
pub fn render_score(text: &str, e: &Enrichment) -> String {
    format!(
        "{:>8.4}  {:<8}  {:<13}  {}",
        e.score,
        e.label.as_str(),
        e.tag.as_str(),
        truncate(text, MAX_TEXT_CHARS)
    )
}

// ── Sections ──

fn render_kpis(out: &mut String, report: &Insights) -> std::fmt::Result {
    let mean = report
        .mean_sentiment
        .map_or_else(|| "-".to_string(), |m| format!("{m:+.3}"));
    let rate = report
        .negative_rate()
        .map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r * 100.0));

    writeln!(out, "  {:<22} {}", "Total reviews", thousands(report.total_reviews))?;
    writeln!(out, "  {:<22} {}", "Mean sentiment", mean)?;
    writeln!(
        out,
        "  {:<22} {} ({})",
        "Negative reviews",
        thousands(report.negative_count),
        rate
    )
}

fn render_group_chart(out: &mut String, report: &Insights) -> std::fmt::Result {
    writeln!(out, "Negative reviews by {}", reviews::GROUP_ATTRIBUTE)?;
    if report.negative_by_group.is_empty() {
        writeln!(out, "  (none)")?;
        return writeln!(out);
    }

    let max = report
        .negative_by_group
        .iter()
        .map(|g| g.count)
        .max()
        .unwrap_or(1);
    let label_width = report
        .negative_by_group
        .iter()
        .map(|g| g.group.chars().count())
        .max()
        .unwrap_or(0)
        .min(24);

    for g in &report.negative_by_group {
        writeln!(
            out,
            "  {:<label_width$}  {:<BAR_WIDTH$}  {}",
            truncate(&g.group, 24),
            bar(g.count, max),
            thousands(g.count)
        )?;
    }
    writeln!(out)
}

fn render_issue_shares(out: &mut String, report: &Insights) -> std::fmt::Result {
    writeln!(out, "Root causes of negative reviews")?;
    if report.negative_issues.is_empty() {
        writeln!(out, "  (none)")?;
        return writeln!(out);
    }
    for share in &report.negative_issues {
        writeln!(
            out,
            "  {:<14} {:>6}  {:>5.1}%",
            share.tag.as_str(),
            thousands(share.count),
            share.share * 100.0
        )?;
    }
    writeln!(out)
}

fn render_action_list(
    out: &mut String,
    enriched: &RecordBatch,
    negative_count: usize,
    limit: usize,
) -> anyhow::Result<()> {
    writeln!(out, "Urgent action list")?;
    if negative_count == 0 || limit == 0 {
        writeln!(out, "  (none)")?;
        writeln!(out)?;
        return Ok(());
    }

    let negatives = insights::negative_rows(enriched)?;
    let shown = negatives.slice(0, negatives.num_rows().min(limit));
    let shown = truncate_text_column(&shown)?;
    writeln!(out, "{}", pretty_format_batches(&[shown])?)?;
    if negative_count > limit {
        writeln!(out, "  ... and {} more", thousands(negative_count - limit))?;
    }
    writeln!(out)?;
    Ok(())
}

// ── Helpers ──

/// Shorten the review text column so table rows stay on one line.
fn truncate_text_column(batch: &RecordBatch) -> anyhow::Result<RecordBatch> {
    let Ok(idx) = batch.schema().index_of(reviews::REVIEW_TEXT) else {
        return Ok(batch.clone());
    };
    let Some(texts) = batch.column(idx).as_any().downcast_ref::<StringArray>() else {
        return Ok(batch.clone());
    };
    let short: StringArray = texts
        .iter()
        .map(|t| t.map(|s| truncate(&s.replace('\n', " "), MAX_TEXT_CHARS)))
        .collect();

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns[idx] = Arc::new(short);
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

/// Truncate to at most `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut short: String = s.chars().take(keep).collect();
    short.push_str("...");
    short
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(len)
}

/// Format an integer with `,` thousands separators.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
