//! Aggregate views over an enriched review table.
//!
//! Everything here reads only the five guaranteed columns, so the same
//! report can be rebuilt from an enriched CSV after a round trip.

use std::collections::HashMap;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use voc_core::{IssueTag, SentimentLabel, reviews};

/// Columns of the urgent action list, in display order.
pub const ACTION_COLUMNS: &[&str] = &[
    reviews::GROUP_ATTRIBUTE,
    reviews::ISSUE_TAG,
    reviews::REVIEW_TEXT,
    reviews::SENTIMENT_SCORE,
];

/// Negative review count for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub group: String,
    pub count: usize,
}

/// How often a tag occurs among negative reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueShare {
    pub tag: IssueTag,
    pub count: usize,
    /// Fraction of negative reviews, in `[0, 1]`.
    pub share: f64,
}

/// One negative review flagged for follow-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub group_attribute: String,
    pub issue_tag: IssueTag,
    pub review_text: String,
    pub sentiment_score: f64,
}

/// Dashboard figures computed from an enriched table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub total_reviews: usize,
    /// `None` for an empty table.
    pub mean_sentiment: Option<f64>,
    pub negative_count: usize,
    /// Sorted by count descending, then group name.
    pub negative_by_group: Vec<GroupCount>,
    /// Sorted by count descending, then rule precedence.
    pub negative_issues: Vec<IssueShare>,
    /// Negative reviews in input order.
    pub action_list: Vec<ActionItem>,
}

impl Insights {
    /// Build the report from an enriched batch.
    ///
    /// Expects the guaranteed columns `review_text`, `group_attribute`,
    /// `sentiment_score`, `sentiment_label` and `issue_tag`. Scores stored as
    /// integers or strings (as CSV inference may produce) are cast to Float64.
    pub fn from_batch(batch: &RecordBatch) -> anyhow::Result<Self> {
        let texts = utf8_column(batch, reviews::REVIEW_TEXT)?;
        let groups = utf8_column(batch, reviews::GROUP_ATTRIBUTE)?;
        let labels = utf8_column(batch, reviews::SENTIMENT_LABEL)?;
        let tags = utf8_column(batch, reviews::ISSUE_TAG)?;
        let scores = score_column(batch)?;

        let total_reviews = batch.num_rows();
        let mut score_sum = 0.0;
        let mut by_group: HashMap<String, usize> = HashMap::new();
        let mut by_tag: HashMap<IssueTag, usize> = HashMap::new();
        let mut action_list = Vec::new();

        for row in 0..total_reviews {
            let score = get_f64(&scores, row)
                .with_context(|| format!("null {} at row {row}", reviews::SENTIMENT_SCORE))?;
            score_sum += score;

            let label: SentimentLabel = get_str(&labels, reviews::SENTIMENT_LABEL, row)?
                .parse()
                .with_context(|| format!("row {row}"))?;
            if label != SentimentLabel::Negative {
                continue;
            }

            let group = get_str(&groups, reviews::GROUP_ATTRIBUTE, row)?;
            let tag: IssueTag = get_str(&tags, reviews::ISSUE_TAG, row)?
                .parse()
                .with_context(|| format!("row {row}"))?;

            *by_group.entry(group.to_string()).or_default() += 1;
            *by_tag.entry(tag).or_default() += 1;
            action_list.push(ActionItem {
                group_attribute: group.to_string(),
                issue_tag: tag,
                review_text: get_str(&texts, reviews::REVIEW_TEXT, row)?.to_string(),
                sentiment_score: score,
            });
        }

        let negative_count = action_list.len();

        let mut negative_by_group: Vec<GroupCount> = by_group
            .into_iter()
            .map(|(group, count)| GroupCount { group, count })
            .collect();
        negative_by_group
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.group.cmp(&b.group)));

        let mut negative_issues: Vec<IssueShare> = by_tag
            .into_iter()
            .map(|(tag, count)| IssueShare {
                tag,
                count,
                share: count as f64 / negative_count as f64,
            })
            .collect();
        negative_issues.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.tag.precedence().cmp(&b.tag.precedence()))
        });

        Ok(Self {
            total_reviews,
            mean_sentiment: (total_reviews > 0).then(|| score_sum / total_reviews as f64),
            negative_count,
            negative_by_group,
            negative_issues,
            action_list,
        })
    }

    /// Share of all reviews that are negative, `None` for an empty table.
    pub fn negative_rate(&self) -> Option<f64> {
        (self.total_reviews > 0).then(|| self.negative_count as f64 / self.total_reviews as f64)
    }
}

/// Negative rows projected to [`ACTION_COLUMNS`], in input order.
pub fn negative_rows(batch: &RecordBatch) -> anyhow::Result<RecordBatch> {
    let labels = utf8_column(batch, reviews::SENTIMENT_LABEL)?;
    let mask: BooleanArray = labels
        .iter()
        .map(|l| Some(l == Some(SentimentLabel::Negative.as_str())))
        .collect();

    let indices = ACTION_COLUMNS
        .iter()
        .map(|name| {
            batch
                .schema()
                .index_of(name)
                .with_context(|| format!("missing '{name}' column"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let projected = batch.project(&indices)?;

    Ok(filter_record_batch(&projected, &mask)?)
}

// ── Arrow extraction helpers ──

fn utf8_column(batch: &RecordBatch, name: &str) -> anyhow::Result<StringArray> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("missing '{name}' column"))?;
    let utf8 = cast(col.as_ref(), &DataType::Utf8)?;
    downcast::<StringArray>(&utf8, name)
}

fn score_column(batch: &RecordBatch) -> anyhow::Result<Float64Array> {
    let name = reviews::SENTIMENT_SCORE;
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("missing '{name}' column"))?;
    let floats = cast(col.as_ref(), &DataType::Float64)?;
    downcast::<Float64Array>(&floats, name)
}

fn downcast<T: Array + Clone + 'static>(col: &ArrayRef, name: &str) -> anyhow::Result<T> {
    col.as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("unexpected type {} for '{name}'", col.data_type()))
}

fn get_str<'a>(col: &'a StringArray, name: &str, row: usize) -> anyhow::Result<&'a str> {
    if col.is_null(row) {
        anyhow::bail!("null {name} at row {row}");
    }
    Ok(col.value(row))
}

fn get_f64(col: &Float64Array, row: usize) -> Option<f64> {
    (!col.is_null(row)).then(|| col.value(row))
}
