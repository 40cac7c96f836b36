//! Row-level enrichment: score, label and tag every normalized review.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use tracing::{debug, info};
use voc_core::{IssueTag, NormalizedTable, SentimentLabel, reviews};

use crate::rules::IssueRules;
use crate::scorer::SentimentScorer;

/// Derived fields for a single review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Enrichment {
    pub score: f64,
    pub label: SentimentLabel,
    pub tag: IssueTag,
}

/// Appends `sentiment_score`, `sentiment_label` and `issue_tag` to normalized tables.
///
/// The scorer is injected so callers decide when (and from what lexicon) it
/// is built; the engine itself holds no mutable state.
#[derive(Debug, Clone)]
pub struct EnrichmentEngine<S> {
    scorer: S,
    rules: IssueRules,
}

impl<S: SentimentScorer> EnrichmentEngine<S> {
    /// Engine with the standard issue rules.
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            rules: IssueRules::standard(),
        }
    }

    pub fn with_rules(mut self, rules: IssueRules) -> Self {
        self.rules = rules;
        self
    }

    /// Enrich one text.
    pub fn enrich_text(&self, text: &str) -> Enrichment {
        let score = self.scorer.score(text);
        Enrichment {
            score,
            label: SentimentLabel::from_score(score),
            tag: self.rules.tag(text),
        }
    }

    /// Enrich every row of a normalized table.
    ///
    /// Input columns are kept in order. A derived column whose name already
    /// exists in the input replaces it in place; otherwise it is appended.
    /// Re-enriching an enriched table therefore reproduces it exactly.
    pub fn enrich(&self, table: &NormalizedTable) -> Result<RecordBatch, ArrowError> {
        let rows = table.num_rows();
        let mut scores = Vec::with_capacity(rows);
        let mut labels = Vec::with_capacity(rows);
        let mut tags = Vec::with_capacity(rows);

        for text in table.review_texts() {
            let e = self.enrich_text(text);
            scores.push(e.score);
            labels.push(e.label.as_str());
            tags.push(e.tag.as_str());
        }

        let negative = labels
            .iter()
            .filter(|l| **l == SentimentLabel::Negative.as_str())
            .count();

        let derived: Vec<(Field, ArrayRef)> = reviews::derived_fields()
            .into_iter()
            .zip([
                Arc::new(Float64Array::from(scores)) as ArrayRef,
                Arc::new(StringArray::from(labels)) as ArrayRef,
                Arc::new(StringArray::from(tags)) as ArrayRef,
            ])
            .collect();

        let batch = table.batch();
        let source_schema = batch.schema();
        let mut fields: Vec<Field> = source_schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

        for (field, array) in derived {
            match source_schema.index_of(field.name()) {
                Ok(idx) => {
                    debug!(column = %field.name(), "replacing existing derived column");
                    fields[idx] = field;
                    columns[idx] = array;
                }
                Err(_) => {
                    fields.push(field);
                    columns.push(array);
                }
            }
        }

        let schema = Schema::new_with_metadata(fields, source_schema.metadata().clone());
        let enriched = RecordBatch::try_new(Arc::new(schema), columns)?;

        info!(rows, negative, "enriched reviews");
        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use arrow::datatypes::DataType;
    use voc_core::Normalizer;

    use crate::rules::IssueRule;
    use crate::scorer::CompoundScorer;
    use crate::vader::VaderScorer;

    fn engine() -> EnrichmentEngine<&'static VaderScorer> {
        EnrichmentEngine::new(VaderScorer::shared())
    }

    fn normalized(cols: &[(&str, Vec<&str>)]) -> NormalizedTable {
        let fields: Vec<Field> = cols
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = cols
            .iter()
            .map(|(_, values)| Arc::new(StringArray::from(values.clone())) as ArrayRef)
            .collect();
        let raw = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();
        Normalizer::new().normalize(&raw).unwrap()
    }

    fn strings<'a>(batch: &'a RecordBatch, name: &str) -> Vec<&'a str> {
        let col = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        (0..col.len()).map(|i| col.value(i)).collect()
    }

    fn scores(batch: &RecordBatch) -> Vec<f64> {
        let col = batch
            .column_by_name(reviews::SENTIMENT_SCORE)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        col.values().to_vec()
    }

    /// Scorer that returns a fixed value, for threshold tests.
    struct Fixed(f64);

    impl SentimentScorer for Fixed {
        fn score(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn enrich_text_positive_general() {
        let e = engine().enrich_text("Great product, will buy again");
        assert_eq!(e.label, SentimentLabel::Positive);
        assert_eq!(e.tag, IssueTag::General);
        assert!(e.score > 0.05);
    }

    #[test]
    fn enrich_text_tag_precedence() {
        let e = engine().enrich_text("late delivery on an expensive item");
        assert_eq!(e.tag, IssueTag::SupplyChain);
    }

    #[test]
    fn label_thresholds_are_inclusive() {
        let cases = [
            (0.05, SentimentLabel::Positive),
            (-0.05, SentimentLabel::Negative),
            (0.0, SentimentLabel::Neutral),
            (0.0499, SentimentLabel::Neutral),
            (-0.0499, SentimentLabel::Neutral),
            (1.0, SentimentLabel::Positive),
            (-1.0, SentimentLabel::Negative),
        ];
        for (score, label) in cases {
            let e = EnrichmentEngine::new(Fixed(score)).enrich_text("anything");
            assert_eq!(e.label, label, "score {score}");
        }
    }

    #[test]
    fn appends_derived_columns() {
        let table = normalized(&[
            ("Clothing ID", vec!["1", "2"]),
            ("Review Text", vec!["I love this dress", "The fabric is terrible"]),
            ("Department Name", vec!["Dresses", "Tops"]),
        ]);

        let out = engine().enrich(&table).unwrap();
        let names: Vec<String> = out
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "Clothing ID",
                "review_text",
                "group_attribute",
                "sentiment_score",
                "sentiment_label",
                "issue_tag"
            ]
        );
        assert_eq!(out.num_rows(), 2);
        assert_eq!(
            strings(&out, reviews::SENTIMENT_LABEL),
            vec!["Positive", "Negative"]
        );
        assert_eq!(
            strings(&out, reviews::ISSUE_TAG),
            vec!["General", "Quality Issue"]
        );
        for s in scores(&out) {
            assert!((-1.0..=1.0).contains(&s));
        }
        assert_eq!(out.column_by_name(reviews::SENTIMENT_SCORE).unwrap().null_count(), 0);
    }

    #[test]
    fn labels_agree_with_scores() {
        let table = normalized(&[(
            "Review Text",
            vec!["great", "awful", "it is a dress", "not bad at all", "okay I guess"],
        )]);
        let out = engine().enrich(&table).unwrap();
        let labels = strings(&out, reviews::SENTIMENT_LABEL);
        for (score, label) in scores(&out).into_iter().zip(labels) {
            assert_eq!(SentimentLabel::from_score(score).as_str(), label);
        }
    }

    #[test]
    fn replaces_same_named_columns_in_place() {
        let table = normalized(&[
            ("sentiment_label", vec!["stale"]),
            ("Review Text", vec!["Runs small"]),
        ]);

        let out = engine().enrich(&table).unwrap();
        let schema = out.schema();
        assert_eq!(schema.field(0).name(), "sentiment_label");
        assert_eq!(schema.fields().len(), 5);
        assert_ne!(strings(&out, reviews::SENTIMENT_LABEL)[0], "stale");
        assert_eq!(strings(&out, reviews::ISSUE_TAG), vec!["Sizing Issue"]);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let table = normalized(&[
            ("Review Text", vec!["Too expensive for the quality", "Perfect fit!"]),
            ("Division", vec!["General", "Petite"]),
        ]);
        let engine = engine();

        let once = engine.enrich(&table).unwrap();
        let again = Normalizer::new().normalize(&once).unwrap();
        let twice = engine.enrich(&again).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_table_enriches_to_empty() {
        let table = normalized(&[("Review Text", vec![])]);
        let out = engine().enrich(&table).unwrap();
        assert_eq!(out.num_rows(), 0);
        for col in reviews::GUARANTEED_COLUMNS {
            assert!(out.column_by_name(col).is_some(), "missing {col}");
        }
    }

    #[test]
    fn custom_rules_are_used() {
        let rules = IssueRules::new(vec![IssueRule::new(IssueTag::Pricing, ["dress"])]);
        let engine = engine().with_rules(rules);
        assert_eq!(engine.enrich_text("Lovely dress").tag, IssueTag::Pricing);
        assert_eq!(engine.enrich_text("Runs small").tag, IssueTag::General);
    }

    #[test]
    fn lexicon_scorer_plugs_in() {
        let engine = EnrichmentEngine::new(CompoundScorer::shared());
        let e = engine.enrich_text("The fabric is terrible");
        assert_eq!(e.label, SentimentLabel::Negative);
        assert_eq!(e.tag, IssueTag::QualityIssue);
    }

    #[test]
    fn boxed_scorer_works() {
        let boxed: Box<dyn SentimentScorer> = Box::new(Fixed(-0.3));
        let engine = EnrichmentEngine::new(boxed);
        assert_eq!(engine.enrich_text("x").label, SentimentLabel::Negative);
    }
}
