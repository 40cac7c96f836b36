//! Column normalization for raw review tables.
//!
//! Maps an arbitrary header set onto the two semantic columns every later
//! stage relies on: `review_text` (required) and `group_attribute` (defaulted).
//! Header matching is case-insensitive containment after folding separators,
//! so `Review Text`, `Review_Text` and `review text (raw)` all resolve to
//! `review_text`.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, StringArray};
use arrow::compute::{cast, filter};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use tracing::{debug, info, warn};

use crate::NormalizeError;
use crate::schema::reviews;

/// Canonical header label for the review text column.
pub const DEFAULT_TEXT_LABEL: &str = "review text";

/// Canonical header label for the grouping column.
pub const DEFAULT_GROUP_LABEL: &str = "department";

/// Group value used when the input has no grouping column, or the row's value is blank.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// The two columns a normalized table is guaranteed to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticField {
    ReviewText,
    GroupAttribute,
}

impl SemanticField {
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::ReviewText => reviews::REVIEW_TEXT,
            Self::GroupAttribute => reviews::GROUP_ATTRIBUTE,
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Input column positions resolved for each semantic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub review_text: usize,
    /// `None` when no column matched; the normalizer synthesizes one.
    pub group_attribute: Option<usize>,
}

/// Maps raw review tables onto the normalized column contract.
#[derive(Debug, Clone)]
pub struct Normalizer {
    text_label: String,
    group_label: String,
    default_group: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            text_label: DEFAULT_TEXT_LABEL.to_string(),
            group_label: DEFAULT_GROUP_LABEL.to_string(),
            default_group: UNKNOWN_GROUP.to_string(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_label(mut self, label: impl Into<String>) -> Self {
        self.text_label = label.into();
        self
    }

    pub fn with_group_label(mut self, label: impl Into<String>) -> Self {
        self.group_label = label.into();
        self
    }

    pub fn with_default_group(mut self, value: impl Into<String>) -> Self {
        self.default_group = value.into();
        self
    }

    /// Resolve which input columns supply `review_text` and `group_attribute`.
    ///
    /// A column already carrying the semantic name wins outright. Otherwise the
    /// first header (in column order) containing the canonical label is used.
    /// The column claimed for text is never reused for grouping.
    pub fn resolve(&self, schema: &Schema) -> Result<ColumnMapping, NormalizeError> {
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();

        let review_text = find_column(&names, SemanticField::ReviewText, &self.text_label, None)
            .ok_or(NormalizeError::MissingRequiredColumn(SemanticField::ReviewText))?;
        let group_attribute = find_column(
            &names,
            SemanticField::GroupAttribute,
            &self.group_label,
            Some(review_text),
        );

        debug!(
            review_text = names[review_text],
            group_attribute = group_attribute.map(|i| names[i]),
            "resolved semantic columns"
        );

        Ok(ColumnMapping {
            review_text,
            group_attribute,
        })
    }

    /// Normalize a raw table.
    ///
    /// Renames the matched columns in place (casting them to `Utf8`), appends a
    /// constant group column when none matched, and drops rows whose text is
    /// null or blank. A table with no columns at all normalizes to an empty
    /// table rather than failing.
    pub fn normalize(&self, batch: &RecordBatch) -> Result<NormalizedTable, NormalizeError> {
        if batch.num_columns() == 0 {
            debug!("input table has no columns; producing empty normalized table");
            return self.empty_table();
        }

        let source_schema = batch.schema();
        let mapping = self.resolve(&source_schema)?;
        let total_rows = batch.num_rows();

        let mut fields: Vec<Field> = source_schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

        let texts = to_utf8(&columns[mapping.review_text])?;
        let keep: BooleanArray = texts
            .iter()
            .map(|v| Some(v.is_some_and(|s| !s.trim().is_empty())))
            .collect();
        columns[mapping.review_text] = Arc::new(texts);
        fields[mapping.review_text] = reviews::review_text_field();

        match mapping.group_attribute {
            Some(idx) => {
                let groups = to_utf8(&columns[idx])?;
                columns[idx] = Arc::new(fill_blank(&groups, &self.default_group));
                fields[idx] = reviews::group_attribute_field();
            }
            None => {
                debug!(default = %self.default_group, "no grouping column; using default");
                columns.push(Arc::new(StringArray::from(vec![
                    self.default_group.as_str();
                    total_rows
                ])));
                fields.push(reviews::group_attribute_field());
            }
        }

        let columns = columns
            .iter()
            .map(|col| filter(col.as_ref(), &keep))
            .collect::<Result<Vec<_>, _>>()?;
        let schema = Schema::new_with_metadata(fields, source_schema.metadata().clone());
        let batch = RecordBatch::try_new(Arc::new(schema), columns)?;

        let dropped_rows = total_rows - batch.num_rows();
        info!(
            rows = batch.num_rows(),
            dropped = dropped_rows,
            "normalized review table"
        );

        NormalizedTable::new(batch, dropped_rows)
    }

    fn empty_table(&self) -> Result<NormalizedTable, NormalizeError> {
        let schema = Schema::new(vec![
            reviews::review_text_field(),
            reviews::group_attribute_field(),
        ]);
        let empty: ArrayRef = Arc::new(StringArray::from(Vec::<&str>::new()));
        let batch = RecordBatch::try_new(Arc::new(schema), vec![empty.clone(), empty])?;
        NormalizedTable::new(batch, 0)
    }
}

/// A review table guaranteed to carry non-empty `review_text` and a populated
/// `group_attribute` on every row. Only [`Normalizer::normalize`] builds one.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    batch: RecordBatch,
    texts: StringArray,
    groups: StringArray,
    dropped_rows: usize,
}

impl NormalizedTable {
    fn new(batch: RecordBatch, dropped_rows: usize) -> Result<Self, NormalizeError> {
        let texts = semantic_column(&batch, SemanticField::ReviewText)?;
        let groups = semantic_column(&batch, SemanticField::GroupAttribute)?;
        Ok(Self {
            batch,
            texts,
            groups,
            dropped_rows,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Rows removed because their review text was null or blank.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn review_text(&self, row: usize) -> &str {
        self.texts.value(row)
    }

    pub fn group_attribute(&self, row: usize) -> &str {
        self.groups.value(row)
    }

    pub fn review_texts(&self) -> impl Iterator<Item = &str> {
        (0..self.texts.len()).map(|i| self.texts.value(i))
    }
}

/// Whether a header contains the canonical label, ignoring case and separators.
pub fn header_matches(header: &str, label: &str) -> bool {
    let label = fold_header(label);
    !label.is_empty() && fold_header(header).contains(&label)
}

/// Lowercase and collapse every run of non-alphanumeric characters to one space.
fn fold_header(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_column(
    names: &[&str],
    field: SemanticField,
    label: &str,
    exclude: Option<usize>,
) -> Option<usize> {
    let eligible = |i: usize| Some(i) != exclude;

    if let Some(i) = names.iter().position(|n| *n == field.column_name())
        && eligible(i)
    {
        return Some(i);
    }

    let candidates: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|&(i, name)| eligible(i) && header_matches(name, label))
        .map(|(i, _)| i)
        .collect();

    if candidates.len() > 1 {
        let others: Vec<&str> = candidates[1..].iter().map(|&i| names[i]).collect();
        warn!(
            field = %field,
            chosen = names[candidates[0]],
            ?others,
            "several columns match; using the first"
        );
    }

    candidates.first().copied()
}

fn to_utf8(col: &ArrayRef) -> Result<StringArray, ArrowError> {
    let utf8 = cast(col.as_ref(), &DataType::Utf8)?;
    utf8.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| ArrowError::CastError(format!("cannot view {} as Utf8", col.data_type())))
}

fn fill_blank(values: &StringArray, default: &str) -> StringArray {
    values
        .iter()
        .map(|v| match v {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => Some(default),
        })
        .collect()
}

fn semantic_column(batch: &RecordBatch, field: SemanticField) -> Result<StringArray, ArrowError> {
    let col = batch.column_by_name(field.column_name()).ok_or_else(|| {
        ArrowError::SchemaError(format!("normalized table lacks `{field}`"))
    })?;
    to_utf8(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;

    /// Build a Utf8 batch from `(header, values)` pairs.
    fn batch(cols: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
        let fields: Vec<Field> = cols
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = cols
            .iter()
            .map(|(_, values)| Arc::new(StringArray::from(values.clone())) as ArrayRef)
            .collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    fn column_names(batch: &RecordBatch) -> Vec<String> {
        batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    #[test]
    fn header_matching_folds_case_and_separators() {
        assert!(header_matches("Review Text", "review text"));
        assert!(header_matches("Review_Text", "review text"));
        assert!(header_matches("review text (raw)", "review text"));
        assert!(header_matches("  REVIEW--TEXT ", "Review Text"));
        assert!(header_matches("Department Name", "department"));
        assert!(!header_matches("ReviewText", "review text"));
        assert!(!header_matches("Comments", "review text"));
        assert!(!header_matches("anything", ""));
        assert!(!header_matches("anything", " _ "));
    }

    #[test]
    fn renames_original_headers_in_place() {
        let raw = batch(&[
            ("Clothing ID", vec![Some("1"), Some("2")]),
            ("Review Text", vec![Some("Love it"), Some("Too small")]),
            ("Department Name", vec![Some("Tops"), Some("Dresses")]),
        ]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(
            column_names(table.batch()),
            vec!["Clothing ID", "review_text", "group_attribute"]
        );
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.review_text(1), "Too small");
        assert_eq!(table.group_attribute(0), "Tops");
        assert_eq!(table.dropped_rows(), 0);
    }

    #[test]
    fn exact_semantic_names_need_no_rename() {
        let raw = batch(&[
            ("group_attribute", vec![Some("Bottoms")]),
            ("review_text", vec![Some("Fine")]),
        ]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(
            column_names(table.batch()),
            vec!["group_attribute", "review_text"]
        );
        assert_eq!(table.group_attribute(0), "Bottoms");
    }

    #[test]
    fn exact_name_beats_earlier_fuzzy_match() {
        let raw = batch(&[
            ("Review Text (old)", vec![Some("stale")]),
            ("review_text", vec![Some("fresh")]),
        ]);

        let mapping = Normalizer::new().resolve(&raw.schema()).unwrap();
        assert_eq!(mapping.review_text, 1);
    }

    #[test]
    fn header_variants_resolve() {
        for header in ["Review_Text", "review text (raw)", "REVIEW TEXT"] {
            let raw = batch(&[(header, vec![Some("ok")])]);
            let table = Normalizer::new().normalize(&raw).unwrap();
            assert_eq!(table.review_text(0), "ok", "header {header:?}");
        }
    }

    #[test]
    fn first_matching_column_wins() {
        let raw = batch(&[
            ("Review Text A", vec![Some("first")]),
            ("Review Text B", vec![Some("second")]),
        ]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(table.review_text(0), "first");
        assert_eq!(
            column_names(table.batch()),
            vec!["review_text", "Review Text B", "group_attribute"]
        );
    }

    #[test]
    fn missing_text_column_fails() {
        let raw = batch(&[
            ("Comments", vec![Some("great")]),
            ("Store", vec![Some("0042")]),
        ]);

        let err = Normalizer::new().normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MissingRequiredColumn(SemanticField::ReviewText)
        ));
        assert_eq!(
            err.to_string(),
            "missing required column: no input column maps to `review_text`"
        );
    }

    #[test]
    fn missing_group_column_defaults_to_unknown() {
        let raw = batch(&[("Review Text", vec![Some("a review"), Some("another")])]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(
            column_names(table.batch()),
            vec!["review_text", "group_attribute"]
        );
        for row in 0..table.num_rows() {
            assert_eq!(table.group_attribute(row), UNKNOWN_GROUP);
        }
    }

    #[test]
    fn blank_group_values_take_default() {
        let raw = batch(&[
            ("Review Text", vec![Some("a"), Some("b"), Some("c")]),
            ("Department Name", vec![Some("Tops"), None, Some("  ")]),
        ]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(table.group_attribute(0), "Tops");
        assert_eq!(table.group_attribute(1), "Unknown");
        assert_eq!(table.group_attribute(2), "Unknown");
    }

    #[test]
    fn drops_rows_with_null_or_blank_text() {
        let raw = batch(&[
            (
                "Review Text",
                vec![Some("kept"), None, Some(""), Some("   "), Some("also kept")],
            ),
            (
                "Department Name",
                vec![Some("A"), Some("B"), Some("C"), Some("D"), Some("E")],
            ),
        ]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.dropped_rows(), 3);
        assert_eq!(table.num_rows(), raw.num_rows() - table.dropped_rows());
        let texts: Vec<&str> = table.review_texts().collect();
        assert_eq!(texts, vec!["kept", "also kept"]);
        assert_eq!(table.group_attribute(1), "E");
    }

    #[test]
    fn text_column_not_reused_for_grouping() {
        let raw = batch(&[("Department Store Review Text", vec![Some("meh")])]);

        let mapping = Normalizer::new().resolve(&raw.schema()).unwrap();
        assert_eq!(mapping.review_text, 0);
        assert_eq!(mapping.group_attribute, None);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(table.group_attribute(0), "Unknown");
    }

    #[test]
    fn non_text_values_are_coerced() {
        let schema = Schema::new(vec![
            Field::new("Review Text", DataType::Int64, true),
            Field::new("Department", DataType::Int64, true),
        ]);
        let raw = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(42), None])),
                Arc::new(Int64Array::from(vec![Some(7), Some(8)])),
            ],
        )
        .unwrap();

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.review_text(0), "42");
        assert_eq!(table.group_attribute(0), "7");
        assert_eq!(
            table.batch().schema().field(0).data_type(),
            &DataType::Utf8
        );
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let raw = RecordBatch::new_empty(Arc::new(Schema::empty()));

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            column_names(table.batch()),
            vec!["review_text", "group_attribute"]
        );
    }

    #[test]
    fn header_only_table_has_zero_rows() {
        let raw = batch(&[("Review Text", vec![]), ("Department Name", vec![])]);

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.dropped_rows(), 0);
    }

    #[test]
    fn custom_labels_and_default() {
        let raw = batch(&[
            ("Customer Comment", vec![Some("nice")]),
            ("Store Region", vec![None]),
        ]);

        let normalizer = Normalizer::new()
            .with_text_label("comment")
            .with_group_label("region")
            .with_default_group("N/A");
        let table = normalizer.normalize(&raw).unwrap();
        assert_eq!(table.review_text(0), "nice");
        assert_eq!(table.group_attribute(0), "N/A");
    }

    #[test]
    fn preserves_schema_metadata() {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("source".to_string(), "upload".to_string());
        let schema = Schema::new(vec![Field::new("Review Text", DataType::Utf8, true)])
            .with_metadata(metadata);
        let raw = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["x"]))],
        )
        .unwrap();

        let table = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(
            table.batch().schema().metadata().get("source").map(String::as_str),
            Some("upload")
        );
    }
}
