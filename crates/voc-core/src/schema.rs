/// Column names and Arrow fields for review tables.
pub mod reviews {
    use arrow::datatypes::{DataType, Field};

    pub const REVIEW_TEXT: &str = "review_text";
    pub const GROUP_ATTRIBUTE: &str = "group_attribute";
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    pub const SENTIMENT_LABEL: &str = "sentiment_label";
    pub const ISSUE_TAG: &str = "issue_tag";

    /// Columns appended by enrichment, in output order.
    pub const DERIVED_COLUMNS: &[&str] = &[SENTIMENT_SCORE, SENTIMENT_LABEL, ISSUE_TAG];

    /// Columns every enriched table carries, in addition to its input columns.
    pub const GUARANTEED_COLUMNS: &[&str] = &[
        REVIEW_TEXT,
        GROUP_ATTRIBUTE,
        SENTIMENT_SCORE,
        SENTIMENT_LABEL,
        ISSUE_TAG,
    ];

    /// Field for the normalized review text column.
    pub fn review_text_field() -> Field {
        Field::new(REVIEW_TEXT, DataType::Utf8, false)
    }

    /// Field for the normalized grouping column.
    pub fn group_attribute_field() -> Field {
        Field::new(GROUP_ATTRIBUTE, DataType::Utf8, false)
    }

    /// Fields appended by enrichment. None of them are nullable.
    pub fn derived_fields() -> Vec<Field> {
        vec![
            Field::new(SENTIMENT_SCORE, DataType::Float64, false),
            Field::new(SENTIMENT_LABEL, DataType::Utf8, false),
            Field::new(ISSUE_TAG, DataType::Utf8, false),
        ]
    }
}
