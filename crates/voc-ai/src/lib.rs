//! Review enrichment: VADER sentiment scoring, keyword issue tagging, and
//! the aggregate views built from an enriched table.

pub mod engine;
pub mod insights;
pub mod lexicon;
pub mod rules;
pub mod scorer;
pub mod vader;

pub use engine::{Enrichment, EnrichmentEngine};
pub use insights::{Insights, negative_rows};
pub use lexicon::{Lexicon, LexiconError};
pub use rules::{IssueRule, IssueRules};
pub use scorer::{CompoundScorer, SentimentScorer};
pub use vader::VaderScorer;
