//! Keyword rules for issue tagging.
//!
//! Rules are an ordered list of `(tag, triggers)` pairs checked against the
//! lowercased review text; the first rule with any trigger substring wins.

use voc_core::IssueTag;

/// The standard rule table, in precedence order.
pub const STANDARD_RULES: &[(IssueTag, &[&str])] = &[
    (IssueTag::SizingIssue, &["size", "fit", "small", "large"]),
    (IssueTag::QualityIssue, &["fabric", "quality", "tear"]),
    (IssueTag::SupplyChain, &["shipping", "delivery", "late"]),
    (IssueTag::Pricing, &["price", "expensive"]),
];

/// A single tagging rule: any trigger substring assigns `tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRule {
    pub tag: IssueTag,
    pub triggers: Vec<String>,
}

impl IssueRule {
    /// Triggers are lowercased; empty triggers are dropped since they would match everything.
    pub fn new<I, S>(tag: IssueTag, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let triggers = triggers
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tag, triggers }
    }

    /// Whether any trigger occurs in already-lowercased text.
    pub fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

/// Ordered rule list with a fallback tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRules {
    rules: Vec<IssueRule>,
    fallback: IssueTag,
}

impl Default for IssueRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl IssueRules {
    /// Rules evaluated in the given order, falling back to `General`.
    pub fn new(rules: Vec<IssueRule>) -> Self {
        Self {
            rules,
            fallback: IssueTag::General,
        }
    }

    pub fn standard() -> Self {
        Self::new(
            STANDARD_RULES
                .iter()
                .map(|(tag, triggers)| IssueRule::new(*tag, triggers.iter()))
                .collect(),
        )
    }

    pub fn rules(&self) -> &[IssueRule] {
        &self.rules
    }

    pub fn fallback(&self) -> IssueTag {
        self.fallback
    }

    /// Tag a review. Matching is case-insensitive substring containment.
    pub fn tag(&self, text: &str) -> IssueTag {
        self.tag_lowercase(&text.to_lowercase())
    }

    /// Tag text that is already lowercased.
    pub fn tag_lowercase(&self, lowered: &str) -> IssueTag {
        self.rules
            .iter()
            .find(|rule| rule.matches(lowered))
            .map_or(self.fallback, |rule| rule.tag)
    }
}
