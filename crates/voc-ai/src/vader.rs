//! Default scorer: the published VADER lexicon and rules.
//!
//! [`VaderScorer`] wraps the `vader_sentiment` port, which embeds the full
//! VADER lexicon (about 7,500 entries) and the emoji descriptions. Compound
//! scores are rounded to four decimals.

use std::fmt;
use std::sync::OnceLock;

use vader_sentiment::SentimentIntensityAnalyzer;

use crate::scorer::SentimentScorer;

pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Process-wide instance.
    pub fn shared() -> &'static VaderScorer {
        static SHARED: OnceLock<VaderScorer> = OnceLock::new();
        SHARED.get_or_init(VaderScorer::new)
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VaderScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaderScorer").finish_non_exhaustive()
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);

        // The port applies `?`/`!` emphasis even when no token carries
        // valence, which would make "Where is my order??" negative.
        if get("pos") == 0.0 && get("neg") == 0.0 {
            return 0.0;
        }
        let compound = get("compound");
        if !compound.is_finite() {
            return 0.0;
        }
        ((compound * 10_000.0).round() / 10_000.0).clamp(-1.0, 1.0)
    }
}
