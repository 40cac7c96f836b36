//! Compound polarity scoring.
//!
//! [`CompoundScorer`] is a rule-based valence scorer in the VADER style:
//! lexicon valences adjusted for boosters, negation, capitalisation,
//! contrastive "but" and trailing punctuation, summed and squashed into
//! `[-1, 1]`.

use std::sync::OnceLock;

use tracing::error;

use crate::lexicon::Lexicon;

/// Anything that maps text to a compound polarity in `[-1, 1]`.
///
/// Implementations must be deterministic and must not fail: every string,
/// including the empty string, has a score.
pub trait SentimentScorer {
    fn score(&self, text: &str) -> f64;
}

impl<T: SentimentScorer + ?Sized> SentimentScorer for &T {
    fn score(&self, text: &str) -> f64 {
        (**self).score(text)
    }
}

impl<T: SentimentScorer + ?Sized> SentimentScorer for Box<T> {
    fn score(&self, text: &str) -> f64 {
        (**self).score(text)
    }
}

// Empirically derived VADER constants.
const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const ALPHA: f64 = 15.0;
const EXCLAIM_AMP: f64 = 0.292;
const MAX_EXCLAIMS: usize = 4;

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "never", "no", "nobody", "none",
    "nope", "nor", "not", "nothing", "nowhere", "shant", "shouldnt", "wasnt", "werent", "without",
    "wont", "wouldnt",
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously", "fully",
    "greatly", "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
    "particularly", "purely", "quite", "really", "remarkably", "so", "substantially", "super",
    "thoroughly", "totally", "tremendously", "unbelievably", "unusually", "utterly", "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "less", "little", "marginally", "occasionally", "partly",
    "scarcely", "slightly", "somewhat",
];

/// Lexicon-backed compound scorer.
#[derive(Debug, Clone)]
pub struct CompoundScorer {
    lexicon: Lexicon,
}

struct Token {
    lower: String,
    upper: bool,
}

impl CompoundScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Process-wide scorer over the bundled lexicon, parsed on first use.
    pub fn shared() -> &'static CompoundScorer {
        static SHARED: OnceLock<CompoundScorer> = OnceLock::new();
        SHARED.get_or_init(|| {
            let lexicon = Lexicon::builtin().unwrap_or_else(|err| {
                error!(%err, "bundled lexicon failed to parse; scoring everything neutral");
                Lexicon::new()
            });
            CompoundScorer::new(lexicon)
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Valence contributed by the token at `i`, after boosters and negation
    /// in the three preceding tokens.
    fn token_valence(&self, tokens: &[Token], i: usize, cap_diff: bool) -> f64 {
        let token = &tokens[i];
        if booster(&token.lower).is_some() {
            return 0.0;
        }
        if token.lower == "kind" && tokens.get(i + 1).is_some_and(|t| t.lower == "of") {
            return 0.0;
        }
        let Some(mut valence) = self.lexicon.get(&token.lower) else {
            return 0.0;
        };

        if token.upper && cap_diff {
            valence += C_INCR.copysign(valence);
        }

        for distance in 1..=3 {
            if i < distance {
                break;
            }
            let prev = &tokens[i - distance];
            if self.lexicon.contains(&prev.lower) {
                continue;
            }
            let damping = match distance {
                1 => 1.0,
                2 => 0.95,
                _ => 0.9,
            };
            valence += booster_scalar(prev, valence, cap_diff) * damping;
            if is_negation(&prev.lower) {
                valence *= N_SCALAR;
            }
        }

        valence
    }
}

impl SentimentScorer for CompoundScorer {
    fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }

        let upper = tokens.iter().filter(|t| t.upper).count();
        let cap_diff = upper > 0 && upper < tokens.len();

        let mut sentiments: Vec<f64> = (0..tokens.len())
            .map(|i| self.token_valence(&tokens, i, cap_diff))
            .collect();

        // Clauses after "but" dominate the ones before it.
        if let Some(pivot) = tokens.iter().position(|t| t.lower == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < pivot {
                    *s *= 0.5;
                } else if i > pivot {
                    *s *= 1.5;
                }
            }
        }

        let sum: f64 = sentiments.iter().sum();
        compound(sum, punctuation_emphasis(text))
    }
}

/// Squash a raw valence sum into `[-1, 1]`, rounded to four decimals.
fn compound(sum: f64, emphasis: f64) -> f64 {
    let sum = if sum > 0.0 {
        sum + emphasis
    } else if sum < 0.0 {
        sum - emphasis
    } else {
        return 0.0;
    };
    let score = (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0);
    (score * 10_000.0).round() / 10_000.0
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclaims = text.matches('!').count().min(MAX_EXCLAIMS) as f64 * EXCLAIM_AMP;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclaims + questions
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| w.chars().count() > 1)
        .map(|w| Token {
            lower: w.to_lowercase().replace('\u{2019}', "'"),
            upper: w.chars().any(char::is_alphabetic) && !w.chars().any(char::is_lowercase),
        })
        .collect()
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

fn booster(word: &str) -> Option<f64> {
    if BOOSTERS_UP.contains(&word) {
        Some(B_INCR)
    } else if BOOSTERS_DOWN.contains(&word) {
        Some(B_DECR)
    } else {
        None
    }
}

fn booster_scalar(word: &Token, valence: f64, cap_diff: bool) -> f64 {
    let Some(scalar) = booster(&word.lower) else {
        return 0.0;
    };
    let mut scalar = if valence < 0.0 { -scalar } else { scalar };
    if word.upper && cap_diff {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}
