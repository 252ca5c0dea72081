//! Keyword-based choice of a decomposition strategy.

use crate::core::Strategy;

const AGGREGATION_KEYWORDS: &[&str] = &[
    "average",
    "mean",
    "total",
    "sum",
    "count",
    "maximum",
    "minimum",
    "max",
    "min",
    "aggregate",
    "total number",
    "how many",
];

const COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "which",
    "better",
    "higher",
    "lower",
    "greater",
    "less",
    "more than",
    "less than",
    "versus",
    "vs",
    "between",
];

const BRIDGE_KEYWORDS: &[&str] = &[
    "with",
    "where",
    "that",
    "which have",
    "whose",
    "for",
    "of",
    "containing",
    "including",
    "filtered by",
];

const SEQUENTIAL_KEYWORDS: &[&str] = &[
    "trend",
    "over time",
    "from",
    "to",
    "between",
    "during",
    "sequence",
    "order",
    "chronological",
];

const INDEPENDENT_KEYWORDS: &[&str] = &[
    "list",
    "top",
    "bottom",
    "all",
    "each",
    "separate",
    "individually",
    "respectively",
];

/// Returns the keyword list scored for a strategy.
#[must_use]
pub fn strategy_keywords(strategy: Strategy) -> &'static [&'static str] {
    match strategy {
        Strategy::Aggregation => AGGREGATION_KEYWORDS,
        Strategy::Comparison => COMPARISON_KEYWORDS,
        Strategy::Bridge => BRIDGE_KEYWORDS,
        Strategy::Sequential => SEQUENTIAL_KEYWORDS,
        Strategy::Independent => INDEPENDENT_KEYWORDS,
    }
}

/// Counts how many of a strategy's keywords occur in the lower-cased
/// question. Matching is by substring, so "to" also hits "total".
#[must_use]
pub fn strategy_score(question: &str, strategy: Strategy) -> usize {
    let lowered = question.to_lowercase();
    strategy_keywords(strategy)
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count()
}

/// Picks the strategy whose keywords occur most often in the question.
///
/// Ties go to the earlier strategy in [`Strategy::PRIORITY`]. A question
/// with no keyword hits at all is treated as aggregation.
#[must_use]
pub fn classify(question: &str) -> Strategy {
    let mut best = Strategy::default();
    let mut best_score = 0;

    for strategy in Strategy::PRIORITY {
        let score = strategy_score(question, strategy);
        if score > best_score {
            best = strategy;
            best_score = score;
        }
    }

    best
}
