//! Query reformulation steps tried by the planner, in order.

use docqa_core::config::PlannerSettings;
use docqa_core::types::{Query, StrategyKind};
use docqa_text::{strongest_keyword, top_keywords, Analyzer};

pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    /// The query to run for this step, or `None` when there is nothing to try.
    fn reformulate(&self, query: &Query) -> Option<Query>;
}

/// The query exactly as asked.
pub struct Verbatim;

impl Strategy for Verbatim {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Verbatim
    }

    fn reformulate(&self, query: &Query) -> Option<Query> {
        Some(query.clone())
    }
}

/// Same text with a smaller k.
pub struct ReducedK {
    pub reduced_k: usize,
}

impl Strategy for ReducedK {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ReducedK
    }

    fn reformulate(&self, query: &Query) -> Option<Query> {
        Some(query.reformulated(query.text.clone(), query.k.min(self.reduced_k)))
    }
}

/// Lowercased content words only, the most specific `max_keywords` of them.
pub struct Keywords {
    pub max_keywords: usize,
    analyzer: Analyzer,
}

impl Keywords {
    pub fn new(max_keywords: usize) -> Self {
        Self { max_keywords, analyzer: Analyzer::new() }
    }
}

impl Strategy for Keywords {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keywords
    }

    fn reformulate(&self, query: &Query) -> Option<Query> {
        let words = top_keywords(&self.analyzer, &query.text, self.max_keywords);
        if words.is_empty() {
            return None;
        }
        Some(query.reformulated(words.join(" "), query.k))
    }
}

/// The single strongest keyword.
pub struct SingleKeyword {
    analyzer: Analyzer,
}

impl SingleKeyword {
    pub fn new() -> Self {
        Self { analyzer: Analyzer::new() }
    }
}

impl Default for SingleKeyword {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SingleKeyword {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SingleKeyword
    }

    fn reformulate(&self, query: &Query) -> Option<Query> {
        strongest_keyword(&self.analyzer, &query.text).map(|word| query.reformulated(word, query.k))
    }
}

pub fn default_strategies(settings: &PlannerSettings) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(Verbatim),
        Box::new(ReducedK { reduced_k: settings.reduced_k }),
        Box::new(Keywords::new(settings.max_keywords)),
        Box::new(SingleKeyword::new()),
    ]
}
