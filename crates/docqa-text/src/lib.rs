//! docqa-text
//!
//! Tantivy-based text analysis shared by ingest and retrieval: tokenizing with
//! stopword removal, keyword and tag extraction, and lexical overlap checks.

pub mod analyzer;
pub mod keywords;
pub mod overlap;

pub use analyzer::Analyzer;
pub use keywords::{extract_tags, strongest_keyword, top_keywords};
pub use overlap::{contains_phrase, keyword_fraction, normalize};
