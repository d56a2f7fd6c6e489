//! docqa-embed
//!
//! Embedding for ingest and query: an optional external provider wrapped in the
//! shared call policy, with a deterministic hashed term vector as fallback.

pub mod embedder;
pub mod http;
pub mod lexical;

pub use embedder::Embedder;
pub use http::HttpEmbedProvider;
pub use lexical::HashingEmbedder;
