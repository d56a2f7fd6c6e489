//! docqa-index
//!
//! In-memory chunk store guarded by a generation counter, index statistics,
//! and the scoring retriever (cosine similarity plus metadata and lexical boosts).

pub mod math;
pub mod retriever;
pub mod stats;
pub mod store;

pub use retriever::Retriever;
pub use store::IndexStore;
