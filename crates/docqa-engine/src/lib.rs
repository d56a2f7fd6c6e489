//! docqa-engine
//!
//! Query planning, answer synthesis and the `RagService` facade that ties the
//! chunker, embedder, index store and retriever together.

pub mod llm;
pub mod planner;
pub mod service;
pub mod strategy;
pub mod synth;

pub use llm::HttpLlmProvider;
pub use planner::{IndexRetriever, PlanOutcome, Planner, Retrieve};
pub use service::{RagService, ReplaceReport};
pub use strategy::{default_strategies, Strategy};
pub use synth::{Synthesis, Synthesizer};
