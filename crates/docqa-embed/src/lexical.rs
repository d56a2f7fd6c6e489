use std::hash::{Hash, Hasher};

use docqa_text::Analyzer;
use twox_hash::XxHash64;

/// Hashed term-frequency vector over analyzer tokens, L2-normalized.
///
/// Deterministic and offline. Text without content words maps to the zero
/// vector, which scores 0 against everything.
#[derive(Clone)]
pub struct HashingEmbedder {
    dim: usize,
    analyzer: Analyzer,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), analyzer: Analyzer::new() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in self.analyzer.tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}
