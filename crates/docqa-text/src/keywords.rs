//! Keyword reformulation for the planner and tag extraction for ingest.

use std::collections::HashMap;

use crate::analyzer::Analyzer;

/// Up to `n` content words, preferring longer (more specific) words, returned in
/// the order they appear in `text`.
pub fn top_keywords(analyzer: &Analyzer, text: &str, n: usize) -> Vec<String> {
	let words = analyzer.content_words(text);
	let mut ranked: Vec<(usize, &String)> = words.iter().enumerate().collect();
	// stable: equal lengths keep query order
	ranked.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
	let mut keep: Vec<usize> = ranked.into_iter().take(n).map(|(idx, _)| idx).collect();
	keep.sort_unstable();
	keep.into_iter().map(|idx| words[idx].clone()).collect()
}

/// The longest content word; the first one wins a tie.
pub fn strongest_keyword(analyzer: &Analyzer, text: &str) -> Option<String> {
	analyzer
		.content_words(text)
		.into_iter()
		.fold(None, |best: Option<String>, word| match best {
			Some(b) if b.chars().count() >= word.chars().count() => Some(b),
			_ => Some(word),
		})
}

/// Most frequent content words of a chunk, used as its tags. Numbers and
/// words shorter than three characters are skipped.
pub fn extract_tags(analyzer: &Analyzer, text: &str, max_tags: usize) -> Vec<String> {
	let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
	for (pos, token) in analyzer.tokens(text).into_iter().enumerate() {
		if token.chars().count() < 3 || token.chars().all(|c| c.is_ascii_digit()) {
			continue;
		}
		counts.entry(token).or_insert((0, pos)).0 += 1;
	}
	let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
	ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
	ranked.into_iter().take(max_tags).map(|(tag, _)| tag).collect()
}
