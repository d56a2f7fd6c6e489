//! Lexical overlap signals used by the retriever's boost.

/// Lowercase and collapse whitespace.
pub fn normalize(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Fraction of `keywords` that occur verbatim in `normalized_text`.
pub fn keyword_fraction(keywords: &[String], normalized_text: &str) -> f32 {
	if keywords.is_empty() {
		return 0.0;
	}
	let found = keywords.iter().filter(|kw| normalized_text.contains(kw.as_str())).count();
	found as f32 / keywords.len() as f32
}

/// True when the whole normalized query appears in the chunk. Single-word
/// queries never count; `keyword_fraction` already covers them.
pub fn contains_phrase(normalized_query: &str, normalized_text: &str) -> bool {
	normalized_query.contains(' ') && normalized_text.contains(normalized_query)
}
