use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Function words plus the filler that shows up in typed questions ("tell me about ...").
pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	"i","me","my","we","our","you","your","about","tell","please","give","show","find","explain","describe","details","detail","information","info","any","all","some","into","up","out","over",
];

const MAX_TOKEN_LEN: usize = 40;

/// Lowercasing, stopword-stripping tokenizer.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Default for Analyzer {
	fn default() -> Self {
		Self::new()
	}
}

impl Analyzer {
	pub fn new() -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
			.build();
		Self { inner }
	}

	/// All content tokens in order, duplicates included.
	pub fn tokens(&self, text: &str) -> Vec<String> {
		// token_stream needs `&mut`; analyzers are cheap to clone.
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut out = Vec::new();
		stream.process(&mut |token| out.push(token.text.clone()));
		out
	}

	/// Content tokens in first-seen order without duplicates.
	pub fn content_words(&self, text: &str) -> Vec<String> {
		let mut seen = std::collections::HashSet::new();
		self.tokens(text).into_iter().filter(|t| seen.insert(t.clone())).collect()
	}
}
