//! Ingest-boundary checks: content must be non-trivial text before it is chunked.

use crate::config::IngestSettings;
use crate::error::{Error, IngestIssue, Result};
use crate::types::Document;

pub fn validate_document(doc: &Document, settings: &IngestSettings) -> Result<()> {
    if doc.file_name.trim().is_empty() {
        return Err(Error::ingest(doc.file_name.clone(), IngestIssue::MissingFileName));
    }
    if doc.content.trim().is_empty() {
        return Err(Error::ingest(doc.file_name.clone(), IngestIssue::EmptyContent));
    }

    let visible = doc.content.chars().filter(|c| !c.is_whitespace()).count();
    if visible < settings.min_content_chars {
        return Err(Error::ingest(
            doc.file_name.clone(),
            IngestIssue::TooShort { found: visible, minimum: settings.min_content_chars },
        ));
    }

    let ratio = non_text_ratio(&doc.content);
    if ratio > settings.max_non_text_ratio {
        return Err(Error::ingest(doc.file_name.clone(), IngestIssue::NonText { ratio }));
    }
    Ok(())
}

/// Share of characters that are control codes (other than line breaks and tabs)
/// or U+FFFD replacement characters left behind by lossy decoding.
pub fn non_text_ratio(content: &str) -> f64 {
    let mut total = 0usize;
    let mut suspicious = 0usize;
    for c in content.chars() {
        total += 1;
        let control = c.is_control() && !matches!(c, '\n' | '\r' | '\t');
        if control || c == char::REPLACEMENT_CHARACTER {
            suspicious += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    suspicious as f64 / total as f64
}
