use docqa_core::error::Error;
use docqa_core::types::{
    Chunk, Document, EmbeddingSource, EmptyReason, NewChunk, QueryRequest, QueryResponse, ScoredChunk, SourceRef,
    StrategyKind,
};
use serde_json::json;
use std::sync::Arc;

fn chunk(text: &str) -> Chunk {
    Chunk::from_new(
        NewChunk {
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
            vector: vec![1.0],
            lexical_vector: vec![1.0],
            embedding_source: EmbeddingSource::Provider,
            file_name: "doors.txt".to_string(),
            system: "building".to_string(),
            subsystem: "entrances".to_string(),
            mime_type: "text/plain".to_string(),
            tags: Default::default(),
            content_hash: "abc".to_string(),
            chunk_index: 0,
            total_chunks: 1,
        },
        7,
    )
}

#[test]
fn empty_response_is_tagged_and_distinct_from_error() {
    let empty = serde_json::to_value(QueryResponse::empty(EmptyReason::EmptyIndex, 0)).unwrap();
    assert_eq!(empty["kind"], "empty");
    assert_eq!(empty["reason"], "empty_index");
    assert_eq!(empty["totalIndexed"], 0);

    let error = serde_json::to_value(QueryResponse::error(&Error::InvalidQuery("query is required".into()))).unwrap();
    assert_eq!(error, json!({ "kind": "error", "detail": "Invalid query: query is required" }));
}

#[test]
fn found_response_uses_camel_case_sources() {
    let hit = ScoredChunk { chunk: Arc::new(chunk("Door Width:   1.3 meters")), score: 0.9, raw_score: 0.6, boost: 0.3 };
    let response = QueryResponse::Found {
        answer: "1.3 m".to_string(),
        sources: vec![SourceRef::from_scored(&hit, 200)],
        used: 1,
        total_indexed: 4,
        strategy: StrategyKind::SingleKeyword,
        degraded: false,
    };

    let v = serde_json::to_value(&response).unwrap();
    assert_eq!(v["kind"], "found");
    assert_eq!(v["strategy"], "single_keyword");
    assert_eq!(v["totalIndexed"], 4);
    assert_eq!(v["sources"][0]["fileName"], "doors.txt");
    assert_eq!(v["sources"][0]["chunkId"], "chunk-000007");
    assert_eq!(v["sources"][0]["preview"], "Door Width: 1.3 meters");
}

#[test]
fn chunk_serialization_omits_vectors() {
    let v = serde_json::to_value(chunk("text")).unwrap();
    assert!(v.get("vector").is_none());
    assert!(v.get("lexicalVector").is_none());
    assert_eq!(v["embeddingSource"], "provider");
}

#[test]
fn preview_truncates_on_char_boundary() {
    let c = chunk("żółw żółw żółw");
    assert_eq!(c.preview(6), "żółw ż...");
}

#[test]
fn request_payloads_deserialize_from_camel_case() {
    let doc: Document = serde_json::from_value(json!({
        "fileName": "a.txt",
        "content": "hello world",
        "system": "hvac"
    }))
    .unwrap();
    assert_eq!(doc.mime_type, "text/plain");
    assert_eq!(doc.subsystem, "");

    let req: QueryRequest = serde_json::from_value(json!({ "query": "door", "tags": ["frame"] })).unwrap();
    assert_eq!(req.k, None);
    assert_eq!(req.tags, Some(vec!["frame".to_string()]));
}
