mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use docqa_core::error::{Error, IngestIssue};
use docqa_core::types::{Document, EmptyReason, FileOutcome, QueryRequest, QueryResponse, StrategyKind};

use common::{service, test_settings, CountingEmbed, LlmBehavior, ScriptedLlm};

fn doors() -> Document {
    Document::new("doors.txt", "Door Width: 1.3 meters").with_system("building", "entrances")
}

fn boiler() -> Document {
    Document::new("boiler.txt", "The boiler pressure must stay below 2 bar at all times.").with_system("heating", "boiler")
}

#[tokio::test]
async fn five_thousand_char_document_becomes_six_chunks() {
    let svc = service(test_settings(), None, None);

    let report = svc.ingest(Document::new("long.txt", "a".repeat(5000))).await.expect("ingest");

    assert_eq!(report.chunks, 6);
    assert_eq!(report.fallback_embeddings, 0);
    assert!(report.warnings.is_empty());
    let stats = svc.stats().await;
    assert_eq!(stats.total_chunks, 6);
    assert_eq!(stats.unique_files, 1);

    let snap = svc.store().snapshot().await;
    assert!(snap.iter().all(|c| c.total_chunks == 6 && !c.content_hash.is_empty()));
    assert_eq!(snap[5].end_offset, 5000);
}

#[tokio::test]
async fn empty_document_is_rejected_not_indexed() {
    let svc = service(test_settings(), None, None);

    let err = svc.ingest(Document::new("empty.txt", "")).await.expect_err("empty content");

    assert!(matches!(err, Error::IngestValidation { issue: IngestIssue::EmptyContent, .. }));
    assert_eq!(svc.stats().await.total_chunks, 0);
}

#[tokio::test]
async fn small_chunks_are_flagged_in_the_report() {
    let svc = service(test_settings(), None, None);
    let report = svc.ingest(doors()).await.expect("ingest");
    assert_eq!(report.chunks, 1);
    assert!(report.warnings.iter().any(|w| w.contains("average chunk size")));
}

#[tokio::test]
async fn empty_index_query_makes_no_provider_calls() {
    let embed = Arc::new(CountingEmbed::new());
    let llm = Arc::new(ScriptedLlm::answering("unused"));
    let svc = service(test_settings(), Some(embed.clone()), Some(llm.clone()));

    let response = svc.query(QueryRequest::new("door details")).await;

    match response {
        QueryResponse::Empty { reason, total_indexed, .. } => {
            assert_eq!(reason, EmptyReason::EmptyIndex);
            assert_eq!(total_indexed, 0);
        }
        other => panic!("expected empty, got {other:?}"),
    }
    assert_eq!(embed.calls(), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn door_details_answers_from_the_door_document() {
    let embed = Arc::new(CountingEmbed::new());
    let llm = Arc::new(ScriptedLlm::answering("The door is 1.3 meters wide [1]."));
    let svc = service(test_settings(), Some(embed), Some(llm.clone()));
    svc.ingest(doors()).await.expect("ingest doors");
    svc.ingest(boiler()).await.expect("ingest boiler");

    let response = svc.query(QueryRequest::new("door details")).await;

    let QueryResponse::Found { answer, sources, used, total_indexed, strategy, degraded } = response else {
        panic!("expected an answer");
    };
    assert_eq!(answer, "The door is 1.3 meters wide [1].");
    assert_eq!(sources[0].file_name, "doors.txt");
    assert_eq!(sources[0].system, "building");
    assert_eq!(used, sources.len());
    assert_eq!(total_indexed, 2);
    assert_eq!(strategy, StrategyKind::Verbatim);
    assert!(!degraded);
    assert!(llm.last_prompt().contains("Door Width: 1.3 meters"));
}

#[tokio::test]
async fn llm_timeout_after_retrieval_returns_excerpt_and_three_sources() {
    let mut settings = test_settings();
    settings.llm.timeout_ms = 50;
    let llm = Arc::new(ScriptedLlm::new(LlmBehavior::Sleep(Duration::from_secs(5))));
    let svc = service(settings, None, Some(llm));
    for (name, text) in [
        ("pump-a.txt", "Pump flow rate for unit A is 40 liters per minute."),
        ("pump-b.txt", "Pump flow rate for unit B is 55 liters per minute."),
        ("pump-c.txt", "Pump flow rate for unit C is 70 liters per minute."),
    ] {
        svc.ingest(Document::new(name, text)).await.expect("ingest");
    }

    let response = svc.query(QueryRequest::new("pump flow rate")).await;

    let QueryResponse::Found { answer, sources, degraded, .. } = response else {
        panic!("retrieval succeeded, expected a degraded answer");
    };
    assert!(degraded);
    assert!(!answer.is_empty());
    assert_eq!(sources.len(), 3);
}

#[tokio::test]
async fn cleared_documents_never_come_back() {
    let svc = service(test_settings(), None, None);
    svc.ingest(boiler()).await.expect("ingest");
    assert_eq!(svc.clear().await, 1);
    svc.ingest(doors()).await.expect("ingest");

    match svc.query(QueryRequest::new("boiler pressure")).await {
        QueryResponse::Found { sources, .. } => {
            assert!(sources.iter().all(|s| s.file_name != "boiler.txt"));
        }
        QueryResponse::Empty { reason, total_indexed, .. } => {
            assert_eq!(reason, EmptyReason::NoMatch);
            assert_eq!(total_indexed, 1);
        }
        QueryResponse::Error { detail } => panic!("unexpected error: {detail}"),
    }
}

#[tokio::test]
async fn ingest_overlapping_a_clear_is_rejected() {
    // every embedding call takes 300ms, so the clear lands mid-ingest
    let embed = Arc::new(CountingEmbed::slow(Duration::from_millis(300), usize::MAX));
    let svc = Arc::new(service(test_settings(), Some(embed), None));

    let worker = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.ingest(boiler()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    svc.clear().await;

    let result = worker.await.expect("task");
    assert!(matches!(result, Err(Error::IndexState(_))));
    assert_eq!(svc.stats().await.total_chunks, 0);

    svc.ingest(doors()).await.expect("later ingests still work");
    assert_eq!(svc.stats().await.total_chunks, 1);
}

#[tokio::test]
async fn batch_reports_each_file_and_keeps_going() {
    let svc = service(test_settings(), None, None);
    let docs = vec![
        doors(),
        Document::new("blank.txt", "   "),
        Document::new("blob.bin", "\u{FFFD}\u{0001}\u{0002}ab".repeat(10)),
        boiler(),
    ];

    let outcomes = svc.ingest_batch(docs).await;

    assert_eq!(outcomes.len(), 4);
    let indexed: Vec<bool> = outcomes.iter().map(FileOutcome::is_indexed).collect();
    assert_eq!(indexed, vec![true, false, false, true]);
    if let FileOutcome::Rejected { file_name, detail } = &outcomes[1] {
        assert_eq!(file_name, "blank.txt");
        assert!(detail.contains("blank.txt"));
    }
    assert_eq!(svc.stats().await.unique_files, 2);
}

#[tokio::test]
async fn replace_corpus_scopes_search_to_the_new_files() {
    let svc = service(test_settings(), None, None);
    svc.ingest(boiler()).await.expect("ingest");
    svc.ingest(Document::new("old.txt", "Legacy notes about the old chiller plant.")).await.expect("ingest");

    let report = svc.replace_corpus(vec![doors(), Document::new("bad.txt", "")]).await;

    assert_eq!(report.cleared, 2);
    assert_eq!(report.files.iter().filter(|f| f.is_indexed()).count(), 1);
    let stats = svc.stats().await;
    assert_eq!(stats.unique_files, 1);
    assert_eq!(stats.by_system.get("building"), Some(&1));
}

#[tokio::test]
async fn slow_retrieval_times_out_as_empty() {
    let mut settings = test_settings();
    settings.planner.query_timeout_ms = 100;
    // ingest texts are long and fast, the short query text is slow
    let embed = Arc::new(CountingEmbed::slow(Duration::from_secs(2), 20));
    let svc = service(settings, Some(embed), None);
    svc.ingest(boiler()).await.expect("ingest");

    match svc.query(QueryRequest::new("boiler")).await {
        QueryResponse::Empty { reason, total_indexed, message } => {
            assert_eq!(reason, EmptyReason::TimedOut);
            assert_eq!(total_indexed, 1);
            assert!(message.contains("No relevant documents found"));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_query_is_an_error_not_an_empty_result() {
    let svc = service(test_settings(), None, None);
    svc.ingest(doors()).await.expect("ingest");
    assert!(matches!(svc.query(QueryRequest::new("   ")).await, QueryResponse::Error { .. }));
    assert!(matches!(svc.query(QueryRequest::new("door").with_k(0)).await, QueryResponse::Error { .. }));
}

#[tokio::test]
async fn system_filter_limits_sources() {
    let svc = service(test_settings(), None, None);
    svc.ingest(Document::new("hvac.txt", "Replace the air filter every three months.").with_system("HVAC", "air"))
        .await
        .expect("ingest");
    svc.ingest(Document::new("water.txt", "Replace the water filter every six months.").with_system("plumbing", ""))
        .await
        .expect("ingest");

    let response = svc.query(QueryRequest::new("replace filter").with_system("hvac")).await;

    let QueryResponse::Found { sources, .. } = response else {
        panic!("expected results");
    };
    assert!(sources.iter().all(|s| s.system.eq_ignore_ascii_case("hvac")));
}

#[tokio::test]
async fn llm_retries_stay_within_the_query_timeout() {
    let mut settings = test_settings();
    settings.planner.query_timeout_ms = 300;
    settings.llm.retries = 3;
    let llm = Arc::new(ScriptedLlm::new(LlmBehavior::Sleep(Duration::from_secs(5))));
    let svc = service(settings, None, Some(llm));
    svc.ingest(boiler()).await.expect("ingest");

    let started = Instant::now();
    let response = svc.query(QueryRequest::new("boiler pressure")).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(600), "query took {elapsed:?} with a 300ms budget");
    let QueryResponse::Found { degraded, sources, .. } = response else {
        panic!("retrieval succeeded, expected a degraded answer");
    };
    assert!(degraded);
    assert_eq!(sources.len(), 1);
}

#[tokio::test]
async fn reduced_k_step_reuses_the_verbatim_query_vectors() {
    let embed = Arc::new(CountingEmbed::new());
    let svc = service(test_settings(), Some(embed.clone()), None);
    let manual = "Boiler pressure gauge readings remain low during normal heating season operation \
        while circulation pumps run continuously through radiator loops inside apartment buildings, \
        technicians inspect burners, flues, valves, thermostats, expansion tanks and condensate drains yearly.";
    svc.ingest(Document::new("heating.txt", manual)).await.expect("ingest");
    assert_eq!(embed.calls(), 1);

    let response = svc.query(QueryRequest::new("zebra")).await;

    assert!(matches!(response, QueryResponse::Empty { reason: EmptyReason::NoMatch, .. }));
    // verbatim and reduced_k share the text "zebra"; keywords and single_keyword repeat it
    assert_eq!(embed.calls(), 2, "one query embedding for the whole cascade");
}
