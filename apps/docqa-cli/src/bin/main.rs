use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use docqa_cli::{corpus, logging};
use docqa_core::config::{expand_path, Config};
use docqa_core::types::{FileOutcome, QueryRequest, QueryResponse};
use docqa_engine::RagService;

const USAGE: &str = "Usage:
  docqa ingest [dir]
  docqa stats [dir]
  docqa ask [--dir <dir>] [--k <n>] [--system <name>] [--subsystem <name>] \"<question>\"";

struct AskArgs {
    dir: Option<PathBuf>,
    request: QueryRequest,
}

fn flag_value(args: &[String], i: usize) -> anyhow::Result<String> {
    args.get(i + 1).cloned().with_context(|| format!("{} requires a value", args[i]))
}

fn parse_ask(args: &[String]) -> anyhow::Result<AskArgs> {
    let mut dir = None;
    let mut request = QueryRequest::default();
    let mut question = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" | "-d" => { dir = Some(PathBuf::from(flag_value(args, i)?)); i += 1; }
            "--k" | "-k" => { request.k = Some(flag_value(args, i)?.parse().context("--k requires a number")?); i += 1; }
            "--system" => { request.system = Some(flag_value(args, i)?); i += 1; }
            "--subsystem" => { request.subsystem = Some(flag_value(args, i)?); i += 1; }
            other => question.push(other.to_string()),
        }
        i += 1;
    }
    request.query = question.join(" ");
    Ok(AskArgs { dir, request })
}

async fn ingest_dir(service: &RagService, dir: &Path) -> anyhow::Result<Vec<FileOutcome>> {
    let docs = corpus::load_documents(dir).with_context(|| format!("reading {}", dir.display()))?;
    if docs.is_empty() {
        println!("No text files found under {}.", dir.display());
        return Ok(Vec::new());
    }
    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );
    let mut outcomes = Vec::with_capacity(docs.len());
    for doc in docs {
        pb.set_message(doc.file_name.clone());
        let name = doc.file_name.clone();
        outcomes.push(FileOutcome::from_result(&name, service.ingest(doc).await));
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(outcomes)
}

fn print_outcomes(outcomes: &[FileOutcome]) {
    for outcome in outcomes {
        match outcome {
            FileOutcome::Indexed(r) => {
                println!("  ok   {} ({} chunks, avg {:.0} chars)", r.file_name, r.chunks, r.average_chunk_size);
                for w in &r.warnings {
                    println!("       warning: {w}");
                }
            }
            FileOutcome::Rejected { file_name, detail } => println!("  skip {file_name}: {detail}"),
        }
    }
}

fn print_response(response: &QueryResponse) {
    match response {
        QueryResponse::Found { answer, sources, total_indexed, strategy, degraded, .. } => {
            println!("{answer}\n");
            if *degraded {
                println!("(answer service unavailable, showing the best excerpt)");
            }
            println!("Sources ({} of {total_indexed} chunks, strategy {strategy}):", sources.len());
            for (i, s) in sources.iter().enumerate() {
                println!("  [{}] {} {}/{} score {:.3}", i + 1, s.file_name, s.system, s.subsystem, s.score);
                println!("      {}", s.preview);
            }
        }
        QueryResponse::Empty { message, total_indexed, .. } => println!("{message} ({total_indexed} chunks indexed)"),
        QueryResponse::Error { detail } => eprintln!("Error: {detail}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    let default_dir = expand_path(&settings.data.docs_dir);
    let service = RagService::from_settings(settings)?;

    match cmd.as_str() {
        "ingest" => {
            let dir = args.first().map(PathBuf::from).unwrap_or(default_dir);
            println!("Ingesting from {}", dir.display());
            let outcomes = ingest_dir(&service, &dir).await?;
            print_outcomes(&outcomes);
            let stats = service.stats().await;
            println!("\n{} files, {} chunks indexed", stats.unique_files, stats.total_chunks);
        }
        "stats" => {
            let dir = args.first().map(PathBuf::from).unwrap_or(default_dir);
            ingest_dir(&service, &dir).await?;
            println!("{}", serde_json::to_string_pretty(&service.stats().await)?);
        }
        "ask" => {
            let ask = parse_ask(&args)?;
            if ask.request.query.trim().is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
            let dir = ask.dir.unwrap_or(default_dir);
            ingest_dir(&service, &dir).await?;
            let response = service.query(ask.request).await;
            print_response(&response);
        }
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}
