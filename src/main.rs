//! `araliya-knowledge` — command-line front end for the knowledge service.
//!
//! # Usage
//!
//! ```text
//! araliya-knowledge [--config <path>] <command> [args]
//!
//! Commands:
//!   create <title> <file> [--type t] [--tag x]...   create a document from a file's content
//!   import <file> [--type t] [--tag x]...           import a .md/.txt file (title = file stem)
//!   get <id>                                        print one document
//!   search <query>                                  ranked full-text search
//!   mentions <query>                                category-prefix suggestions ("@agent/...")
//!   simple-mentions <query>                         flat ranked suggestions (no leading "@")
//!   history <id>                                    version snapshots, newest first
//!   publish <id>                                    mark a document published
//!   delete <id>                                     delete a document and its history
//!   stats                                           index statistics
//! ```
//!
//! Output is JSON on stdout; logs go to stderr. Config resolution follows
//! `config/default.toml` plus `ARALIYA_*` env overrides unless `--config` is given.

use std::path::{Path, PathBuf};
use std::process;

use serde::Serialize;
use tracing::info;

use araliya_knowledge::config;
use araliya_knowledge::error::AppError;
use araliya_knowledge::logger;
use araliya_knowledge::subsystems::knowledge::{DocumentType, KnowledgeService, Registry};
use araliya_knowledge::subsystems::knowledge::registry::{Catalog, StaticAgentRegistry};

// ── CLI arg parsing ────────────────────────────────────────────────────────

struct Args {
    config: Option<PathBuf>,
    command: Option<String>,
    doc_type: Option<String>,
    tags: Vec<String>,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut config = None;
    let mut command = None;
    let mut doc_type = None;
    let mut tags = Vec::new();
    let mut rest = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => config = iter.next().map(PathBuf::from),
            "--type" | "-t" => doc_type = iter.next(),
            "--tag" => tags.extend(iter.next()),
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--" => {
                rest.extend(iter);
                break;
            }
            _ if command.is_none() => command = Some(arg),
            _ => rest.push(arg),
        }
    }

    Args { config, command, doc_type, tags, rest }
}

fn print_help() {
    eprintln!("usage: araliya-knowledge [--config <path>] <command> [args]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  create <title> <file>   create a document from a file's content");
    eprintln!("  import <file>           import a .md/.txt file");
    eprintln!("  get <id>                print one document");
    eprintln!("  search <query>          ranked full-text search");
    eprintln!("  mentions <query>        category-prefix mention suggestions");
    eprintln!("  simple-mentions <query> flat ranked mention suggestions");
    eprintln!("  history <id>            version snapshots, newest first");
    eprintln!("  publish <id>            mark a document published");
    eprintln!("  delete <id>             delete a document and its history");
    eprintln!("  stats                   index statistics");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config, -c <path>   config file (default: config/default.toml)");
    eprintln!("  --type,   -t <type>   document type for create/import (default: note)");
    eprintln!("  --tag <tag>           tag for create/import, repeatable");
    eprintln!("  --help,   -h          print this help");
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_args();
    let Some(command) = args.command.clone() else {
        print_help();
        process::exit(2);
    };

    let config = match &args.config {
        Some(path) => config::load_path(path)?,
        None => config::load()?,
    };
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level, false)?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        user = %config.user,
        store = ?config.store,
        "config loaded"
    );

    let registry = Registry::new(
        std::sync::Arc::new(StaticAgentRegistry::enabled(config.agents.clone())),
        Catalog::builtin(),
    );
    let service = KnowledgeService::open(&config, registry).await?;
    let result = dispatch(&service, &command, &args).await;
    service.close();
    result
}

async fn dispatch(service: &KnowledgeService, command: &str, args: &Args) -> Result<(), AppError> {
    match command {
        "create" => {
            let (title, file) = (arg(args, 0, "title")?, arg(args, 1, "file")?);
            let content = std::fs::read_to_string(Path::new(file))?;
            let doc = service
                .create_document(title, &content, doc_type(args)?, args.tags.clone())
                .await?;
            print_json(&doc)
        }
        "import" => {
            let file = arg(args, 0, "file")?;
            let doc = service
                .import_file(Path::new(file), doc_type(args)?, args.tags.clone())
                .await?;
            print_json(&doc)
        }
        "get" => print_json(&service.get_document(arg(args, 0, "id")?).await?),
        "search" => print_json(&service.search_documents(&args.rest.join(" "))),
        "mentions" => print_json(&service.get_mention_suggestions(&args.rest.join(" "))),
        "simple-mentions" => {
            print_json(&service.get_simple_mention_suggestions(&args.rest.join(" ")))
        }
        "history" => print_json(&service.version_history(arg(args, 0, "id")?).await?),
        "publish" => print_json(&service.publish_document(arg(args, 0, "id")?).await?),
        "delete" => {
            let id = arg(args, 0, "id")?;
            service.delete_document(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        "stats" => print_json(&service.get_stats()),
        other => Err(AppError::Config(format!(
            "unknown command '{other}' (see --help)"
        ))),
    }
}

fn arg<'a>(args: &'a Args, n: usize, name: &str) -> Result<&'a str, AppError> {
    args.rest
        .get(n)
        .map(String::as_str)
        .ok_or_else(|| AppError::Config(format!("missing argument <{name}>")))
}

fn doc_type(args: &Args) -> Result<DocumentType, AppError> {
    args.doc_type
        .as_deref()
        .map_or(Ok(DocumentType::Note), str::parse)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Store(format!("encode output: {e}")))?;
    println!("{out}");
    Ok(())
}
