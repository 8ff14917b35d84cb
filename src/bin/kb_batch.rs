//! Batch helper: upload documents, optionally run an ingestion job to completion, and
//! optionally ask the knowledge base a question.
//!
//! Shares configuration, logging and client setup with the HTTP server.
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::Parser;
use kbgateway::{
    config,
    knowledge_base::{KnowledgeBaseApi, KnowledgeBaseService, PollPolicy, poll_until_terminal},
    logging,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "kb-batch",
    about = "Upload documents to the knowledge base bucket, ingest them, and query"
)]
struct Cli {
    /// Document to upload; may be repeated.
    #[arg(long = "file")]
    files: Vec<PathBuf>,
    /// Directory scanned recursively for documents with the accepted extension.
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Start an ingestion job after uploading and wait for it to finish.
    #[arg(long)]
    ingest: bool,
    /// Question to ask once uploads (and ingestion) are done.
    #[arg(long)]
    query: Option<String>,
    /// Override the delay between ingestion status checks.
    #[arg(long)]
    poll_interval_secs: Option<u64>,
    /// Override the maximum number of ingestion status checks.
    #[arg(long)]
    max_polls: Option<u32>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    let config = config::get_config();
    logging::init_tracing(&config.log_destination);

    let documents = collect_documents(&cli.files, cli.dir.as_deref(), &config.allowed_extension)?;
    if documents.is_empty() && !cli.ingest && cli.query.is_none() {
        bail!("nothing to do: pass --file, --dir, --ingest or --query");
    }

    let service = KnowledgeBaseService::new(config).await;

    for path in &documents {
        upload_file(&service, path).await?;
    }

    if cli.ingest {
        let mut policy = PollPolicy::from_config(config);
        if let Some(secs) = cli.poll_interval_secs {
            policy.interval = Duration::from_secs(secs);
        }
        if let Some(max_polls) = cli.max_polls {
            policy.max_attempts = max_polls.max(1);
        }
        let status = ingest(&service, policy).await?;
        println!("Ingestion finished with status {status}");
    }

    if let Some(query) = cli.query.as_deref() {
        let answer = service
            .query(query)
            .await
            .context("failed to query knowledge base")?;
        println!("{answer}");
    }

    Ok(())
}

/// Explicit files first, then directory matches in path order.
fn collect_documents(
    files: &[PathBuf],
    dir: Option<&Path>,
    extension: &str,
) -> Result<Vec<PathBuf>> {
    let mut documents = files.to_vec();
    if let Some(dir) = dir {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry =
                entry.with_context(|| format!("failed to scan directory {}", dir.display()))?;
            let matches = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(extension));
            if matches {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::info!(dir = %dir.display(), count = found.len(), "Collected documents");
        documents.extend(found);
    }
    Ok(documents)
}

async fn upload_file<S: KnowledgeBaseApi + ?Sized>(service: &S, path: &Path) -> Result<String> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let outcome = service
        .upload_document(filename, Bytes::from(content))
        .await
        .with_context(|| format!("failed to upload {}", path.display()))?;
    println!("{}", outcome.message);
    Ok(outcome.s3_key)
}

async fn ingest<S: KnowledgeBaseApi + ?Sized>(service: &S, policy: PollPolicy) -> Result<String> {
    let job = service
        .start_ingestion()
        .await
        .context("failed to start ingestion job")?;
    println!("Started ingestion job: {}", job.ingestion_job_id);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling ingestion polling");
            trigger.cancel();
        }
    });

    let outcome = poll_until_terminal(service, &job.ingestion_job_id, policy, &cancel).await;
    watcher.abort();
    Ok(outcome?.status)
}

#[cfg(test)]
mod tests {
    use super::collect_documents;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn collects_explicit_files_then_sorted_directory_matches() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("nested")).expect("nested dir");
        fs::write(dir.path().join("b.txt"), "b").expect("write");
        fs::write(dir.path().join("a.txt"), "a").expect("write");
        fs::write(dir.path().join("skip.md"), "skip").expect("write");
        fs::write(dir.path().join("nested").join("c.txt"), "c").expect("write");

        let explicit = PathBuf::from("extra/notes.txt");
        let documents =
            collect_documents(std::slice::from_ref(&explicit), Some(dir.path()), ".txt")
                .expect("collect");

        assert_eq!(
            documents,
            vec![
                explicit,
                dir.path().join("a.txt"),
                dir.path().join("b.txt"),
                dir.path().join("nested").join("c.txt"),
            ]
        );
    }

    #[test]
    fn no_directory_keeps_only_explicit_files() {
        let documents = collect_documents(&[], None, ".txt").expect("collect");
        assert!(documents.is_empty());
    }
}
