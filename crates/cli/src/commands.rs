//! Subcommand handlers. Each one runs against a fresh in-memory session.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use vidgen_core::display::{format_ts, progress_label, status_badge};
use vidgen_core::video_request::{CreateVideoRequest, InputReference};
use vidgen_videos::api::{VideoApi, VideoJobs};
use vidgen_videos::config::ClientConfig;
use vidgen_videos::download::{file_name_for, DownloadVariant};
use vidgen_videos::history::prompt_snippet;
use vidgen_videos::listing::{self, DateRange};
use vidgen_videos::normalize::JobRecord;
use vidgen_videos::session::Session;
use vidgen_videos::workflow::{self, Media};

use crate::{Command, OutputArgs, RequestArgs};

pub async fn run(
    command: Command,
    api: &VideoApi,
    config: &ClientConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut session = Session::new();

    match command {
        Command::Generate { request, output } => {
            let request = build_request(request).await?;
            let outcome = workflow::generate(
                api,
                &mut session,
                &request,
                config.poll_interval(),
                cancel,
                print_progress,
            )
            .await?;

            print_record(&outcome.record);
            let id = outcome.record.id().unwrap_or_default().to_string();
            match outcome.media {
                Media::Bytes(bytes) => {
                    let path = output.output.unwrap_or_else(|| file_name_for(&id, None).into());
                    tokio::fs::write(&path, &bytes)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Saved {} ({} bytes)", path.display(), bytes.len());
                }
                Media::Url(url) => {
                    println!("Media: {url}");
                    if let Some(path) = output.output {
                        download_to_file(api, &id, None, &path).await?;
                    }
                }
                Media::Unavailable => {
                    println!("No media available yet; try `vidgen download {id}` later");
                }
            }
            write_metadata(&outcome.record, output.metadata.as_deref()).await?;

            if let Some(entry) = session.recent(1).first() {
                println!("History: {}", entry.describe());
            }
        }

        Command::Create { request } => {
            let request = build_request(request).await?;
            let record = api.create(&request).await?;
            println!(
                "{}  {}",
                record.id().unwrap_or_default(),
                badge(&record)
            );
        }

        Command::Poll { id, output } => {
            let record = workflow::resume_polling(
                api,
                &mut session,
                &id,
                config.poll_interval(),
                cancel,
                print_progress,
            )
            .await?;

            print_record(&record);
            let path = output.output.unwrap_or_else(|| file_name_for(&id, None).into());
            if let Err(e) = download_to_file(api, &id, None, &path).await {
                tracing::warn!(job_id = %id, error = %e, "Media download failed");
            }
            write_metadata(&record, output.metadata.as_deref()).await?;
        }

        Command::Get { id, metadata } => {
            let record = workflow::open_job(api, &mut session, &id).await?;
            print_record(&record);
            write_metadata(&record, metadata.as_deref()).await?;
        }

        Command::List {
            status,
            order,
            pages,
            since,
            until,
        } => {
            session.listing_mut().set_filter(status);
            session.listing_mut().set_order(order);

            listing::refresh(api, &mut session).await?;
            for _ in 1..pages {
                if listing::load_more(api, &mut session).await? == 0 {
                    break;
                }
            }

            let range = DateRange::new(since, until);
            let rows = range.apply(session.listing().rows());
            if rows.is_empty() {
                println!("No jobs found ({})", status.label());
            }
            for row in rows {
                print_row(row);
            }
            if session.listing().has_more() {
                println!("More jobs available; raise --pages to load them");
            }
        }

        Command::Download {
            id,
            variant,
            output,
        } => {
            let path = output.unwrap_or_else(|| file_name_for(&id, variant).into());
            download_to_file(api, &id, variant, &path).await?;
        }

        Command::Delete { id } => {
            let ack = workflow::delete_job(api, &mut session, &id).await?;
            if ack.deleted {
                println!("Deleted {id}");
            } else {
                println!("Delete requested for {id}; the service did not confirm it");
            }
        }
    }

    Ok(())
}

async fn build_request(args: RequestArgs) -> anyhow::Result<CreateVideoRequest> {
    let input_reference = match args.reference {
        Some(path) => Some(read_reference(&path).await?),
        None => None,
    };

    Ok(CreateVideoRequest {
        prompt: args.prompt,
        model: args.model,
        seconds: args.seconds,
        size: args.size,
        input_reference,
    })
}

async fn read_reference(path: &Path) -> anyhow::Result<InputReference> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading reference image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(InputReference { file_name, bytes })
}

async fn download_to_file(
    api: &VideoApi,
    id: &str,
    variant: Option<DownloadVariant>,
    path: &Path,
) -> anyhow::Result<()> {
    let total = api
        .download_to_file(id, variant, path)
        .await
        .with_context(|| format!("downloading {id} to {}", path.display()))?;
    println!("Saved {} ({total} bytes)", path.display());
    Ok(())
}

async fn write_metadata(record: &JobRecord, path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    tokio::fs::write(path, record.metadata_json())
        .await
        .with_context(|| format!("writing metadata {}", path.display()))?;
    println!("Metadata written to {}", path.display());
    Ok(())
}

// ---- output ----

fn badge(record: &JobRecord) -> String {
    status_badge(record.raw.get("status").and_then(Value::as_str))
}

fn print_progress(record: &JobRecord) {
    println!(
        "{}  {:<12} {}",
        record.id().unwrap_or("-"),
        badge(record),
        progress_label(record.progress)
    );
}

fn print_record(record: &JobRecord) {
    println!("id:       {}", record.id().unwrap_or("-"));
    println!("status:   {} ({}%)", badge(record), record.progress);
    println!("model:    {}", record.model);
    println!("size:     {}", record.size);
    println!("seconds:  {}", record.seconds);
    println!("created:  {}", format_ts(record.created_at));
    println!("updated:  {}", format_ts(record.updated_at));
    if let Some(prompt) = &record.prompt {
        println!("prompt:   {}", prompt_snippet(prompt));
    }
    if let Some(url) = &record.asset_url {
        println!("asset:    {url}");
    }
}

fn print_row(record: &JobRecord) {
    println!(
        "{:<28} {:<12} {:>3}%  {:<10} {:>3}s  {}  {}",
        record.id().unwrap_or("-"),
        badge(record),
        record.progress,
        record.size,
        record.seconds,
        format_ts(record.created_at),
        record.prompt.as_deref().map(prompt_snippet).unwrap_or_default(),
    );
}
