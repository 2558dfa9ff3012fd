use anyhow::{anyhow, bail, Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use topicscope::{
    AnalyticsAggregator, Backend, BatchSession, Completion, GatewayError, HistoryEntry,
    HistoryManager, PredictionSession, ResolvedIdentity, UploadFile,
};

use crate::config::Config;

/// Everything a command needs, built once in `main`
pub struct Context {
    pub backend: Arc<dyn Backend>,
    pub identity: ResolvedIdentity,
    pub config: Config,
}

fn report(error: GatewayError) -> anyhow::Error {
    if error.is_retryable() {
        anyhow!("{} You can try again.", error.user_message())
    } else {
        anyhow!(error.user_message())
    }
}

fn settled<T>(completion: Completion<Result<T, GatewayError>>) -> Result<T> {
    match completion {
        Completion::Applied(result) => result.map_err(report),
        Completion::Superseded => bail!("Request was superseded by a newer one"),
    }
}

fn print_entries(entries: &[HistoryEntry], selection: &[String]) {
    for entry in entries {
        let mark = if selection.contains(&entry.url) { "[x]" } else { "[ ]" };
        println!(
            "{} {}  {}  {:<20} {}",
            mark,
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.prediction,
            entry.url
        );
    }
}

pub async fn predict(ctx: &Context, url: &str, save: bool, top: usize) -> Result<()> {
    let session = PredictionSession::new(ctx.backend.clone(), ctx.identity.identity.clone());
    let result = settled(session.submit(url).await)?;

    println!("Topic: {}", result.topic);
    if result.from_cache {
        println!("(served from cache)");
    }
    let words = result.top_words(top);
    if !words.is_empty() {
        println!("Top words:");
        for word in words {
            println!("  {:<20} {}", word.word, word.count);
        }
    }

    if save {
        let path = session
            .save_content(&ctx.config.storage.download_dir)
            .await
            .map_err(|e| match e.downcast::<GatewayError>() {
                Ok(gateway) => report(gateway),
                Err(other) => other,
            })?;
        println!("Saved content to {}", path.display());
    }
    Ok(())
}

pub async fn batch(ctx: &Context, file: &Path) -> Result<()> {
    let upload = UploadFile::from_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    tracing::info!("Uploading {} URLs from {}", upload.url_lines().len(), upload.name);

    let session = BatchSession::new(ctx.backend.clone(), ctx.identity.identity.clone());
    let output = settled(session.submit(upload).await)?;

    for group in &output.groups {
        println!("{} ({})", group.topic, group.urls.len());
        for url in &group.urls {
            println!("  {}", url);
        }
    }

    let failed: Vec<_> = output
        .items
        .iter()
        .filter_map(|item| item.error().map(|error| (&item.url, error)))
        .collect();
    if !failed.is_empty() {
        println!("Failed ({})", failed.len());
        for (url, error) in failed {
            println!("  {}: {}", url, error);
        }
    }

    println!(
        "{} URLs, {} from cache, {} failed",
        output.items.len(),
        output.cache_hits(),
        output.failures()
    );
    Ok(())
}

async fn load_history(ctx: &Context, limit: Option<usize>) -> Result<HistoryManager> {
    let manager = HistoryManager::new(ctx.backend.clone(), ctx.identity.identity.clone())
        .with_page_size(ctx.config.history.page_size);
    settled(manager.load(limit.unwrap_or(ctx.config.history.limit)).await)?;
    Ok(manager)
}

pub async fn history(
    ctx: &Context,
    filter: Option<&str>,
    page: usize,
    page_size: Option<usize>,
    limit: Option<usize>,
) -> Result<()> {
    let manager = load_history(ctx, limit).await?;
    if let Some(text) = filter {
        manager.set_filter(text).await;
    }
    if let Some(size) = page_size {
        manager.set_page_size(size).await;
    }
    let size = page_size.unwrap_or(ctx.config.history.page_size).max(1);
    manager.set_offset(page.saturating_sub(1) * size).await;

    let page = manager.page().await;
    if page.total_filtered == 0 {
        println!("No predictions found");
        return Ok(());
    }

    print_entries(&page.entries, &[]);
    println!(
        "Page {} of {} ({} entries)",
        page.page_index() + 1,
        page.page_count(),
        page.total_filtered
    );
    Ok(())
}

pub async fn retrain(ctx: &Context, urls: &[String], filter: Option<&str>, all: bool) -> Result<()> {
    let manager = load_history(ctx, None).await?;
    if let Some(text) = filter {
        manager.set_filter(text).await;
    }
    if all {
        manager.select_all_filtered().await;
    }
    for url in urls {
        if !manager.selection().await.contains(url) && !manager.toggle_select(url).await {
            tracing::warn!("{} is not in the history, skipping", url);
        }
    }

    let selection = manager.selection().await;
    print_entries(
        &manager
            .entries()
            .await
            .into_iter()
            .filter(|entry| selection.contains(&entry.url))
            .collect::<Vec<_>>(),
        &selection,
    );

    let outcome = manager.request_retrain().await.map_err(report)?;
    println!("{}", outcome.message);
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    let manager = load_history(ctx, None).await?;
    let message = manager.request_delete(id).await.map_err(report)?;
    println!("{}", message);
    println!("{} entries remaining", manager.entries().await.len());
    Ok(())
}

pub async fn analytics(ctx: &Context, days: Option<u32>) -> Result<()> {
    let aggregator = AnalyticsAggregator::new(ctx.backend.clone(), ctx.identity.identity.clone())
        .with_days(days.unwrap_or(ctx.config.analytics.days));
    let summary = settled(aggregator.load().await)?;

    println!("Predictions in the last {} days: {}", aggregator.days(), summary.total_predictions());
    println!("Topics:");
    for share in aggregator.topic_shares().await {
        println!("  {:<20} {:>4}  {:>5.1}%", share.topic, share.count, share.percentage);
    }
    println!("Daily activity:");
    for day in aggregator.activity_series().await {
        println!("  {}  {:>4}  {}", day.date, day.count, "#".repeat(day.count.min(50) as usize));
    }
    Ok(())
}

pub fn whoami(ctx: &Context) {
    println!("{}", ctx.identity.identity);
    if !ctx.identity.is_persistent() {
        println!("(temporary: identity storage is unavailable)");
    }
}
