//! pageswap - Main Entry Point
//!
//! Loads a page from a live site into a headless document and clicks
//! through the given paths, printing each navigation and the session's
//! performance summary.

use anyhow::{Context, Result};
use clap::Parser;
use pageswap::net::{CancellationToken, HttpFetcher, PageFetcher, Url};
use pageswap::{
    request_path, ClickDecision, ClickEvent, DocumentAdapter, HeadlessDocument, LinkTarget,
    NavigationConfig, NavigationOutcome, NavigationSession,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "pageswap", version, about = "Fetch-and-swap navigation against a live site")]
struct Cli {
    /// Page to start from, e.g. https://example.com/
    base_url: Url,

    /// Paths (or hrefs) to click through, in order
    paths: Vec<String>,

    /// Hover each link before clicking it
    #[arg(long)]
    prefetch: bool,

    /// Navigation config as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the performance report as JSON ("-" for stdout)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Go back this many history entries after the last click
    #[arg(long, default_value_t = 0)]
    back: usize,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let fetcher = HttpFetcher::new(cli.base_url.clone())?;

    smol::block_on(run(&cli, &fetcher, config))
}

fn load_config(path: Option<&Path>) -> Result<NavigationConfig> {
    let Some(path) = path else {
        return Ok(NavigationConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    NavigationConfig::from_json(&json)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn run(cli: &Cli, fetcher: &HttpFetcher, config: NavigationConfig) -> Result<()> {
    let start = request_path(&cli.base_url);
    let html = fetcher.fetch(&start, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to load {}", cli.base_url))?;
    let doc = HeadlessDocument::new(cli.base_url.clone(), &html)?;

    let session = NavigationSession::new(doc, fetcher, config)?;
    session.start();
    session.document().run_deferred();
    println!("{}  {}", start, session.document().title());

    for href in &cli.paths {
        let link = LinkTarget::new(href.as_str());
        if cli.prefetch {
            let outcome = session.prefetch(&link).await;
            tracing::info!("Prefetch {}: {:?}", href, outcome);
        }

        match session.intercept_click(&ClickEvent::on(link)) {
            ClickDecision::Navigate(request) => {
                let outcome = session.navigate(request).await;
                print_outcome(&session, outcome);
            }
            decision => println!("{}  ({:?})", href, decision),
        }
        session.document().run_deferred();
    }

    for _ in 0..cli.back {
        if !session.document().back() {
            break;
        }
        let outcome = session.handle_popstate().await;
        print_outcome(&session, outcome);
        session.document().run_deferred();
    }

    print_summary(&session);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&session.report())?;
        if path == Path::new("-") {
            println!("{}", json);
        } else {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
    }

    Ok(())
}

fn print_outcome(session: &NavigationSession<HeadlessDocument, &HttpFetcher>, outcome: NavigationOutcome) {
    let doc = session.document();
    match outcome {
        NavigationOutcome::Committed { cache_hit } => {
            let duration = session.records().last().map_or(0.0, |r| r.duration_ms);
            println!(
                "{}  {}  {:.1}ms{}",
                doc.path(),
                doc.title(),
                duration,
                if cache_hit { "  (cached)" } else { "" }
            );
        }
        NavigationOutcome::FullReload => {
            println!("{}  full navigation", doc.assigned_location().unwrap_or_default());
        }
        other => println!("{}  {:?}", doc.path(), other),
    }
}

fn print_summary(session: &NavigationSession<HeadlessDocument, &HttpFetcher>) {
    let cache = session.cache_stats();
    println!(
        "cache: {}/{} entries, {} hits, {} misses",
        cache.entry_count, cache.capacity, cache.hits, cache.misses
    );

    if let Some(stats) = session.stats() {
        println!(
            "navigations: {}  median {:.1}ms  p95 {:.1}ms  max {:.1}ms",
            stats.count, stats.median_ms, stats.p95_ms, stats.max_ms
        );
    }
    for violation in session.check_budget() {
        println!("budget: {}", violation);
    }
}
