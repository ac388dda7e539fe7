// src/pipeline/crawl.rs

//! Catalog crawling pipeline.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{CatalogSnapshot, Config, CrawlStats, OutputConfig};
use crate::pipeline::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::services::{
    CatalogAggregator, CrawlOrchestrator, CrawlSettings, DepartmentReport, FragmentScanner,
    HttpSession, PrereqParser, ScheduleClient,
};
use crate::storage::{CatalogSink, WriteMetadata};

/// Outcome of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub stats: CrawlStats,
    pub reports: Vec<DepartmentReport>,
    pub write: WriteMetadata,
}

/// Run the catalog crawler against the live site.
pub async fn run_crawler(
    config: &Config,
    sink: &dyn CatalogSink,
    force: bool,
) -> Result<CrawlSummary> {
    log::info!("Starting catalog crawl for term {}", config.site.term);

    let session = HttpSession::connect(&config.crawler, &config.site).await?;
    let client = Arc::new(ScheduleClient::new(
        Arc::new(session),
        &config.site,
        &config.parser,
    )?);
    let orchestrator = CrawlOrchestrator::new(
        client.clone(),
        client.clone(),
        client,
        PrereqParser::from_selectors(&config.parser)?,
        CrawlSettings::from_config(config),
    );

    crawl_and_store(&orchestrator, &config.output, sink, force).await
}

/// Crawl everything, then persist the snapshot.
///
/// On a fatal crawl error the completed batches go to the partial document
/// (when enabled) and the error is returned; the main document is untouched.
/// A finished snapshot refused by the write guard is kept the same way.
pub async fn crawl_and_store<S: FragmentScanner>(
    orchestrator: &CrawlOrchestrator<S>,
    output: &OutputConfig,
    sink: &dyn CatalogSink,
    force: bool,
) -> Result<CrawlSummary> {
    let start_time = Utc::now();
    let aggregator = CatalogAggregator::new();

    let reports = match orchestrator.run(&aggregator).await {
        Ok(reports) => reports,
        Err(e) => {
            if output.persist_partial {
                persist_partial(&aggregator.finalize().with_term(orchestrator.term()), sink)
                    .await;
            }
            return Err(e);
        }
    };

    let snapshot = aggregator.finalize().with_term(orchestrator.term());
    let stats = CrawlStats {
        start_time,
        end_time: Utc::now(),
        department_count: reports.len(),
        course_count: snapshot.len(),
        unparseable_count: snapshot.unparseable_count(),
    };

    log::info!(
        "Crawled {} courses from {} departments in {}s ({} unparseable, {:.1}% parsed)",
        stats.course_count,
        stats.department_count,
        (stats.end_time - stats.start_time).num_seconds(),
        stats.unparseable_count,
        stats.parse_rate() * 100.0
    );

    if force {
        log::warn!("Circuit breaker bypassed (--force)");
    } else if let Err(e) = guard_write(&snapshot, output, sink).await {
        if output.persist_partial {
            persist_partial(&snapshot, sink).await;
        }
        return Err(e);
    }

    let write = sink.write_snapshot(&snapshot, &stats).await?;
    log::info!("Saved {} courses to {}", write.record_count, write.location);

    Ok(CrawlSummary {
        stats,
        reports,
        write,
    })
}

/// Compare the new snapshot against the previous catalog of the same term.
async fn guard_write(
    snapshot: &CatalogSnapshot,
    output: &OutputConfig,
    sink: &dyn CatalogSink,
) -> Result<()> {
    let previous = sink.load_snapshot().await.inspect_err(|e| {
        log::error!("Cannot read previous catalog: {}", e);
    })?;

    let previous_count = match previous {
        Some(previous)
            if !previous.metadata().term.is_empty()
                && previous.metadata().term != snapshot.metadata().term =>
        {
            log::info!(
                "Circuit breaker: skipped (previous catalog is for term {}, this run is {})",
                previous.metadata().term,
                snapshot.metadata().term
            );
            return Ok(());
        }
        Some(previous) => previous.len(),
        None => 0,
    };

    CircuitBreaker::with_config(CircuitBreakerConfig::from(output))
        .validate(snapshot.len(), previous_count)
}

async fn persist_partial(snapshot: &CatalogSnapshot, sink: &dyn CatalogSink) {
    if snapshot.is_empty() {
        log::warn!("No department completed; nothing to save");
        return;
    }
    match sink.write_partial(snapshot).await {
        Ok(meta) => log::warn!(
            "Saved {} courses to {}; the main catalog was left unchanged",
            meta.record_count,
            meta.location
        ),
        Err(e) => log::error!("Failed to save partial catalog: {}", e),
    }
}
