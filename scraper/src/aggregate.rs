//! Runs the selected sources one after another and merges their events.

use std::sync::Arc;

use async_stream::stream;
use common::{JobRecord, ProgressEvent, SearchRequest, Source, SourceSelection};
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{error, info};

use crate::config::ScrapeConfig;
use crate::http::PageFetcher;
use crate::location::normalize_location;
use crate::progress::ProgressRange;
use crate::sources::{GradConnectionScraper, SearchQuery, SeekScraper, SourceScraper};

pub struct Aggregator {
    scrapers: Vec<Arc<dyn SourceScraper>>,
}

impl Aggregator {
    /// The live sources, GradConnection and Seek, sharing one fetcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self::empty()
            .with_scraper(Arc::new(GradConnectionScraper::new(
                Arc::clone(&fetcher),
                config.gradconnection,
            )))
            .with_scraper(Arc::new(SeekScraper::new(fetcher, config.seek)))
    }

    pub fn empty() -> Self {
        Self { scrapers: Vec::new() }
    }

    /// Registers `scraper`, replacing any earlier one for the same source.
    pub fn with_scraper(mut self, scraper: Arc<dyn SourceScraper>) -> Self {
        self.scrapers.retain(|existing| existing.source() != scraper.source());
        self.scrapers.push(scraper);
        self
    }

    fn scraper_for(&self, source: Source) -> Option<Arc<dyn SourceScraper>> {
        self.scrapers
            .iter()
            .find(|scraper| scraper.source() == source)
            .cloned()
    }

    /// Streams a search request. An unrecognised `source` produces an error
    /// event followed by an empty completion.
    pub fn search(&self, request: &SearchRequest) -> BoxStream<'static, ProgressEvent> {
        match request.selection() {
            Some(selection) => self.search_sources(selection, &SearchQuery::from(request)),
            None => {
                let message = format!("Unknown source: {}", request.source);
                Box::pin(futures::stream::iter([
                    ProgressEvent::error(message, None),
                    ProgressEvent::complete(Vec::new()),
                ]))
            }
        }
    }

    /// Each selected source owns an equal, disjoint slice of the 0–100
    /// scale. The last event is always `Complete` with every kept record.
    pub fn search_sources(
        &self,
        selection: SourceSelection,
        query: &SearchQuery,
    ) -> BoxStream<'static, ProgressEvent> {
        let plan: Vec<(Source, Option<Arc<dyn SourceScraper>>)> = selection
            .sources()
            .iter()
            .map(|&source| (source, self.scraper_for(source)))
            .collect();
        let query = query.clone();

        Box::pin(stream! {
            let count = plan.len();
            let mut all: Vec<JobRecord> = Vec::new();

            for (index, (source, scraper)) in plan.into_iter().enumerate() {
                let range = ProgressRange::for_slot(index, count);
                let Some(scraper) = scraper else {
                    error!(%source, "No scraper registered");
                    yield ProgressEvent::error(
                        format!("No scraper available for {source}"),
                        Some(source),
                    );
                    continue;
                };

                info!(%source, start = range.start, end = range.end, "Running source");
                let mut events = scraper.scrape(&query);
                while let Some(item) = events.next().await {
                    match item {
                        Ok(mut event) => {
                            merge_event(&mut event, source, range, &mut all);
                            yield event;
                        }
                        Err(e) => {
                            error!(%source, error = %e, "Source failed");
                            yield ProgressEvent::error(e.to_string(), Some(source));
                            break;
                        }
                    }
                }
            }

            info!(jobs = all.len(), "Search complete");
            yield ProgressEvent::complete(all);
        })
    }
}

/// Rescales progress into `range`, normalizes record locations and tags
/// untagged errors with `source`. Records are also copied into `all`.
fn merge_event(
    event: &mut ProgressEvent,
    source: Source,
    range: ProgressRange,
    all: &mut Vec<JobRecord>,
) {
    if let Some(progress) = event.progress_mut() {
        *progress = range.rescale(*progress);
    }
    if let Some(records) = event.records_mut() {
        for record in records.iter_mut() {
            record.location = record.location.as_deref().and_then(normalize_location);
        }
        all.extend(records.iter().cloned());
    }
    if let ProgressEvent::Error { source: tag, .. } = event {
        if tag.is_none() {
            *tag = Some(source);
        }
    }
}
