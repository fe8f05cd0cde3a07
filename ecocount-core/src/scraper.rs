use crate::dataset::{Dataset, assemble};
use crate::error::{CounterError, Result};
use crate::frequency::Frequency;
use crate::metadata::SiteMetadata;
use crate::series::build_series;
use chrono::{DateTime, Utc};
use ecocount_scanner::{
    CounterSiteSource, EcoDisplayMap, EmbeddedPayload, Extraction, HttpFetcher, PageFetcher,
    PageQuery,
};
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

/// Fetches count tables for one counting site.
///
/// Site metadata is captured once, on the first fetch whose payload carries
/// direction series, and is never refreshed afterwards even if the site
/// changes it. Concurrent first fetches race on a `OnceLock`, so exactly one
/// of them initializes it.
#[derive(Debug)]
pub struct CounterScraper<F = HttpFetcher, S = EcoDisplayMap> {
    site_id: String,
    fetcher: F,
    source: S,
    debug: bool,
    strict: bool,
    metadata: OnceLock<SiteMetadata>,
    last_html: Mutex<Option<String>>,
}

impl CounterScraper {
    /// Scraper for the public display map with default HTTP settings.
    pub fn new(site_id: impl Into<String>) -> Result<Self> {
        Ok(Self::with_parts(
            site_id,
            HttpFetcher::new()?,
            EcoDisplayMap::new(),
        ))
    }
}

impl<F, S> CounterScraper<F, S>
where
    F: PageFetcher,
    S: CounterSiteSource,
{
    pub fn with_parts(site_id: impl Into<String>, fetcher: F, source: S) -> Self {
        Self {
            site_id: site_id.into(),
            fetcher,
            source,
            debug: false,
            strict: false,
            metadata: OnceLock::new(),
            last_html: Mutex::new(None),
        }
    }

    /// Keep the last fetched page in memory, see [`CounterScraper::last_html`].
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Report a page without a payload as `CounterError::EmptyPayload`
    /// instead of returning an empty dataset.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata.get().is_some()
    }

    pub fn metadata(&self) -> Option<&SiteMetadata> {
        self.metadata.get()
    }

    pub fn last_html(&self) -> Option<String> {
        self.last_html
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches counts between `start` and `end` at `freq` granularity.
    ///
    /// `end` defaults to now and `start` to one period before `end`. The
    /// result is empty when the page carried no payload (unless strict).
    pub async fn fetch_counts(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        freq: Frequency,
    ) -> Result<Dataset> {
        let payload = match self.fetch_payload(start, end, freq).await? {
            Extraction::Found(payload) => payload,
            Extraction::Empty { .. } => return Ok(Dataset::empty()),
        };

        debug!("Transforming counts to dataset");
        let aggregate = build_series(payload.aggregate_records());
        let directions: Vec<_> = payload
            .direction_graph_data
            .iter()
            .map(|d| (d.direction.clone(), build_series(&d.data)))
            .collect();

        let dataset = assemble(&aggregate, &directions);
        info!(
            "Site {}: {} rows, columns {:?}",
            self.site_id,
            dataset.len(),
            dataset.columns()
        );
        Ok(dataset)
    }

    /// Fetches one page and extracts its payload without shaping it.
    pub async fn fetch_payload(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        freq: Frequency,
    ) -> Result<Extraction> {
        let (start, end) = resolve_range(start, end, freq, Utc::now())?;

        let query = PageQuery {
            granularity: freq.granularity(),
            start: self.source.local_date(start),
            end: self.source.local_date(end),
        };
        let url = self.source.page_url(&self.site_id, &query)?;

        debug!("Fetching data from: {}", url);
        let html = self.fetcher.fetch_text(&url).await?;
        if self.debug {
            *self.last_html.lock().unwrap_or_else(PoisonError::into_inner) = Some(html.clone());
        }

        debug!("Extracting data...");
        let extraction = self.source.extract_payload(&html);
        match &extraction {
            Extraction::Found(payload) => self.initialize(&html, payload),
            Extraction::Empty {
                scripts_scanned,
                candidates,
            } => {
                warn!(
                    "No counter payload for site {} ({} scripts, {} candidates)",
                    self.site_id, scripts_scanned, candidates
                );
                if self.strict {
                    return Err(CounterError::EmptyPayload {
                        scripts_scanned: *scripts_scanned,
                        candidates: *candidates,
                    });
                }
            }
        }

        Ok(extraction)
    }

    fn initialize(&self, html: &str, payload: &EmbeddedPayload) {
        if self.is_initialized() || payload.direction_graph_data.is_empty() {
            return;
        }

        self.metadata.get_or_init(|| {
            let identity = self.source.extract_identity(html);
            if identity.is_none() {
                warn!("Site {}: no site identity found in page", self.site_id);
            }
            let metadata = SiteMetadata::from_payload(&self.site_id, identity, payload);
            info!(
                "Site {} initialized ({} directions)",
                self.site_id,
                metadata.direction_names.len()
            );
            metadata
        });
    }
}

impl<F, S> fmt::Display for CounterScraper<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CounterScraper(site_id={})", self.site_id)?;
        match self.metadata.get() {
            Some(metadata) => {
                if let Some(identity) = &metadata.identity {
                    write!(f, "\n  Site name: {}", identity.name)?;
                    if let Some(location) = identity.location {
                        write!(f, "\n  Location: {}, {}", location.lat, location.lon)?;
                    }
                    if let Some(first) = identity.first_data {
                        write!(f, "\n  First data date: {}", first.date_naive())?;
                    }
                }
                for (code, name) in &metadata.direction_names {
                    write!(f, "\n  Direction {}: {}", code, name)?;
                }
                Ok(())
            }
            None => write!(f, "\n  [Not yet initialized]"),
        }
    }
}

/// Applies the defaults and checks `start < end`.
///
/// `end` falls back to `now`, `start` to one `freq` period before `end`.
pub fn resolve_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    freq: Frequency,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end = end.unwrap_or(now);
    let start = match start {
        Some(start) => start,
        None => freq
            .one_period_before(end)
            .ok_or(CounterError::InvalidDateRange { start: end, end })?,
    };

    if start >= end {
        return Err(CounterError::InvalidDateRange { start, end });
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecocount_scanner::error::Result as ScanResult;

    struct FixedPage(String);

    impl PageFetcher for FixedPage {
        async fn fetch_text(&self, _url: &str) -> ScanResult<String> {
            Ok(self.0.clone())
        }
    }

    fn poison_last_html<F: Sync, S: Sync>(scraper: &CounterScraper<F, S>) {
        std::thread::scope(|scope| {
            let holder = scope.spawn(|| {
                let _guard = scraper.last_html.lock().unwrap();
                panic!("poison last_html");
            });
            assert!(holder.join().is_err());
        });
        assert!(scraper.last_html.is_poisoned());
    }

    #[tokio::test]
    async fn test_debug_capture_survives_poisoned_lock() {
        let page = "<html><body>no payload</body></html>".to_string();
        let scraper = CounterScraper::with_parts("1", FixedPage(page.clone()), EcoDisplayMap::new())
            .with_debug(true);
        poison_last_html(&scraper);

        let extraction = scraper
            .fetch_payload(None, None, Frequency::Day)
            .await
            .unwrap();

        assert!(extraction.is_empty());
        assert_eq!(scraper.last_html(), Some(page));
    }
}
