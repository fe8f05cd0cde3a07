use crate::error::{Result, ScanError};
use crate::extractor;
use crate::payload::{Extraction, SiteIdentity};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use url::Url;

/// Parameters for one counter page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery<'a> {
    /// ISO 8601 duration code, e.g. `P1D`.
    pub granularity: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A family of counter pages sharing one URL scheme and one embedding
/// convention. Nothing here claims to handle arbitrary sites.
pub trait CounterSiteSource {
    fn page_url(&self, site_id: &str, query: &PageQuery<'_>) -> Result<String>;

    fn extract_payload(&self, html: &str) -> Extraction;

    fn extract_identity(&self, html: &str) -> Option<SiteIdentity>;

    /// Calendar date of `instant` on the site's own clock, used for the
    /// request's date parameters.
    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.date_naive()
    }
}

/// UTC offset in seconds of Central European Time at `instant`.
///
/// Summer time (+02:00) runs from 01:00 UTC on the last Sunday of March to
/// 01:00 UTC on the last Sunday of October, otherwise +01:00.
pub fn central_european_offset_secs(instant: DateTime<Utc>) -> i32 {
    let year = instant.year();
    let summer = match (summer_time_switch(year, 3), summer_time_switch(year, 10)) {
        (Some(begin), Some(end)) => instant >= begin && instant < end,
        _ => false,
    };
    if summer { 2 * 3600 } else { 3600 }
}

/// 01:00 UTC on the last Sunday of `month`.
fn summer_time_switch(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let last_day = NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?;
    let back = i64::from(last_day.weekday().num_days_from_sunday());
    let sunday = last_day.checked_sub_signed(Duration::days(back))?;
    Some(sunday.and_hms_opt(1, 0, 0)?.and_utc())
}

/// The Eco-Counter public display map.
#[derive(Debug, Clone)]
pub struct EcoDisplayMap {
    base_url: String,
}

impl EcoDisplayMap {
    pub const DEFAULT_BASE_URL: &'static str = "https://eco-display-map.eco-counter.com";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for EcoDisplayMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSiteSource for EcoDisplayMap {
    /// `<base>/site/<id>?granularity=..&startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`
    fn page_url(&self, site_id: &str, query: &PageQuery<'_>) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ScanError::InvalidUrl(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("site")
            .push(site_id);

        url.query_pairs_mut()
            .append_pair("granularity", query.granularity)
            .append_pair("startDate", &query.start.format("%Y-%m-%d").to_string())
            .append_pair("endDate", &query.end.format("%Y-%m-%d").to_string());

        Ok(url.to_string())
    }

    fn extract_payload(&self, html: &str) -> Extraction {
        extractor::extract(html)
    }

    fn extract_identity(&self, html: &str) -> Option<SiteIdentity> {
        extractor::extract_site_identity(html)
    }

    /// The display map serves French sites and reads dates in Europe/Paris time.
    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        FixedOffset::east_opt(central_european_offset_secs(instant))
            .map(|offset| instant.with_timezone(&offset).date_naive())
            .unwrap_or_else(|| instant.date_naive())
    }
}
