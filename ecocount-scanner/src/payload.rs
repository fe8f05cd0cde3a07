use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Absolute instant as reported by the counter site, offset preserved.
pub type Timestamp = DateTime<FixedOffset>;

/// The data object a counter page streams to its client.
///
/// Both series containers are required: a JSON object lacking either one is a
/// failed extraction, not an empty result. Records stay as raw JSON so that a
/// single malformed entry can be dealt with downstream without rejecting the
/// whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedPayload {
    pub chart_data: Vec<ChartSeries>,
    pub direction_graph_data: Vec<DirectionSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpi: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionSeries {
    pub direction: String,
    #[serde(default)]
    pub direction_name: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl EmbeddedPayload {
    /// Records of the all-directions series; the site puts it first in `chartData`.
    pub fn aggregate_records(&self) -> &[Value] {
        self.chart_data
            .first()
            .map(|series| series.data.as_slice())
            .unwrap_or(&[])
    }
}

/// Result of scanning a page for the embedded payload.
///
/// `Empty` carries how far the scan got, which tells a page without data
/// (`candidates == 0`) apart from one whose candidates all failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Found(EmbeddedPayload),
    Empty {
        scripts_scanned: usize,
        candidates: usize,
    },
}

impl Extraction {
    pub fn payload(&self) -> Option<&EmbeddedPayload> {
        match self {
            Extraction::Found(payload) => Some(payload),
            Extraction::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Extraction::Empty { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Identity of a counting site as embedded in its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteIdentity {
    pub id: String,
    pub name: String,
    pub location: Option<GeoPoint>,
    pub first_data: Option<Timestamp>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSite {
    id: RawId,
    name: String,
    #[serde(default)]
    location: Option<GeoPoint>,
    #[serde(default)]
    first_data: Option<String>,
}

impl From<RawSite> for SiteIdentity {
    fn from(raw: RawSite) -> Self {
        let id = match raw.id {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        };
        Self {
            id,
            name: raw.name,
            location: raw.location,
            first_data: raw.first_data.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Parses the timestamp formats seen on counter pages.
///
/// RFC 3339 with an offset is the normal case. Offset-less date-times and bare
/// dates are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_local_timezone(utc).single();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single();
    }
    None
}
