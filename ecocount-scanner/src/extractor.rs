// Recovering the streamed data object from a counter page
//
// Counter pages push their server state to the client as escaped JSON strings:
//
//     <script>self.__next_f.push([1,"...{\"chartData\":[...],...}..."])</script>
//
// Only that one embedding convention is understood here.

use crate::error::{Result, ScanError};
use crate::locator::{locate, matching_brace};
use crate::normalize::normalize;
use crate::payload::{EmbeddedPayload, Extraction, RawSite, SiteIdentity};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

pub const PUSH_MARKER: &str = "self.__next_f.push";
pub const DATA_MARKER: &str = "\"chartData\"";
const PUSH_PREFIX: &str = "self.__next_f.push([1,\"";
const PUSH_TERMINATOR: &str = "\"])";
const SITE_MARKER: &str = "\"currentSite\":";
const PREVIEW_CHARS: usize = 200;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));

/// Scans inline scripts in document order and returns the first payload that
/// decodes with both series containers present.
///
/// A candidate that fails to decode is logged and skipped. Running out of
/// scripts is not an error: the caller gets `Extraction::Empty`.
pub fn extract(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    let mut scripts_scanned = 0;
    let mut candidates = 0;

    for script in inline_scripts(&document) {
        scripts_scanned += 1;
        if !(script.contains(PUSH_MARKER) && script.contains("chartData")) {
            continue;
        }
        candidates += 1;

        match decode_candidate(&script) {
            Ok(payload) => {
                debug!(
                    "Payload found in script {} ({} direction series)",
                    scripts_scanned,
                    payload.direction_graph_data.len()
                );
                return Extraction::Found(payload);
            }
            Err(e) => debug!("Skipping candidate script {}: {}", scripts_scanned, e),
        }
    }

    debug!(
        "No payload in {} scripts ({} candidates)",
        scripts_scanned, candidates
    );
    Extraction::Empty {
        scripts_scanned,
        candidates,
    }
}

/// Finds the `currentSite` object pushed alongside the chart data.
pub fn extract_site_identity(html: &str) -> Option<SiteIdentity> {
    let document = Html::parse_document(html);

    inline_scripts(&document)
        .filter(|script| script.contains(PUSH_MARKER) && script.contains("currentSite"))
        .find_map(|script| {
            let text = normalize(push_argument(&script)?);
            let key = text.find(SITE_MARKER)? + SITE_MARKER.len();
            let open = key + text[key..].find('{')?;
            if !text[key..open].trim().is_empty() {
                return None;
            }
            let close = matching_brace(&text, open)?;
            match serde_json::from_str::<RawSite>(&text[open..=close]) {
                Ok(raw) => Some(SiteIdentity::from(raw)),
                Err(e) => {
                    debug!("Site identity decode error: {}", e);
                    None
                }
            }
        })
}

fn inline_scripts(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(&SCRIPT_SELECTOR)
        .filter(|element| element.value().attr("src").is_none())
        .map(|element| element.text().collect::<String>())
        .filter(|text| !text.is_empty())
}

/// The escaped string handed to the push call.
///
/// The argument runs to the last `"])` in the script so escaped quotes inside
/// it never end the capture early.
fn push_argument(script: &str) -> Option<&str> {
    let start = script.find(PUSH_PREFIX)? + PUSH_PREFIX.len();
    let end = script.rfind(PUSH_TERMINATOR)?;
    (end >= start).then(|| &script[start..end])
}

fn decode_candidate(script: &str) -> Result<EmbeddedPayload> {
    let argument =
        push_argument(script).ok_or_else(|| ScanError::MarkerNotFound(PUSH_PREFIX.to_string()))?;
    let text = normalize(argument);
    let range = locate(&text, DATA_MARKER)?;
    let json = &text[range];

    serde_json::from_str(json).map_err(|e| {
        let preview: String = json.chars().take(PREVIEW_CHARS).collect();
        debug!("JSON decode error: {}", e);
        debug!("Problematic JSON (first {} chars): {}", PREVIEW_CHARS, preview);
        ScanError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn push_script(body: &str) -> String {
        format!(
            "<script>self.__next_f.push([1,\"{}\"])</script>",
            escape(body)
        )
    }

    const PAYLOAD: &str = r#"5:["$","div",null,{"siteId":"1","chartData":[{"data":[{"timestamp":"2024-03-01T00:00:00+01:00","traffic":{"counts":12}}]}],"directionGraphData":[{"direction":"in","directionName":"Nice","data":[]}],"kpi":{"total":12}}]"#;

    #[test]
    fn test_extracts_payload_from_push_script() {
        let html = format!("<html><head></head><body>{}</body></html>", push_script(PAYLOAD));
        let extraction = extract(&html);
        let payload = extraction.payload().expect("payload");
        assert_eq!(payload.aggregate_records().len(), 1);
        assert_eq!(payload.direction_graph_data[0].direction, "in");
        assert_eq!(payload.direction_graph_data[0].direction_name, "Nice");
        assert!(payload.kpi.is_some());
    }

    #[test]
    fn test_second_script_used_when_first_fails_to_decode() {
        let broken = r#"{"chartData":[{"data":[}],"directionGraphData":[]}"#;
        let html = format!(
            "<html><body>{}{}</body></html>",
            push_script(broken),
            push_script(PAYLOAD)
        );
        match extract(&html) {
            Extraction::Found(payload) => assert_eq!(payload.aggregate_records().len(), 1),
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[test]
    fn test_requires_both_markers() {
        let html = format!(
            "<html><body><script>var chartData = 1;</script>{}{}</body></html>",
            push_script(r#"{"other":true}"#),
            push_script(PAYLOAD)
        );
        assert!(extract(&html).payload().is_some());
    }

    #[test]
    fn test_missing_required_key_is_empty() {
        let html = push_script(r#"{"chartData":[{"data":[]}],"kpi":{}}"#);
        assert_eq!(
            extract(&html),
            Extraction::Empty {
                scripts_scanned: 1,
                candidates: 1
            }
        );
    }

    #[test]
    fn test_page_without_data_is_empty() {
        let html = "<html><body><script>console.log(1)</script><p>hi</p></body></html>";
        assert_eq!(
            extract(html),
            Extraction::Empty {
                scripts_scanned: 1,
                candidates: 0
            }
        );
    }

    #[test]
    fn test_external_scripts_ignored() {
        let html = r#"<script src="/app.js"></script>"#;
        assert_eq!(
            extract(html),
            Extraction::Empty {
                scripts_scanned: 0,
                candidates: 0
            }
        );
    }

    #[test]
    fn test_escaped_quotes_inside_values_survive() {
        let body = r#"{"chartData":[{"data":[]}],"directionGraphData":[{"direction":"out","directionName":"Promenade \"des Anglais\"","data":[]}]}"#;
        let payload = extract(&push_script(body)).payload().cloned().unwrap();
        assert_eq!(
            payload.direction_graph_data[0].direction_name,
            "Promenade \"des Anglais\""
        );
    }

    #[test]
    fn test_push_argument_runs_to_last_terminator() {
        let script = r#"self.__next_f.push([1,"a\"])b"])"#;
        assert_eq!(push_argument(script), Some(r#"a\"])b"#));
        assert_eq!(push_argument("self.__next_f.push([0])"), None);
    }

    #[test]
    fn test_extract_site_identity() {
        let body = r#"8:{"currentSite":{"id":300037212,"name":"Cagnes sur Mer","location":{"lat":43.66,"lon":7.16},"firstData":"2019-06-13T00:00:00+02:00","directions":[]}}"#;
        let html = format!("<html><body>{}</body></html>", push_script(body));
        let site = extract_site_identity(&html).expect("site identity");
        assert_eq!(site.id, "300037212");
        assert_eq!(site.name, "Cagnes sur Mer");
        assert_eq!(site.location.unwrap().lat, 43.66);
    }

    #[test]
    fn test_extract_site_identity_missing() {
        assert!(extract_site_identity(&push_script(PAYLOAD)).is_none());
    }
}
