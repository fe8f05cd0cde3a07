// Brace matching over unstructured text to find one embedded JSON object

use crate::error::{Result, ScanError};
use std::ops::Range;

/// Finds the byte range of the JSON object that has `marker` as a key.
///
/// The start is the nearest `{` at or before the marker, and the end is the
/// `}` where the brace depth returns to zero. The returned range is half-open,
/// so `&text[range]` is the object including both braces.
///
/// This is best-effort brace matching, not a parser. It assumes the marker is a
/// direct key of the object of interest and that no other `{` sits between the
/// object's opening brace and the marker. Two cases break that and yield a start
/// that is too late: a `{` inside a string value, and a nested object value
/// (`{"params":{"a":1},"chartData":..}` locates `{"a":1}`). Braces inside string
/// literals are also counted like any other during the forward scan.
pub fn locate(text: &str, marker: &str) -> Result<Range<usize>> {
    let marker_pos = text
        .find(marker)
        .ok_or_else(|| ScanError::MarkerNotFound(marker.to_string()))?;

    let start = text[..marker_pos]
        .rfind('{')
        .ok_or(ScanError::UnbalancedBraces { start: marker_pos })?;

    let end = matching_brace(text, start).ok_or(ScanError::UnbalancedBraces { start })?;

    Ok(start..end + 1)
}

/// Returns the index of the `}` closing the `{` at `open`.
///
/// Returns `None` when `open` is not a `{` or the depth never returns to zero.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
