// Tests for dataset assembly and rendering

use ecocount_core::report::{OutputFormat, render_csv, render_table, save_report, to_json_rows};
use ecocount_core::{COUNT_COLUMN, Dataset, Series, assemble};
use ecocount_scanner::{Timestamp, parse_timestamp};
use serde_json::json;
use tempfile::NamedTempFile;

fn ts(s: &str) -> Timestamp {
    parse_timestamp(s).unwrap()
}

fn t1() -> Timestamp {
    ts("2024-03-01T00:00:00+01:00")
}

fn t2() -> Timestamp {
    ts("2024-03-02T00:00:00+01:00")
}

fn sample() -> Dataset {
    let aggregate: Series = [(t1(), 5), (t2(), 7)].into_iter().collect();
    let north: Series = [(t1(), 3)].into_iter().collect();
    let south: Series = [(t2(), 7)].into_iter().collect();
    assemble(
        &aggregate,
        &[("north".to_string(), north), ("south".to_string(), south)],
    )
}

// ============================================================================
// Assembly Tests
// ============================================================================

#[test]
fn test_assemble_outer_join_with_nulls() {
    let dataset = sample();

    assert_eq!(dataset.columns(), ["count", "north", "south"]);
    assert_eq!(dataset.len(), 2);

    assert_eq!(dataset.get(&t1(), "count"), Some(Some(5)));
    assert_eq!(dataset.get(&t1(), "north"), Some(Some(3)));
    assert_eq!(dataset.get(&t1(), "south"), Some(None));

    assert_eq!(dataset.get(&t2(), "count"), Some(Some(7)));
    assert_eq!(dataset.get(&t2(), "north"), Some(None));
    assert_eq!(dataset.get(&t2(), "south"), Some(Some(7)));
}

#[test]
fn test_assemble_direction_order_only_changes_columns() {
    let aggregate: Series = [(t1(), 5), (t2(), 7)].into_iter().collect();
    let north: Series = [(t1(), 3)].into_iter().collect();
    let south: Series = [(t2(), 7)].into_iter().collect();

    let a = assemble(
        &aggregate,
        &[("north".to_string(), north.clone()), ("south".to_string(), south.clone())],
    );
    let b = assemble(
        &aggregate,
        &[("south".to_string(), south), ("north".to_string(), north)],
    );

    assert_eq!(b.columns(), ["count", "south", "north"]);
    for column in ["count", "north", "south"] {
        assert_eq!(a.column(column), b.column(column), "column {}", column);
    }
}

#[test]
fn test_assemble_index_is_union_of_timestamps() {
    let t0 = ts("2024-02-29T00:00:00+01:00");
    let aggregate: Series = [(t1(), 1)].into_iter().collect();
    let inbound: Series = [(t0, 2)].into_iter().collect();
    let outbound: Series = [(t2(), 0)].into_iter().collect();

    let dataset = assemble(
        &aggregate,
        &[("in".to_string(), inbound), ("out".to_string(), outbound)],
    );

    let index: Vec<Timestamp> = dataset.index().copied().collect();
    assert_eq!(index, vec![t0, t1(), t2()]);
    assert_eq!(dataset.column(COUNT_COLUMN), Some(vec![None, Some(1), None]));
    // A reported zero stays a zero, distinct from a missing cell.
    assert_eq!(dataset.get(&t2(), "out"), Some(Some(0)));
    assert_eq!(dataset.get(&t2(), "in"), Some(None));
}

#[test]
fn test_assemble_without_directions() {
    let aggregate: Series = [(t1(), 5)].into_iter().collect();
    let dataset = assemble(&aggregate, &[]);
    assert_eq!(dataset.columns(), ["count"]);
    assert_eq!(dataset.first_timestamp(), Some(&t1()));
    assert_eq!(dataset.last_timestamp(), Some(&t1()));
}

#[test]
fn test_unknown_lookups() {
    let dataset = sample();
    assert_eq!(dataset.get(&t1(), "east"), None);
    assert_eq!(dataset.get(&ts("2030-01-01"), "count"), None);
    assert!(dataset.column("east").is_none());
}

#[test]
fn test_empty_dataset() {
    let dataset = Dataset::empty();
    assert!(dataset.is_empty());
    assert_eq!(dataset.columns(), ["count"]);
    assert_eq!(dataset, Dataset::default());
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_output_format_from_str() {
    assert_eq!(OutputFormat::from_str("CSV"), Some(OutputFormat::Csv));
    assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
    assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Table));
    assert_eq!(OutputFormat::from_str("xml"), None);
}

#[test]
fn test_render_csv() {
    let csv = render_csv(&sample());
    assert_eq!(
        csv,
        "timestamp,count,north,south\n\
         2024-03-01T00:00:00+01:00,5,3,\n\
         2024-03-02T00:00:00+01:00,7,,7\n"
    );
}

#[test]
fn test_json_rows_keep_nulls() {
    let rows = to_json_rows(&sample());
    assert_eq!(
        rows,
        json!([
            {"timestamp": "2024-03-01T00:00:00+01:00", "count": 5, "north": 3, "south": null},
            {"timestamp": "2024-03-02T00:00:00+01:00", "count": 7, "north": null, "south": 7}
        ])
    );
}

#[test]
fn test_render_table() {
    let table = render_table(&sample());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("timestamp"));
    assert!(lines[0].ends_with("south"));
    assert!(lines[1].starts_with("2024-03-01 00:00 +01:00"));
    assert!(lines[1].ends_with('-'));
}

#[test]
fn test_save_report() -> Result<(), Box<dyn std::error::Error>> {
    let file = NamedTempFile::new()?;
    save_report(&sample(), OutputFormat::Csv, file.path())?;

    let written = std::fs::read_to_string(file.path())?;
    assert!(written.starts_with("timestamp,count,north,south\n"));
    assert_eq!(written.lines().count(), 3);
    Ok(())
}
