//! Plain-text rendering of the progress table.

use comfy_table::{presets::NOTHING, Cell, CellAlignment, Row, Table};

use crate::services::progress::ProgressRow;

const FULL_HEADERS: [&str; 12] = [
    "program", "band", "nfield", "ndone", "nother", "nobserved", "ntodo", "nexp", "nbad", "ngood",
    "hours", "frac",
];

const SUMMARY_HEADERS: [&str; 6] = ["program", "band", "hours", "nobserved", "ntodo", "frac"];

/// Full table, floats with `precision` decimals.
pub fn render_progress_table(rows: &[ProgressRow], precision: usize) -> String {
    let cells = rows.iter().map(|r| {
        vec![
            r.program.clone(),
            r.band.clone(),
            r.nfield.to_string(),
            r.ndone.to_string(),
            r.nother.to_string(),
            r.nobserved.to_string(),
            r.ntodo.to_string(),
            r.nexp.to_string(),
            r.nbad.to_string(),
            r.ngood.to_string(),
            format!("{:.*}", precision, r.hours.value()),
            format!("{:.*}", precision, r.completion_fraction),
        ]
    });
    build_table(&FULL_HEADERS, cells).to_string()
}

/// Program/band subtable: hours, observed, todo and completion fraction.
pub fn render_summary_table(rows: &[ProgressRow], precision: usize) -> String {
    let cells = rows.iter().map(|r| {
        vec![
            r.program.clone(),
            r.band.clone(),
            format!("{:.*}", precision, r.hours.value()),
            r.nobserved.to_string(),
            r.ntodo.to_string(),
            format!("{:.*}", precision, r.completion_fraction),
        ]
    });
    build_table(&SUMMARY_HEADERS, cells).to_string()
}

/// The full table at two decimals, a `---` separator, then the summary at one.
pub fn render_report(rows: &[ProgressRow]) -> String {
    format!(
        "{}\n---\n{}",
        render_progress_table(rows, 2),
        render_summary_table(rows, 1)
    )
}

/// Borderless, right-aligned table with a leading row index.
fn build_table(headers: &[&str], cells: impl Iterator<Item = Vec<String>>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);

    let header = std::iter::once(Cell::new(""))
        .chain(headers.iter().map(|h| Cell::new(h)))
        .map(|c| c.set_alignment(CellAlignment::Right));
    table.set_header(header.collect::<Vec<_>>());

    for (i, row) in cells.enumerate() {
        let line = std::iter::once(i.to_string())
            .chain(row)
            .map(|value| Cell::new(value).set_alignment(CellAlignment::Right));
        table.add_row(Row::from(line.collect::<Vec<_>>()));
    }
    table
}
