//! Plain-text rendering of a summary table model.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tbl_model::{RowKind, TableModel};

const STUB_HEADING: &str = "Characteristic";

/// Heading of every table column, with the stratum size when requested.
fn headings(model: &TableModel, separator: &str) -> Vec<String> {
    model
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let count = model
                .header_counts
                .as_ref()
                .and_then(|counts| counts.get(index))
                .filter(|count| !count.is_empty());
            match count {
                Some(count) => format!("{}{separator}{count}", column.heading),
                None => column.heading.clone(),
            }
        })
        .collect()
}

fn stub_label(label: &str, kind: RowKind) -> String {
    match kind {
        RowKind::Variable => label.to_string(),
        RowKind::Level | RowKind::Missing => format!("  {label}"),
    }
}

/// Box-drawn table for the terminal, followed by the footnotes.
pub fn render_text(model: &TableModel) -> String {
    let mut table = Table::new();
    let mut header = vec![header_cell(STUB_HEADING)];
    header.extend(headings(model, "\n").iter().map(|heading| header_cell(heading)));
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 1..=model.columns.len() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Center);
        }
    }

    for row in &model.rows {
        let mut cells = vec![stub_cell(&row.label, row.kind)];
        cells.extend(row.cells.iter().map(Cell::new));
        table.add_row(cells);
    }

    let mut out = table.to_string();
    for (index, note) in model.footnotes.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{}. {note}", index + 1));
    }
    out
}

/// Pipe table, followed by the footnotes.
pub fn render_markdown(model: &TableModel) -> String {
    let mut header = vec![format!("**{STUB_HEADING}**")];
    header.extend(headings(model, ", ").into_iter().map(|heading| format!("**{heading}**")));

    let mut lines = vec![pipe_row(&header)];
    lines.push(pipe_row(&vec!["---".to_string(); header.len()]));
    for row in &model.rows {
        let stub = match row.kind {
            RowKind::Variable => row.label.clone(),
            RowKind::Level | RowKind::Missing => format!("&nbsp;&nbsp;{}", row.label),
        };
        let mut cells = vec![stub];
        cells.extend(row.cells.iter().cloned());
        lines.push(pipe_row(&cells));
    }
    if !model.footnotes.is_empty() {
        lines.push(String::new());
        for (index, note) in model.footnotes.iter().enumerate() {
            lines.push(format!("{}. {note}", index + 1));
        }
    }
    lines.join("\n")
}

fn pipe_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|cell| cell.replace('|', "\\|")).collect();
    format!("| {} |", escaped.join(" | "))
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn stub_cell(label: &str, kind: RowKind) -> Cell {
    let cell = Cell::new(stub_label(label, kind));
    match kind {
        RowKind::Variable => cell.add_attribute(Attribute::Bold),
        RowKind::Level => cell,
        RowKind::Missing => cell.fg(Color::DarkGrey),
    }
}
