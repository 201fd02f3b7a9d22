use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use lead_cli::types::{AnswerReport, MappingReport, SummaryReport};
use lead_ingest::ColumnKind;
use lead_map::{MappingMetadata, MappingOrigin, MatchStage, StoredMapping};
use lead_model::{Category, Field, FieldSet};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn print_mapping_report(report: &MappingReport) {
    println!("File: {}", report.file.display());
    println!(
        "Category: {} ({} rows, {} columns)",
        report.result.category,
        report.rows,
        report.result.decisions.len()
    );
    match &report.result.provider {
        Some(provider) => println!("Suggested by: {provider} ({:.1}% accepted)", report.confidence),
        None => println!("Suggested by: matcher only"),
    }

    let fields = report.result.category.fields();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Field"),
        header_cell("Required"),
        header_cell("Decided by"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for decision in &report.result.decisions {
        table.add_row(vec![
            Cell::new(&decision.column),
            Cell::new(decision.field).add_attribute(Attribute::Bold),
            required_cell(fields.is_required(decision.field)),
            origin_cell(decision.origin),
        ]);
    }
    println!("{table}");

    if !report.missing_required.is_empty() {
        let names: Vec<&str> = report.missing_required.iter().map(Field::as_str).collect();
        eprintln!("Missing required fields: {}", names.join(", "));
    }
    if let Some(path) = &report.saved_to {
        println!("Saved: {}", path.display());
    }
}

pub fn print_fields(categories: &[Category]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Field"),
        header_cell("Required"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for category in categories {
        let fields: &FieldSet = category.fields();
        for field in fields.candidates() {
            table.add_row(vec![
                Cell::new(category),
                Cell::new(field),
                required_cell(fields.is_required(field)),
            ]);
        }
    }
    println!("{table}");
}

pub fn print_summary_report(report: &SummaryReport) {
    let summary = &report.summary;
    println!(
        "{} upload: {} rows, {} columns",
        summary.category, summary.total_rows, summary.total_columns
    );

    let mut columns = Table::new();
    columns.set_header(vec![
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Unique"),
        header_cell("Nulls"),
        header_cell("Sample"),
    ]);
    apply_table_style(&mut columns);
    align_column(&mut columns, 2, CellAlignment::Right);
    align_column(&mut columns, 3, CellAlignment::Right);
    for column in &summary.column_summaries {
        columns.add_row(vec![
            Cell::new(&column.name),
            kind_cell(column.kind),
            Cell::new(column.unique),
            count_cell(column.nulls, Color::Yellow),
            Cell::new(column.samples.join(", ")),
        ]);
    }
    println!("{columns}");

    if !summary.numeric.is_empty() {
        let mut numeric = Table::new();
        numeric.set_header(vec![
            header_cell("Numeric column"),
            header_cell("Min"),
            header_cell("Max"),
            header_cell("Mean"),
            header_cell("Median"),
            header_cell("Sum"),
        ]);
        apply_table_style(&mut numeric);
        for idx in 1..=5 {
            align_column(&mut numeric, idx, CellAlignment::Right);
        }
        for stats in &summary.numeric {
            numeric.add_row(vec![
                Cell::new(&stats.column),
                Cell::new(format_number(stats.min)),
                Cell::new(format_number(stats.max)),
                Cell::new(format_number(stats.mean)),
                Cell::new(format_number(stats.median)),
                Cell::new(format_number(stats.sum)),
            ]);
        }
        println!();
        println!("{numeric}");
    }

    if !summary.categorical.is_empty() {
        let mut categorical = Table::new();
        categorical.set_header(vec![
            header_cell("Text column"),
            header_cell("Unique"),
            header_cell("Top values"),
        ]);
        apply_table_style(&mut categorical);
        align_column(&mut categorical, 1, CellAlignment::Right);
        for stats in &summary.categorical {
            let top: Vec<String> = stats
                .top
                .iter()
                .map(|entry| format!("{} ({})", entry.value, entry.count))
                .collect();
            categorical.add_row(vec![
                Cell::new(&stats.column),
                Cell::new(stats.unique),
                Cell::new(top.join(", ")),
            ]);
        }
        println!();
        println!("{categorical}");
    }

    print_located_columns(report);
}

fn print_located_columns(report: &SummaryReport) {
    if report.located.is_empty() && report.date_column.is_none() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Report role"), header_cell("Column")]);
    apply_table_style(&mut table);
    println!();
    println!("Report columns (via {} mapping):", report.mapping_source.as_str());
    for located in &report.located {
        table.add_row(vec![Cell::new(located.role), Cell::new(&located.column)]);
    }
    if let Some(column) = &report.date_column {
        table.add_row(vec![Cell::new("date"), Cell::new(column)]);
    }
    println!("{table}");
}

pub fn print_answer_report(report: &AnswerReport, show_context: bool) {
    if show_context {
        println!("{}", report.context);
    }
    if let Some(answer) = &report.answer {
        if show_context {
            println!();
        }
        println!("{answer}");
    }
}

pub fn print_mapping_list(entries: &[MappingMetadata]) {
    if entries.is_empty() {
        println!("No saved mappings.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Workspace"),
        header_cell("Category"),
        header_cell("Columns"),
        header_cell("Saved at"),
        header_cell("File"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.workspace_id).add_attribute(Attribute::Bold),
            Cell::new(entry.category),
            Cell::new(entry.column_count),
            match &entry.saved_at {
                Some(saved_at) => Cell::new(saved_at),
                None => dim_cell("-"),
            },
            Cell::new(entry.file_path.display()),
        ]);
    }
    println!("{table}");
}

pub fn print_stored_mapping(stored: &StoredMapping) {
    println!(
        "Workspace: {} ({}, saved {})",
        stored.workspace_id,
        stored.category,
        stored.saved_at.as_deref().unwrap_or("-")
    );
    let mut table = Table::new();
    table.set_header(vec![header_cell("Column"), header_cell("Field")]);
    apply_table_style(&mut table);
    for (column, field) in stored.mapping.iter() {
        table.add_row(vec![Cell::new(column), Cell::new(field)]);
    }
    println!("{table}");
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn required_cell(required: bool) -> Cell {
    if required {
        Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn origin_cell(origin: MappingOrigin) -> Cell {
    let color = match origin {
        MappingOrigin::Suggested => Color::Green,
        MappingOrigin::Fallback(MatchStage::Fuzzy) => Color::Cyan,
        MappingOrigin::Fallback(MatchStage::Content | MatchStage::Keyword) => Color::Yellow,
        MappingOrigin::Fallback(MatchStage::Default) => Color::Red,
    };
    Cell::new(origin).fg(color)
}

fn kind_cell(kind: ColumnKind) -> Cell {
    match kind {
        ColumnKind::Numeric => Cell::new(kind.as_str()).fg(Color::Cyan),
        ColumnKind::Text => Cell::new(kind.as_str()),
        ColumnKind::Empty => dim_cell(kind.as_str()),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
