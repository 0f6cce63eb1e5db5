use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{CollectedValues, MaterializedTable};
use crate::document::MetadataNode;
use crate::filter::Filter;
use crate::matcher::MatchResult;
use crate::table::Table;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Envelope for JSON reports: what was asked, when, and the answer.
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    pub document: &'a str,
    pub filter: &'a Filter,
    pub generated_at: DateTime<Utc>,
    pub results: T,
}

impl<'a, T: Serialize> Report<'a, T> {
    pub fn new(document: &'a str, filter: &'a Filter, results: T) -> Self {
        Self {
            document,
            filter,
            generated_at: Utc::now(),
            results,
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_matches(report: &Report<'_, &[MatchResult<'_>]>) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_collected(report: &Report<'_, &[CollectedValues<'_>]>) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_tables(report: &Report<'_, &[MaterializedTable]>) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_types(types: &[&str]) -> io::Result<()> {
        Self::print_json(&types)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_matches(filter: &Filter, results: &[MatchResult<'_>]) {
        let cyan = "\x1b[36m";
        let green = "\x1b[32m";
        let reset = "\x1b[0m";

        println!("{cyan}filter: {filter}{reset}");
        println!("{green}matched data files: {}{reset}", results.len());
        for (index, result) in results.iter().enumerate() {
            println!(
                "[{index}] {} ({}) study={}",
                result.data_file.name,
                result.data_file.file_type,
                result.study_identifier.unwrap_or("-")
            );
        }
    }

    pub fn print_collected(field: &str, collected: &[CollectedValues<'_>]) {
        for entry in collected {
            println!(
                "study={} assay={} {field}: {}",
                entry.study_identifier.unwrap_or("-"),
                entry.assay_index,
                entry.values.len()
            );
            for value in &entry.values {
                println!("  {}", describe_node(value));
            }
        }
    }

    pub fn print_table(materialized: &MaterializedTable, max_rows: usize) {
        let table = &materialized.table;
        println!(
            "{} ({}) {} rows x {} columns",
            materialized.path.display(),
            materialized.file_type,
            table.row_count(),
            table.columns().len()
        );
        for (name, value) in table.attributes() {
            println!("  @{name} = {value}");
        }
        print!("{}", render_rows(table, max_rows));
    }

    pub fn print_types(types: &[&str]) {
        for file_type in types {
            println!("{file_type}");
        }
    }
}

fn describe_node(node: &MetadataNode) -> String {
    match node {
        MetadataNode::Scalar(scalar) => scalar.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

/// Tab-separated header plus the first `max_rows` rows.
pub fn render_rows(table: &Table, max_rows: usize) -> String {
    let mut out = table.column_names().join("\t");
    out.push('\n');
    for row in 0..table.row_count().min(max_rows) {
        let cells = table
            .columns()
            .iter()
            .map(|column| column.values.display_at(row).unwrap_or_default())
            .collect::<Vec<_>>();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    if table.row_count() > max_rows {
        out.push_str(&format!("... {} more rows\n", table.row_count() - max_rows));
    }
    out
}
