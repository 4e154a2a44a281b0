use anyhow::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::output::{json::print_json, table::print_table};
use localsearch_core::SearchCore;

pub fn run(core: Arc<SearchCore>, format: OutputFormat) -> Result<()> {
    let report = core.dispatcher.detector().report();

    if format.is_json() {
        let entries: Vec<_> = report
            .iter()
            .map(|(capability, program)| {
                json!({
                    "capability": capability.name(),
                    "available": program.is_some(),
                    "path": program,
                })
            })
            .collect();
        return print_json(&entries);
    }

    let mut table = Table::new();
    table.set_header(vec!["Capability", "Tools", "Status", "Path"]);
    for (capability, program) in report {
        let status = if program.is_some() { "native" } else { "fallback" };
        table.add_row(vec![
            Cell::new(capability.name()),
            Cell::new(capability.candidates().join(", ")),
            Cell::new(status),
            Cell::new(
                program
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    print_table(table)
}
