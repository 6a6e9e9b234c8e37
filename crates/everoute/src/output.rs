//! Response printing: JSON on stdout, a readable summary on stderr

use anyhow::Result;
use colored::Colorize;
use everoute_provider::{Diagnostics, Kind, ResourceResponse, Severity};

pub fn print_response(response: &ResourceResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    print_diagnostics(&response.diagnostics);
    Ok(())
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diag in diagnostics.iter() {
        let label = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        match &diag.attribute {
            Some(path) => eprintln!("{} [{}] {}: {}", label, path.cyan(), diag.summary, diag.detail),
            None => eprintln!("{} {}: {}", label, diag.summary, diag.detail),
        }
    }
}

pub fn print_kinds(entries: &[(Kind, &str, &'static str)]) {
    let width = entries.iter().map(|(_, name, _)| name.len()).max().unwrap_or(0);
    let mut current = None;
    for (kind, name, description) in entries {
        if current != Some(*kind) {
            let title = match kind {
                Kind::Resource => "Resources",
                Kind::DataSource => "Data sources",
            };
            println!("{}", title.bold());
            current = Some(*kind);
        }
        println!("  {}  {}", format!("{name:width$}").green(), description.dimmed());
    }
}
