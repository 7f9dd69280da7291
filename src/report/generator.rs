//! Report rendering.
//!
//! This module turns a built [`Report`] into a Discord embed payload,
//! a Markdown document, or JSON.

use crate::models::Report;
use anyhow::Result;
use serde_json::{json, Value};

/// Render the report as a Discord embed object.
pub fn generate_embed(report: &Report) -> Value {
    let fields: Vec<Value> = report
        .lines
        .iter()
        .map(|line| {
            json!({
                "name": line.title,
                "value": line.body,
            })
        })
        .collect();

    json!({
        "color": report.color,
        "title": report.title,
        "fields": fields,
        "timestamp": report.timestamp.to_rfc3339(),
        "footer": { "text": report.footer },
    })
}

/// Generate a Markdown version of the report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));
    output.push_str(&format!(
        "*{}*\n\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for line in report.featured_lines() {
        output.push_str(&format!("### {}\n\n{}\n\n", line.title, line.body.trim_end()));
    }

    if let Some(remainder) = report.remainder_line() {
        output.push_str(&format!("### {}\n\n{}\n\n", remainder.title, remainder.body));
    }

    output.push_str("---\n\n");
    output.push_str(&report.footer);
    output.push('\n');

    output
}

/// Generate a JSON version of the report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
