//! Human-oriented rendering of records and reports

use std::fmt::Write;

use colored::Colorize;
use serde_json::Value;

use crate::client::models::{Environment, Record, display_value};
use crate::report::{HEX_COLUMNS, SampleReport, Summary, SummaryState, Verdict};

/// One `Key: Value` line per field, in record order.
pub fn format_record(record: &Record) -> String {
    let width = record.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in record {
        let label = format!("{:width$}", format!("{}:", key), width = width + 1);
        let _ = writeln!(out, "{}  {}", label.bold(), cell(value));
    }
    out
}

/// Per-environment blocks; pending ones first, as aggregated.
pub fn format_summaries(hash: &str, summaries: &[Summary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sample: {}", hash.bold());

    if summaries.is_empty() {
        let _ = writeln!(out, "\nNo dynamic analysis submissions.");
        return out;
    }

    for summary in summaries {
        let _ = writeln!(out);
        match &summary.state {
            SummaryState::Pending { submission_status } => {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    "○".dimmed(),
                    summary.env.bold(),
                    submission_status.to_string().yellow()
                );
            }
            SummaryState::Report { report } => {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    "●".green(),
                    summary.env.bold(),
                    "DONE".green()
                );
                let _ = write!(out, "{}", indent(&format_report(report)));
            }
        }
    }
    out
}

fn format_report(report: &Value) -> String {
    match report {
        Value::Object(map) => format_record(map),
        Value::Null => String::new(),
        other => format!("{}\n", cell(other)),
    }
}

/// Details, static analysis and antivirus sections of a sample
pub fn format_sample(report: &SampleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sample: {}", report.hash.bold());

    if let Some(details) = &report.details {
        section(&mut out, "Details");
        out.push_str(&indent(&format_record(details)));
    }

    if let Some(static_report) = &report.static_report {
        let magic = static_report.magic();
        if !magic.is_empty() {
            section(&mut out, "File type");
            for (key, value) in magic {
                let _ = writeln!(out, "  {}: {}", key.bold(), value);
            }
        }

        let trid = static_report.trid();
        if !trid.is_empty() {
            section(&mut out, "TrID");
            for entry in trid {
                let _ = writeln!(
                    out,
                    "  {:>7}  {:<6} {}",
                    entry.probability, entry.extension, entry.description
                );
            }
        }

        let exif = static_report.exif();
        if !exif.is_empty() {
            section(&mut out, "EXIF");
            for (key, value) in exif {
                let _ = writeln!(out, "  {}: {}", key.bold(), value);
            }
        }

        let lines = static_report.hexdump_lines();
        if !lines.is_empty() {
            section(&mut out, "Hexdump");
            let _ = writeln!(out, "  {:8}  {}", "", HEX_COLUMNS.join(" ").dimmed());
            for line in lines {
                let _ = writeln!(out, "  {}", line);
            }
        }
    }

    if let Some(av) = &report.av_report {
        section(&mut out, "Antivirus");
        for (engine, verdict) in av.verdicts() {
            match verdict {
                Verdict::Clean => {
                    let _ = writeln!(out, "  {} {}: {}", "✓".green(), engine, "Clean".green());
                }
                Verdict::Detected(hits) => {
                    for (path, details) in hits {
                        let _ = writeln!(
                            out,
                            "  {} {}: {} ({})",
                            "✗".red(),
                            engine,
                            details.red(),
                            path
                        );
                    }
                }
            }
        }
    }

    out
}

pub fn format_environments(environments: &[Environment]) -> String {
    if environments.is_empty() {
        return "No environments available.\n".to_string();
    }
    environments
        .iter()
        .map(|e| format!("{:>4}  {}\n", display_value(&e.id), e.name))
        .collect()
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.bold().underline());
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {}\n", l)).collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => display_value(other),
    }
}
