//! Output formatting for JSON and text modes
//!
//! Text mode prints one line per check and sub-check as the run advances and a
//! tally at the end. JSON mode prints a single document once the run is over.

use crate::checks::CheckReport;
use crate::runner::RunReport;
use serde::Serialize;

/// Whole-run result
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub base_url: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
    pub passed: usize,
    pub total: usize,
    pub success: bool,
    pub checks: Vec<CheckOutput>,
}

/// One check or sub-check
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_checks: Vec<CheckOutput>,
}

impl From<&CheckReport> for CheckOutput {
    fn from(report: &CheckReport) -> Self {
        Self {
            name: report.name.to_string(),
            passed: report.passed(),
            failure: report.failure().map(|f| f.to_string()),
            notes: report.notes.clone(),
            sub_checks: report.sub_checks.iter().map(CheckOutput::from).collect(),
        }
    }
}

impl From<&RunReport> for RunOutput {
    fn from(report: &RunReport) -> Self {
        Self {
            base_url: report.base_url.clone(),
            started_at: report.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            strict: report.strict,
            passed: report.passed_count(),
            total: report.total(),
            success: report.all_passed(),
            checks: report.checks.iter().map(CheckOutput::from).collect(),
        }
    }
}

/// Text lines for one finished check, sub-checks indented below it
pub fn render_check(report: &CheckReport) -> String {
    let mut out = String::new();
    render_into(&mut out, report, 0);
    out
}

fn render_into(out: &mut String, report: &CheckReport, depth: usize) {
    let indent = "  ".repeat(depth);
    let status = if report.passed() { "PASS" } else { "FAIL" };

    match report.failure() {
        // Parent failures are summarized by their sub-check lines
        Some(failure) if report.sub_checks.is_empty() => {
            out.push_str(&format!("{}[{}] {}: {}\n", indent, status, report.name, failure));
        }
        _ => out.push_str(&format!("{}[{}] {}\n", indent, status, report.name)),
    }

    for note in &report.notes {
        out.push_str(&format!("{}      - {}\n", indent, note));
    }
    for sub in &report.sub_checks {
        render_into(out, sub, depth + 1);
    }
}

/// Final tally line plus verdict
pub fn render_summary(report: &RunReport) -> String {
    let verdict = if report.all_passed() {
        "All checks passed."
    } else {
        "Some checks failed."
    };
    format!(
        "Result: {}/{} checks passed\n{}",
        report.passed_count(),
        report.total(),
        verdict
    )
}

/// Group the integer part of an amount with commas, e.g. `1,234,567.5`
pub fn format_amount(amount: f64) -> String {
    let rendered = format!("{}", amount.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Print JSON output to stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    }
}
