//! Output formatting utilities

use console::{style, Style};
use nexus_frameworks::Report;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Print the terminal report of a run
pub fn print_report(report: &Report, json: bool, verbose: bool) {
    if json {
        println!("{}", report.to_json());
        return;
    }

    match &report.error {
        None => {
            success(&format!("{} completed", report.operation));
            if let Some(data) = &report.data {
                if let Some(qr) = data.get("qrcodeImagePath").and_then(|v| v.as_str()) {
                    println!("{}", key_value("QR code", &path_style().apply_to(qr).to_string()));
                }
                if let Some(version) = data.get("version").and_then(|v| v.as_str()) {
                    println!("{}", key_value("Version", version));
                }
                if data.get("dryRun").and_then(|v| v.as_bool()) == Some(true) {
                    println!("  {}", style("dry run, nothing was built or uploaded").yellow());
                }
            }
        }
        Some(failure) => {
            error(&format!("[{}] {}", failure.code, failure.message));
            eprintln!("  {} {}", style("Suggestion:").yellow(), failure.suggestion);
            if verbose {
                for (key, value) in &failure.details {
                    eprintln!("{}", key_value(key, &value.to_string()));
                }
            }
        }
    }

    let meta = &report.metadata;
    for (label, value) in [
        ("Framework", &meta.framework),
        ("Platform", &meta.platform),
        ("Output", &meta.output_path),
    ] {
        if let Some(value) = value {
            println!("{}", key_value(label, value));
        }
    }
}
