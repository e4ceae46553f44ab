//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format accuracy as percentage
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}%", accuracy * 100.0)
}

/// Color accuracy based on value; negative means worse than predicting the mean
pub fn color_accuracy(accuracy: f64) -> String {
    let formatted = format_accuracy(accuracy);
    if accuracy >= 0.8 {
        formatted.green().to_string()
    } else if accuracy >= 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "trained" | "active" => status.green().to_string(),
        "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a 1-5 maintenance or route score
pub fn color_score(score: u8) -> String {
    let formatted = format!("{}/5", score);
    match score {
        4..=5 => formatted.green().to_string(),
        3 => formatted.yellow().to_string(),
        _ => formatted.red().to_string(),
    }
}

/// Format an RFC 3339 timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

/// Format an RFC 3339 timestamp as a date only
pub fn format_date(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(0.9312), "93.1%");
        assert_eq!(format_accuracy(-0.25), "-25.0%");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2024-06-01T10:15:42Z"), "2024-06-01 10:15");
        assert_eq!(format_date("2024-06-01T10:15:42Z"), "2024-06-01");
        assert_eq!(format_timestamp("not a date"), "not a date");
    }
}
