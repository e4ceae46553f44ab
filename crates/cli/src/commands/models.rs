//! Model training and registry CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, TrainingReport};
use crate::output::{
    color_accuracy, color_status, format_timestamp, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Row for models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Type")]
    model_type: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Trained")]
    trained_at: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Active")]
    active: String,
}

/// Row for the training report table
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Task")]
    model_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Examples")]
    examples: String,
    #[tabled(rename = "Time")]
    duration: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Trigger a full training run
pub async fn train(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report = client.train().await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &TrainingReport) {
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            model_type: o.model_type.clone(),
            status: color_status(&o.status),
            version: o.version.clone().unwrap_or_default(),
            accuracy: o.accuracy.map(color_accuracy).unwrap_or_default(),
            examples: o.examples.map(|e| e.to_string()).unwrap_or_default(),
            duration: format!("{} ms", o.duration_ms),
            error: o.message.clone().unwrap_or_default(),
        })
        .collect();
    print_table(rows);

    let failed = report.outcomes.iter().filter(|o| o.status == "failed").count();
    if failed == 0 {
        print_success("All models trained and activated");
    } else {
        print_warning(&format!(
            "{} of {} tasks failed; their previous models stay in place",
            failed,
            report.outcomes.len()
        ));
    }
}

/// List registry rows
pub async fn list_models(
    client: &ApiClient,
    model_type: Option<String>,
    active_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let models = client.models(model_type.as_deref(), active_only).await?;

    match format {
        OutputFormat::Json => print_json(&models)?,
        OutputFormat::Table => {
            if models.is_empty() {
                print_warning("No models found");
                return Ok(());
            }

            let rows: Vec<ModelRow> = models
                .iter()
                .map(|m| ModelRow {
                    model_type: m.model_type.clone(),
                    version: m.version.clone(),
                    trained_at: format_timestamp(&m.trained_at),
                    accuracy: color_accuracy(m.accuracy),
                    active: if m.is_active {
                        "✓".green().to_string()
                    } else {
                        "".to_string()
                    },
                })
                .collect();
            print_table(rows);
            println!("\nTotal: {} models", models.len());
        }
    }

    Ok(())
}
