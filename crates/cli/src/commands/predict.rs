//! Prediction CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, MaintenanceFeatures, VoyageFeatures};
use crate::output::{
    color_score, format_date, print_info, print_json, print_success, print_table, OutputFormat,
};

/// Row for the speed schedule table
#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "Segment")]
    segment: u8,
    #[tabled(rename = "Distance (nm)")]
    distance: String,
    #[tabled(rename = "Speed (kn)")]
    speed: String,
}

pub async fn fuel(client: &ApiClient, features: VoyageFeatures, format: OutputFormat) -> Result<()> {
    let prediction = client.predict_fuel(&features).await?;

    match format {
        OutputFormat::Json => print_json(&prediction)?,
        OutputFormat::Table => {
            println!(
                "Predicted fuel usage: {}",
                format!("{:.2}", prediction.predicted_fuel_usage).cyan().bold()
            );
        }
    }

    Ok(())
}

pub async fn route(client: &ApiClient, features: VoyageFeatures, format: OutputFormat) -> Result<()> {
    let plan = client.predict_route(&features).await?;

    match format {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Table => {
            println!("{}", "Route Plan".bold());
            println!("{}", "=".repeat(40));
            println!("Duration:      {:.1} h", plan.predicted_duration);
            println!("Optimal speed: {:.2} kn", plan.optimal_speed);
            println!();

            let rows: Vec<SegmentRow> = plan
                .speed_schedule
                .iter()
                .map(|s| SegmentRow {
                    segment: s.segment,
                    distance: format!("{:.1}", s.distance),
                    speed: format!("{:.2}", s.speed),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}

pub async fn maintenance(
    client: &ApiClient,
    features: MaintenanceFeatures,
    format: OutputFormat,
) -> Result<()> {
    let forecast = client.predict_maintenance(&features).await?;

    match format {
        OutputFormat::Json => print_json(&forecast)?,
        OutputFormat::Table => {
            println!("Next maintenance due: {}", format_date(&forecast.next_due_date).cyan());
            println!("Voyage ready by:      {}", format_date(&forecast.voyage_ready_date).cyan());
            println!("Condition score:      {}", color_score(forecast.score));
        }
    }

    Ok(())
}

/// Forecast and record the next maintenance of a ship from its history
pub async fn maintenance_alert(client: &ApiClient, ship_id: &str, format: OutputFormat) -> Result<()> {
    let record = client.maintenance_alert(ship_id).await?;

    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            print_success(&format!("Maintenance schedule recorded for ship {}", ship_id));
            if let Some(next_due) = &record.next_due {
                println!("Next due:     {}", format_date(next_due));
            }
            if let Some(ready) = &record.voyage_ready_date {
                println!("Voyage ready: {}", format_date(ready));
            }
            if let Some(score) = record.score {
                println!("Score:        {}", color_score(score));
            }
            print_info(&format!("Record id: {}", record.id));
        }
    }

    Ok(())
}
