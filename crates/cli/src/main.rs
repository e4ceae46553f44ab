//! Voyage Predictor CLI
//!
//! A command-line tool for training the fleet models, inspecting the model
//! registry and requesting predictions from the voyage predictor service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{models, predict};

/// Voyage Predictor CLI
#[derive(Parser)]
#[command(name = "vp")]
#[command(author, version, about = "CLI for the Voyage Predictor service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via VP_API_URL env var)
    #[arg(long, env = "VP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, value_enum)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train every model and activate the successful ones
    Train,

    /// List trained model versions
    Models {
        /// Filter by model type (fuel_predictor, route_optimizer, maintenance_forecaster)
        #[arg(long)]
        model_type: Option<String>,

        /// Show only active models
        #[arg(long)]
        active_only: bool,
    },

    /// Request a prediction
    #[command(subcommand)]
    Predict(PredictCommands),

    /// Forecast and record the next maintenance of a ship
    Maintenance {
        /// Ship ID
        ship_id: String,
    },
}

#[derive(Subcommand)]
pub enum PredictCommands {
    /// Predict fuel usage for a voyage
    Fuel(VoyageArgs),

    /// Predict duration, optimal speed and a speed schedule
    Route(VoyageArgs),

    /// Predict the next maintenance window
    Maintenance(MaintenanceArgs),
}

#[derive(Args)]
pub struct VoyageArgs {
    /// Cargo weight in tons
    #[arg(long)]
    pub cargo_weight: f64,

    /// Voyage distance in nautical miles
    #[arg(long)]
    pub distance: f64,

    /// Weather severity between 0 and 1
    #[arg(long)]
    pub weather_severity: f64,

    /// Wind speed in knots
    #[arg(long)]
    pub wind_speed: f64,
}

impl From<VoyageArgs> for client::VoyageFeatures {
    fn from(args: VoyageArgs) -> Self {
        Self {
            cargo_weight: args.cargo_weight,
            distance: args.distance,
            weather_severity: args.weather_severity,
            wind_speed: args.wind_speed,
        }
    }
}

#[derive(Args)]
pub struct MaintenanceArgs {
    /// Voyages in the last six months
    #[arg(long)]
    pub voyages: f64,

    /// Average fuel usage per voyage
    #[arg(long)]
    pub avg_fuel: f64,

    /// Days since the last maintenance
    #[arg(long, default_value_t = 180.0)]
    pub days_since: f64,
}

impl From<MaintenanceArgs> for client::MaintenanceFeatures {
    fn from(args: MaintenanceArgs) -> Self {
        Self {
            total_voyages_last_6m: args.voyages,
            avg_fuel_usage_per_voyage: args.avg_fuel,
            days_since_last_maintenance: args.days_since,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = config::Config::load()?;
    let api_url = file_config.resolve_api_url(cli.api_url);
    let format = file_config.resolve_format(cli.format);

    // Initialize client
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    match cli.command {
        Commands::Train => models::train(&client, format).await?,
        Commands::Models {
            model_type,
            active_only,
        } => models::list_models(&client, model_type, active_only, format).await?,
        Commands::Predict(predict_cmd) => match predict_cmd {
            PredictCommands::Fuel(args) => predict::fuel(&client, args.into(), format).await?,
            PredictCommands::Route(args) => predict::route(&client, args.into(), format).await?,
            PredictCommands::Maintenance(args) => {
                predict::maintenance(&client, args.into(), format).await?
            }
        },
        Commands::Maintenance { ship_id } => {
            predict::maintenance_alert(&client, &ship_id, format).await?
        }
    }

    Ok(())
}
