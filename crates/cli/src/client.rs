//! API client for communicating with the voyage predictor service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the voyage predictor service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            // Training runs synchronously on the server
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}, {}): {}", status, err.kind, err.error),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn train(&self) -> Result<TrainingReport> {
        self.post("api/v1/train", &serde_json::json!({})).await
    }

    pub async fn models(&self, model_type: Option<&str>, active_only: bool) -> Result<Vec<ModelMetadata>> {
        let mut path = format!("api/v1/models?active_only={}", active_only);
        if let Some(model_type) = model_type {
            path.push_str(&format!("&model_type={}", model_type));
        }
        self.get(&path).await
    }

    pub async fn predict_fuel(&self, features: &VoyageFeatures) -> Result<FuelPrediction> {
        self.post("api/v1/predict/fuel", features).await
    }

    pub async fn predict_route(&self, features: &VoyageFeatures) -> Result<RoutePlan> {
        self.post("api/v1/predict/route", features).await
    }

    pub async fn predict_maintenance(&self, features: &MaintenanceFeatures) -> Result<MaintenanceForecast> {
        self.post("api/v1/predict/maintenance", features).await
    }

    pub async fn maintenance_alert(&self, ship_id: &str) -> Result<MaintenanceRecord> {
        let path = format!("api/v1/ships/{}/maintenance", ship_id);
        self.post(&path, &serde_json::json!({})).await
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageFeatures {
    pub cargo_weight: f64,
    pub distance: f64,
    pub weather_severity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceFeatures {
    pub total_voyages_last_6m: f64,
    pub avg_fuel_usage_per_voyage: f64,
    pub days_since_last_maintenance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPrediction {
    pub predicted_fuel_usage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedSegment {
    pub segment: u8,
    pub distance: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    pub predicted_duration: f64,
    pub optimal_speed: f64,
    pub speed_schedule: Vec<SpeedSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceForecast {
    pub next_due_date: String,
    pub voyage_ready_date: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: String,
    pub ship_id: String,
    pub maintained_at: String,
    pub next_due: Option<String>,
    pub voyage_ready_date: Option<String>,
    pub score: Option<u8>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub id: String,
    pub model_type: String,
    pub version: String,
    pub parameters: serde_json::Value,
    pub accuracy: f64,
    pub trained_at: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub model_type: String,
    pub status: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub started_at: String,
    pub outcomes: Vec<TaskOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_models_query_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/models")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("active_only".into(), "true".into()),
                mockito::Matcher::UrlEncoded("model_type".into(), "fuel_predictor".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":"3f0c","model_type":"fuel_predictor","version":"v1717236000000",
                    "parameters":{"layers":[16,8,1]},"accuracy":0.9312,
                    "trained_at":"2024-06-01T10:00:00Z","is_active":true}]"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let models = client.models(Some("fuel_predictor"), true).await.unwrap();

        mock.assert_async().await;
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].version, "v1717236000000");
        assert!(models[0].is_active);
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict/fuel")
            .with_status(503)
            .with_body(r#"{"error":"fuel_predictor model has not been trained","kind":"model_not_trained"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .predict_fuel(&VoyageFeatures {
                cargo_weight: 1.0,
                distance: 1.0,
                weather_severity: 0.1,
                wind_speed: 1.0,
            })
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("model_not_trained"), "{}", message);
    }

    #[tokio::test]
    async fn test_training_report_parses_both_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/train")
            .with_status(200)
            .with_body(
                r#"{"started_at":"2024-06-01T10:00:00Z","outcomes":[
                    {"model_type":"fuel_predictor","status":"trained","version":"v1","accuracy":0.88,"examples":42,"duration_ms":950},
                    {"model_type":"route_optimizer","status":"failed","error_kind":"insufficient_data","message":"no training examples available for route_optimizer","duration_ms":2}
                ]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report = client.train().await.unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].examples, Some(42));
        assert_eq!(report.outcomes[1].error_kind.as_deref(), Some("insufficient_data"));
    }
}
