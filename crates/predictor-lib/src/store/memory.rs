//! In-memory store backed by vectors behind a single lock

use super::{HistoricalStore, HistoryWriter, RegistryStore};
use crate::error::StoreError;
use crate::models::{
    FuelLog, MaintenanceRecord, MaintenanceWithHistory, ModelMetadata, ModelType, Ship,
    ShipHistory, Voyage, VoyageFeedback, VoyageWithFeedback, VoyageWithFuelLogs,
};
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    ships: Vec<Ship>,
    voyages: Vec<Voyage>,
    feedbacks: Vec<VoyageFeedback>,
    fuel_logs: Vec<FuelLog>,
    maintenance: Vec<MaintenanceRecord>,
    models: Vec<ModelMetadata>,
}

impl Tables {
    fn voyage_with_fuel_logs(&self, voyage: &Voyage) -> VoyageWithFuelLogs {
        VoyageWithFuelLogs {
            voyage: voyage.clone(),
            fuel_logs: self
                .fuel_logs
                .iter()
                .filter(|log| log.voyage_id == voyage.id)
                .cloned()
                .collect(),
        }
    }
}

/// Thread-safe in-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl HistoricalStore for InMemoryStore {
    fn voyages_with_feedback(&self) -> Result<Vec<VoyageWithFeedback>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .voyages
            .iter()
            .map(|voyage| VoyageWithFeedback {
                voyage: voyage.clone(),
                feedbacks: tables
                    .feedbacks
                    .iter()
                    .filter(|f| f.voyage_id == voyage.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    fn maintenance_with_history(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceWithHistory>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .maintenance
            .iter()
            .map(|record| MaintenanceWithHistory {
                record: record.clone(),
                recent_voyages: tables
                    .voyages
                    .iter()
                    .filter(|v| v.ship_id == record.ship_id && v.departure_date >= since)
                    .map(|v| tables.voyage_with_fuel_logs(v))
                    .collect(),
            })
            .collect())
    }

    fn ship_history(&self, ship_id: &str) -> Result<ShipHistory, StoreError> {
        let tables = self.read()?;
        Ok(ShipHistory {
            ship_id: ship_id.to_string(),
            voyages: tables
                .voyages
                .iter()
                .filter(|v| v.ship_id == ship_id)
                .map(|v| tables.voyage_with_fuel_logs(v))
                .collect(),
            maintenance: tables
                .maintenance
                .iter()
                .filter(|m| m.ship_id == ship_id)
                .cloned()
                .collect(),
        })
    }

    fn voyage(&self, voyage_id: &str) -> Result<Option<Voyage>, StoreError> {
        let tables = self.read()?;
        Ok(tables.voyages.iter().find(|v| v.id == voyage_id).cloned())
    }
}

impl HistoryWriter for InMemoryStore {
    fn insert_ship(&self, ship: &Ship) -> Result<(), StoreError> {
        self.write()?.ships.push(ship.clone());
        Ok(())
    }

    fn insert_voyage(&self, voyage: &Voyage) -> Result<(), StoreError> {
        self.write()?.voyages.push(voyage.clone());
        Ok(())
    }

    fn insert_feedback(&self, feedback: &VoyageFeedback) -> Result<(), StoreError> {
        self.write()?.feedbacks.push(feedback.clone());
        Ok(())
    }

    fn insert_fuel_log(&self, log: &FuelLog) -> Result<(), StoreError> {
        self.write()?.fuel_logs.push(log.clone());
        Ok(())
    }

    fn insert_maintenance_record(&self, record: &MaintenanceRecord) -> Result<(), StoreError> {
        self.write()?.maintenance.push(record.clone());
        Ok(())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.ships.is_empty())
    }
}

impl RegistryStore for InMemoryStore {
    fn create_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        self.write()?.models.push(metadata.clone());
        Ok(())
    }

    fn deactivate_models(&self, model_type: ModelType) -> Result<usize, StoreError> {
        let mut tables = self.write()?;
        let mut touched = 0;
        for model in tables.models.iter_mut().filter(|m| m.model_type == model_type) {
            model.is_active = false;
            touched += 1;
        }
        Ok(touched)
    }

    fn activate_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        // One write guard covers both steps so readers never see two active rows
        let mut tables = self.write()?;
        for model in tables
            .models
            .iter_mut()
            .filter(|m| m.model_type == metadata.model_type)
        {
            model.is_active = false;
        }
        let mut active = metadata.clone();
        active.is_active = true;
        tables.models.push(active);
        Ok(())
    }

    fn list_models(&self, model_type: Option<ModelType>) -> Result<Vec<ModelMetadata>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .models
            .iter()
            .rev()
            .filter(|m| model_type.map_or(true, |t| m.model_type == t))
            .cloned()
            .collect())
    }

    fn active_model(&self, model_type: ModelType) -> Result<Option<ModelMetadata>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .models
            .iter()
            .find(|m| m.model_type == model_type && m.is_active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn metadata(model_type: ModelType, version: &str) -> ModelMetadata {
        ModelMetadata {
            id: Uuid::new_v4(),
            model_type,
            version: version.to_string(),
            parameters: serde_json::json!({}),
            accuracy: 0.9,
            trained_at: Utc::now(),
            is_active: false,
        }
    }

    fn voyage(id: &str, ship_id: &str, departure: DateTime<Utc>) -> Voyage {
        Voyage {
            id: id.to_string(),
            ship_id: ship_id.to_string(),
            name: "Rotterdam to Oslo".to_string(),
            origin: "Rotterdam".to_string(),
            destination: "Oslo".to_string(),
            distance: 1200.0,
            cargo_weight: 30_000.0,
            cargo_type: None,
            weather_severity: 0.4,
            wind_speed: 14.0,
            departure_date: departure,
            arrival_time: None,
            predicted_fuel_usage: None,
            predicted_duration: None,
            optimal_speed: None,
        }
    }

    #[test]
    fn test_activate_model_keeps_single_active_row() {
        let store = InMemoryStore::new();
        store.activate_model(&metadata(ModelType::FuelPredictor, "v1")).unwrap();
        store.activate_model(&metadata(ModelType::FuelPredictor, "v2")).unwrap();
        store.activate_model(&metadata(ModelType::RouteOptimizer, "v3")).unwrap();

        let fuel = store.list_models(Some(ModelType::FuelPredictor)).unwrap();
        assert_eq!(fuel.len(), 2);
        assert_eq!(fuel.iter().filter(|m| m.is_active).count(), 1);
        assert_eq!(
            store.active_model(ModelType::FuelPredictor).unwrap().unwrap().version,
            "v2"
        );
        // Other types are untouched
        assert_eq!(
            store.active_model(ModelType::RouteOptimizer).unwrap().unwrap().version,
            "v3"
        );
    }

    #[test]
    fn test_deactivate_models_counts_rows() {
        let store = InMemoryStore::new();
        store.activate_model(&metadata(ModelType::FuelPredictor, "v1")).unwrap();
        store.create_model(&metadata(ModelType::FuelPredictor, "v2")).unwrap();
        assert_eq!(store.deactivate_models(ModelType::FuelPredictor).unwrap(), 2);
        assert!(store.active_model(ModelType::FuelPredictor).unwrap().is_none());
    }

    #[test]
    fn test_maintenance_history_respects_window() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.insert_voyage(&voyage("old", "ship-1", now - Duration::days(400))).unwrap();
        store.insert_voyage(&voyage("new", "ship-1", now - Duration::days(10))).unwrap();
        store.insert_voyage(&voyage("other", "ship-2", now - Duration::days(10))).unwrap();
        store
            .insert_maintenance_record(&MaintenanceRecord {
                id: "m1".to_string(),
                ship_id: "ship-1".to_string(),
                maintained_at: now,
                next_due: None,
                voyage_ready_date: None,
                score: None,
                description: None,
            })
            .unwrap();

        let rows = store.maintenance_with_history(now - Duration::days(180)).unwrap();
        assert_eq!(rows.len(), 1);
        let ids: Vec<_> = rows[0].recent_voyages.iter().map(|v| v.voyage.id.as_str()).collect();
        assert_eq!(ids, vec!["new"]);
    }
}
