//! Persistence collaborators
//!
//! The prediction core only reads history and writes registry rows through
//! these traits. Two backends are provided:
//! - `InMemoryStore` for tests and ephemeral runs
//! - `SqliteStore` for the service process

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::{
    FuelLog, MaintenanceRecord, MaintenanceWithHistory, ModelMetadata, ModelType, Ship,
    ShipHistory, Voyage, VoyageFeedback, VoyageWithFeedback,
};
use chrono::{DateTime, Utc};

/// Read access to historical operational data
pub trait HistoricalStore: Send + Sync {
    /// All voyages with their feedback submissions nested
    fn voyages_with_feedback(&self) -> Result<Vec<VoyageWithFeedback>, StoreError>;

    /// All maintenance records, each with the ship's voyages (and fuel logs)
    /// departing at or after `since`
    fn maintenance_with_history(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceWithHistory>, StoreError>;

    /// Every voyage and maintenance record of a single ship
    fn ship_history(&self, ship_id: &str) -> Result<ShipHistory, StoreError>;

    /// Look up a single voyage
    fn voyage(&self, voyage_id: &str) -> Result<Option<Voyage>, StoreError>;
}

/// Write access used by the service layer and the seeder
pub trait HistoryWriter: Send + Sync {
    fn insert_ship(&self, ship: &Ship) -> Result<(), StoreError>;
    fn insert_voyage(&self, voyage: &Voyage) -> Result<(), StoreError>;
    fn insert_feedback(&self, feedback: &VoyageFeedback) -> Result<(), StoreError>;
    fn insert_fuel_log(&self, log: &FuelLog) -> Result<(), StoreError>;
    fn insert_maintenance_record(&self, record: &MaintenanceRecord) -> Result<(), StoreError>;

    /// True when no ships have been recorded yet
    fn is_empty(&self) -> Result<bool, StoreError>;
}

/// Persistence of trained-model metadata
pub trait RegistryStore: Send + Sync {
    /// Insert a metadata row as given
    fn create_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError>;

    /// Mark every row of `model_type` inactive, returning the number of rows touched
    fn deactivate_models(&self, model_type: ModelType) -> Result<usize, StoreError>;

    /// Deactivate all rows of the metadata's type and insert it as the active row,
    /// as one atomic step
    fn activate_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError>;

    /// Rows newest first, optionally restricted to one model type
    fn list_models(&self, model_type: Option<ModelType>) -> Result<Vec<ModelMetadata>, StoreError>;

    fn active_model(&self, model_type: ModelType) -> Result<Option<ModelMetadata>, StoreError>;
}
