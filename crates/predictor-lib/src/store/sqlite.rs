//! SQLite-backed store used by the service process

use super::{HistoricalStore, HistoryWriter, RegistryStore};
use crate::error::StoreError;
use crate::models::{
    FuelLog, MaintenanceRecord, MaintenanceWithHistory, ModelMetadata, ModelType, Ship,
    ShipHistory, Voyage, VoyageFeedback, VoyageWithFeedback, VoyageWithFuelLogs,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ships (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    capacity REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS voyages (
    id TEXT PRIMARY KEY,
    ship_id TEXT NOT NULL,
    name TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    distance REAL NOT NULL,
    cargo_weight REAL NOT NULL,
    cargo_type TEXT,
    weather_severity REAL NOT NULL,
    wind_speed REAL NOT NULL,
    departure_date TEXT NOT NULL,
    arrival_time TEXT,
    predicted_fuel_usage REAL,
    predicted_duration REAL,
    optimal_speed REAL
);
CREATE INDEX IF NOT EXISTS idx_voyages_ship ON voyages(ship_id);
CREATE TABLE IF NOT EXISTS voyage_feedback (
    id TEXT PRIMARY KEY,
    voyage_id TEXT NOT NULL,
    actual_fuel_usage REAL,
    actual_duration REAL,
    fuel_accuracy REAL,
    duration_accuracy REAL,
    route_optimization_score INTEGER NOT NULL,
    submitted_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS fuel_logs (
    id TEXT PRIMARY KEY,
    ship_id TEXT NOT NULL,
    voyage_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    fuel_type TEXT NOT NULL,
    fuel_usage REAL NOT NULL,
    fuel_cost REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fuel_logs_voyage ON fuel_logs(voyage_id);
CREATE TABLE IF NOT EXISTS maintenance_records (
    id TEXT PRIMARY KEY,
    ship_id TEXT NOT NULL,
    maintained_at TEXT NOT NULL,
    next_due TEXT,
    voyage_ready_date TEXT,
    score INTEGER,
    description TEXT
);
CREATE TABLE IF NOT EXISTS ai_models (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    model_type TEXT NOT NULL,
    version TEXT NOT NULL,
    parameters TEXT NOT NULL,
    accuracy REAL NOT NULL,
    trained_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_ai_models_one_active
    ON ai_models(model_type) WHERE is_active = 1;
"#;

const VOYAGE_COLUMNS: &str = "id, ship_id, name, origin, destination, distance, cargo_weight, \
     cargo_type, weather_severity, wind_speed, departure_date, arrival_time, \
     predicted_fuel_usage, predicted_duration, optimal_speed";

const MODEL_COLUMNS: &str =
    "id, model_type, version, parameters, accuracy, trained_at, is_active";

/// SQLite implementation of the store traits
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened SQLite store");
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn voyage_from_row(row: &Row<'_>) -> rusqlite::Result<Voyage> {
    Ok(Voyage {
        id: row.get(0)?,
        ship_id: row.get(1)?,
        name: row.get(2)?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        distance: row.get(5)?,
        cargo_weight: row.get(6)?,
        cargo_type: row.get(7)?,
        weather_severity: row.get(8)?,
        wind_speed: row.get(9)?,
        departure_date: row.get(10)?,
        arrival_time: row.get(11)?,
        predicted_fuel_usage: row.get(12)?,
        predicted_duration: row.get(13)?,
        optimal_speed: row.get(14)?,
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<VoyageFeedback> {
    Ok(VoyageFeedback {
        id: row.get(0)?,
        voyage_id: row.get(1)?,
        actual_fuel_usage: row.get(2)?,
        actual_duration: row.get(3)?,
        fuel_accuracy: row.get(4)?,
        duration_accuracy: row.get(5)?,
        route_optimization_score: row.get(6)?,
        submitted_at: row.get(7)?,
    })
}

fn fuel_log_from_row(row: &Row<'_>) -> rusqlite::Result<FuelLog> {
    Ok(FuelLog {
        id: row.get(0)?,
        ship_id: row.get(1)?,
        voyage_id: row.get(2)?,
        timestamp: row.get(3)?,
        fuel_type: row.get(4)?,
        fuel_usage: row.get(5)?,
        fuel_cost: row.get(6)?,
    })
}

fn maintenance_from_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceRecord> {
    Ok(MaintenanceRecord {
        id: row.get(0)?,
        ship_id: row.get(1)?,
        maintained_at: row.get(2)?,
        next_due: row.get(3)?,
        voyage_ready_date: row.get(4)?,
        score: row.get(5)?,
        description: row.get(6)?,
    })
}

/// Raw registry row; parsed outside the rusqlite closure so errors keep their type
struct ModelRow {
    id: String,
    model_type: String,
    version: String,
    parameters: String,
    accuracy: f64,
    trained_at: DateTime<Utc>,
    is_active: bool,
}

impl ModelRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            model_type: row.get(1)?,
            version: row.get(2)?,
            parameters: row.get(3)?,
            accuracy: row.get(4)?,
            trained_at: row.get(5)?,
            is_active: row.get(6)?,
        })
    }

    fn into_metadata(self) -> Result<ModelMetadata, StoreError> {
        Ok(ModelMetadata {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| StoreError::Corrupt(format!("model id '{}': {}", self.id, e)))?,
            model_type: self
                .model_type
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("model type '{}'", self.model_type)))?,
            version: self.version,
            parameters: serde_json::from_str(&self.parameters)?,
            accuracy: self.accuracy,
            trained_at: self.trained_at,
            is_active: self.is_active,
        })
    }
}

fn insert_model(
    conn: &Connection,
    metadata: &ModelMetadata,
    is_active: bool,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO ai_models (id, model_type, version, parameters, accuracy, trained_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            metadata.id.to_string(),
            metadata.model_type.as_str(),
            metadata.version,
            serde_json::to_string(&metadata.parameters)?,
            metadata.accuracy,
            metadata.trained_at,
            is_active,
        ],
    )?;
    Ok(())
}

fn load_voyages(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Voyage>, StoreError> {
    let sql = format!("SELECT {} FROM voyages {} ORDER BY departure_date", VOYAGE_COLUMNS, filter);
    let mut stmt = conn.prepare(&sql)?;
    let voyages = stmt
        .query_map(args, voyage_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(voyages)
}

fn load_fuel_logs_by_voyage(conn: &Connection) -> Result<HashMap<String, Vec<FuelLog>>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, ship_id, voyage_id, timestamp, fuel_type, fuel_usage, fuel_cost
         FROM fuel_logs ORDER BY timestamp",
    )?;
    let mut grouped: HashMap<String, Vec<FuelLog>> = HashMap::new();
    for log in stmt.query_map([], fuel_log_from_row)? {
        let log = log?;
        grouped.entry(log.voyage_id.clone()).or_default().push(log);
    }
    Ok(grouped)
}

fn attach_fuel_logs(
    voyages: Vec<Voyage>,
    logs: &HashMap<String, Vec<FuelLog>>,
) -> Vec<VoyageWithFuelLogs> {
    voyages
        .into_iter()
        .map(|voyage| VoyageWithFuelLogs {
            fuel_logs: logs.get(&voyage.id).cloned().unwrap_or_default(),
            voyage,
        })
        .collect()
}

impl HistoricalStore for SqliteStore {
    fn voyages_with_feedback(&self) -> Result<Vec<VoyageWithFeedback>, StoreError> {
        let conn = self.lock()?;
        let voyages = load_voyages(&conn, "", params![])?;

        let mut stmt = conn.prepare(
            "SELECT id, voyage_id, actual_fuel_usage, actual_duration, fuel_accuracy,
                    duration_accuracy, route_optimization_score, submitted_at
             FROM voyage_feedback ORDER BY submitted_at",
        )?;
        let mut feedback: HashMap<String, Vec<VoyageFeedback>> = HashMap::new();
        for row in stmt.query_map([], feedback_from_row)? {
            let row = row?;
            feedback.entry(row.voyage_id.clone()).or_default().push(row);
        }

        Ok(voyages
            .into_iter()
            .map(|voyage| VoyageWithFeedback {
                feedbacks: feedback.remove(&voyage.id).unwrap_or_default(),
                voyage,
            })
            .collect())
    }

    fn maintenance_with_history(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceWithHistory>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, ship_id, maintained_at, next_due, voyage_ready_date, score, description
             FROM maintenance_records ORDER BY maintained_at",
        )?;
        let records = stmt
            .query_map([], maintenance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // Window filtering happens on parsed timestamps, not on stored text
        let logs = load_fuel_logs_by_voyage(&conn)?;
        let mut recent_by_ship: HashMap<String, Vec<VoyageWithFuelLogs>> = HashMap::new();
        let recent: Vec<Voyage> = load_voyages(&conn, "", params![])?
            .into_iter()
            .filter(|v| v.departure_date >= since)
            .collect();
        for voyage in attach_fuel_logs(recent, &logs) {
            recent_by_ship
                .entry(voyage.voyage.ship_id.clone())
                .or_default()
                .push(voyage);
        }

        Ok(records
            .into_iter()
            .map(|record| MaintenanceWithHistory {
                recent_voyages: recent_by_ship
                    .get(&record.ship_id)
                    .cloned()
                    .unwrap_or_default(),
                record,
            })
            .collect())
    }

    fn ship_history(&self, ship_id: &str) -> Result<ShipHistory, StoreError> {
        let conn = self.lock()?;
        let voyages = load_voyages(&conn, "WHERE ship_id = ?1", params![ship_id])?;
        let logs = load_fuel_logs_by_voyage(&conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, ship_id, maintained_at, next_due, voyage_ready_date, score, description
             FROM maintenance_records WHERE ship_id = ?1 ORDER BY maintained_at",
        )?;
        let maintenance = stmt
            .query_map([ship_id], maintenance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ShipHistory {
            ship_id: ship_id.to_string(),
            voyages: attach_fuel_logs(voyages, &logs),
            maintenance,
        })
    }

    fn voyage(&self, voyage_id: &str) -> Result<Option<Voyage>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM voyages WHERE id = ?1", VOYAGE_COLUMNS);
        Ok(conn
            .query_row(&sql, [voyage_id], voyage_from_row)
            .optional()?)
    }
}

impl HistoryWriter for SqliteStore {
    fn insert_ship(&self, ship: &Ship) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO ships (id, name, capacity) VALUES (?1, ?2, ?3)",
            params![ship.id, ship.name, ship.capacity],
        )?;
        Ok(())
    }

    fn insert_voyage(&self, voyage: &Voyage) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO voyages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            VOYAGE_COLUMNS
        );
        self.lock()?.execute(
            &sql,
            params![
                voyage.id,
                voyage.ship_id,
                voyage.name,
                voyage.origin,
                voyage.destination,
                voyage.distance,
                voyage.cargo_weight,
                voyage.cargo_type,
                voyage.weather_severity,
                voyage.wind_speed,
                voyage.departure_date,
                voyage.arrival_time,
                voyage.predicted_fuel_usage,
                voyage.predicted_duration,
                voyage.optimal_speed,
            ],
        )?;
        Ok(())
    }

    fn insert_feedback(&self, feedback: &VoyageFeedback) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO voyage_feedback (id, voyage_id, actual_fuel_usage, actual_duration,
                 fuel_accuracy, duration_accuracy, route_optimization_score, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                feedback.id,
                feedback.voyage_id,
                feedback.actual_fuel_usage,
                feedback.actual_duration,
                feedback.fuel_accuracy,
                feedback.duration_accuracy,
                feedback.route_optimization_score,
                feedback.submitted_at,
            ],
        )?;
        Ok(())
    }

    fn insert_fuel_log(&self, log: &FuelLog) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO fuel_logs (id, ship_id, voyage_id, timestamp, fuel_type, fuel_usage, fuel_cost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.id,
                log.ship_id,
                log.voyage_id,
                log.timestamp,
                log.fuel_type,
                log.fuel_usage,
                log.fuel_cost,
            ],
        )?;
        Ok(())
    }

    fn insert_maintenance_record(&self, record: &MaintenanceRecord) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO maintenance_records (id, ship_id, maintained_at, next_due,
                 voyage_ready_date, score, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.ship_id,
                record.maintained_at,
                record.next_due,
                record.voyage_ready_date,
                record.score,
                record.description,
            ],
        )?;
        Ok(())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM ships", [], |row| row.get(0))?;
        Ok(count == 0)
    }
}

impl RegistryStore for SqliteStore {
    fn create_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        let conn = self.lock()?;
        insert_model(&conn, metadata, metadata.is_active)
    }

    fn deactivate_models(&self, model_type: ModelType) -> Result<usize, StoreError> {
        let touched = self.lock()?.execute(
            "UPDATE ai_models SET is_active = 0 WHERE model_type = ?1",
            [model_type.as_str()],
        )?;
        Ok(touched)
    }

    fn activate_model(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE ai_models SET is_active = 0 WHERE model_type = ?1",
            [metadata.model_type.as_str()],
        )?;
        insert_model(&tx, metadata, true)?;
        tx.commit()?;
        Ok(())
    }

    fn list_models(&self, model_type: Option<ModelType>) -> Result<Vec<ModelMetadata>, StoreError> {
        let conn = self.lock()?;
        let rows = match model_type {
            Some(t) => {
                let sql = format!(
                    "SELECT {} FROM ai_models WHERE model_type = ?1 ORDER BY seq DESC",
                    MODEL_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([t.as_str()], ModelRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!("SELECT {} FROM ai_models ORDER BY seq DESC", MODEL_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], ModelRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        rows.into_iter().map(ModelRow::into_metadata).collect()
    }

    fn active_model(&self, model_type: ModelType) -> Result<Option<ModelMetadata>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM ai_models WHERE model_type = ?1 AND is_active = 1",
            MODEL_COLUMNS
        );
        conn.query_row(&sql, [model_type.as_str()], ModelRow::from_row)
            .optional()?
            .map(ModelRow::into_metadata)
            .transpose()
    }
}
