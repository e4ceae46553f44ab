//! Model registry bookkeeping and version stamping

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{ModelMetadata, ModelType};
use crate::store::RegistryStore;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Issues time-derived versions that strictly increase within the process
#[derive(Debug, Default)]
pub struct VersionStamper {
    last_millis: AtomicI64,
}

impl VersionStamper {
    pub fn new() -> Self {
        Self::default()
    }

    /// `v<unix-millis>`, bumped past the previous stamp when the clock has not advanced
    pub fn next(&self, clock: &dyn Clock) -> String {
        let now = clock.now().timestamp_millis();
        let mut previous = self.last_millis.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(previous + 1);
            match self.last_millis.compare_exchange(
                previous,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return format!("v{}", candidate),
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Registry of trained model generations, at most one active per type
pub struct ModelRegistry {
    store: Arc<dyn RegistryStore>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// Persist `metadata` as the single active row for its type
    pub fn activate(&self, metadata: &ModelMetadata) -> Result<ModelMetadata> {
        self.store.activate_model(metadata)?;
        debug!(
            model_type = %metadata.model_type,
            version = %metadata.version,
            accuracy = metadata.accuracy,
            "Model activated"
        );
        let mut active = metadata.clone();
        active.is_active = true;
        Ok(active)
    }

    pub fn active(&self, model_type: ModelType) -> Result<Option<ModelMetadata>> {
        Ok(self.store.active_model(model_type)?)
    }

    /// Rows newest first
    pub fn list(&self, model_type: Option<ModelType>, active_only: bool) -> Result<Vec<ModelMetadata>> {
        let mut rows = self.store.list_models(model_type)?;
        if active_only {
            rows.retain(|m| m.is_active);
        }
        Ok(rows)
    }
}
