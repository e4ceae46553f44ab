//! Process-wide holder of the trained model handles

use crate::regression::RegressionModel;
use std::sync::{Arc, PoisonError, RwLock};

/// Atomically swappable slot for one immutable model handle
///
/// Readers clone the inner `Arc` and release the lock before evaluating, so
/// a concurrent `install` never blocks on a running prediction and readers
/// always see either the previous or the new model.
#[derive(Debug)]
pub struct ModelSlot<T> {
    inner: RwLock<Option<Arc<T>>>,
}

impl<T> Default for ModelSlot<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }
}

impl<T> ModelSlot<T> {
    pub fn get(&self) -> Option<Arc<T>> {
        // A slot write is a single assignment, so a poisoned guard still holds a whole value
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn install(&self, model: T) {
        let model = Arc::new(model);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    pub fn is_loaded(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Duration and speed models, swapped together
#[derive(Debug)]
pub struct RouteModels {
    pub duration: RegressionModel,
    pub speed: RegressionModel,
}

/// Current model handles for every task
#[derive(Debug, Default)]
pub struct ModelContext {
    pub fuel: ModelSlot<RegressionModel>,
    pub route: ModelSlot<RouteModels>,
    pub maintenance: ModelSlot<RegressionModel>,
}

impl ModelContext {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn constant(value: f32) -> RegressionModel {
        RegressionModel::from_parameters(vec![(array![[0.0]], array![value])]).unwrap()
    }

    #[test]
    fn test_slot_starts_empty() {
        let context = ModelContext::new();
        assert!(context.fuel.get().is_none());
        assert!(!context.route.is_loaded());
    }

    #[test]
    fn test_install_replaces_handle() {
        let slot = ModelSlot::default();
        slot.install(constant(1.0));
        let first = slot.get().unwrap();
        slot.install(constant(2.0));

        // Old readers keep their snapshot
        assert_eq!(first.predict(&[0.0]).unwrap(), vec![1.0]);
        assert_eq!(slot.get().unwrap().predict(&[0.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_route_models_swap_together() {
        let context = ModelContext::new();
        context.route.install(RouteModels {
            duration: constant(10.0),
            speed: constant(14.0),
        });
        let route = context.route.get().unwrap();
        assert_eq!(route.duration.predict(&[0.0]).unwrap(), vec![10.0]);
        assert_eq!(route.speed.predict(&[0.0]).unwrap(), vec![14.0]);
    }
}
