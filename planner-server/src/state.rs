use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use planner_core::store::MemoryStore;
use planner_core::{Planner, PlannerConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    // One lock around the engine serializes every read-then-write sequence,
    // which gives each recurrence group the isolation the engine relies on.
    planner: Arc<Mutex<Planner<MemoryStore>>>,
}

impl AppState {
    pub fn new(config: &PlannerConfig) -> Result<Self> {
        let planner = Planner::new(MemoryStore::new(), config)?;
        Ok(AppState {
            planner: Arc::new(Mutex::new(planner)),
        })
    }

    pub fn planner(&self) -> Result<MutexGuard<'_, Planner<MemoryStore>>> {
        self.planner
            .lock()
            .map_err(|_| anyhow!("Planner state lock poisoned"))
    }
}
