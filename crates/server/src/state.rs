use std::sync::Arc;

use upkeep_alarms::{EventHistory, InMemoryMachineStore, MaintenanceCronService};

/// Shared handles for the admin handlers.
pub struct AppState {
    pub service: Arc<MaintenanceCronService>,
    pub store: Arc<InMemoryMachineStore>,
    pub history: Arc<EventHistory>,
}
