use crate::logic::QueryOrchestrator;

pub struct AppState {
    pub orchestrator: QueryOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: QueryOrchestrator) -> Self {
        Self { orchestrator }
    }
}
