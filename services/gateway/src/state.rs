use grouping_engine::{MemoryStore, UnderwritingService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UnderwritingService<MemoryStore>>,
}

impl AppState {
    pub fn new(service: UnderwritingService<MemoryStore>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
