// src/state.rs

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    config::Config,
    events::EventBus,
    handlers::{GradeRecalculationHandler, spawn_handler},
    services::{AttemptManager, GradeAggregator},
    store::{AttemptStore, GradeStore},
};

/// The engine wired together over one store.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub events: EventBus,
    pub attempts: Arc<AttemptManager>,
    pub grades: Arc<GradeAggregator>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: AttemptStore + GradeStore + 'static,
    {
        let events = EventBus::default();
        let attempt_store: Arc<dyn AttemptStore> = store.clone();
        let grade_store: Arc<dyn GradeStore> = store;

        Self {
            attempts: Arc::new(AttemptManager::new(attempt_store, events.clone())),
            grades: Arc::new(GradeAggregator::new(grade_store, config.default_weights)),
            events,
            config,
        }
    }

    /// Starts the task that keeps course grades current after submissions,
    /// graded assignments and completed lessons.
    pub fn spawn_grade_listener(&self) -> JoinHandle<()> {
        let handler = Arc::new(GradeRecalculationHandler::new(self.grades.clone()));
        spawn_handler(handler, self.events.subscribe())
    }
}
