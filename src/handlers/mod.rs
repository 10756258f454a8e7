// src/handlers/mod.rs

// Downstream consumers of post-commit engine events. Handlers run on their own
// task; a failing handler is logged and never reaches the submission that
// triggered it.

pub mod grades;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{error::AssessmentResult, events::AssessmentEvent};

pub use grades::GradeRecalculationHandler;

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs (e.g. "grade-recalculation").
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &AssessmentEvent) -> AssessmentResult<()>;
}

/// Drives `handler` from `receiver` until the bus is dropped.
pub fn spawn_handler(
    handler: Arc<dyn EventHandler>,
    mut receiver: broadcast::Receiver<AssessmentEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = handler.handle(&event).await {
                        tracing::error!("Handler {} failed on {:?}: {}", handler.name(), event, e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Handler {} lagged, skipped {} events", handler.name(), skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, stopping handler {}", handler.name());
                    break;
                }
            }
        }
    })
}
