// src/handlers/grades.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AssessmentResult, events::AssessmentEvent, handlers::EventHandler,
    services::grades::GradeAggregator,
};

/// Recalculates the affected course grade after every event.
pub struct GradeRecalculationHandler {
    aggregator: Arc<GradeAggregator>,
}

impl GradeRecalculationHandler {
    pub fn new(aggregator: Arc<GradeAggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl EventHandler for GradeRecalculationHandler {
    fn name(&self) -> &'static str {
        "grade-recalculation"
    }

    async fn handle(&self, event: &AssessmentEvent) -> AssessmentResult<()> {
        let (user_id, course_id) = event.grade_key();
        self.aggregator.recalculate(user_id, course_id).await?;
        Ok(())
    }
}
