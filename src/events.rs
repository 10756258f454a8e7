// src/events.rs

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::EVENT_CHANNEL_CAPACITY;

/// Emitted after the owning transaction has committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentEvent {
    AttemptSubmitted {
        user_id: i64,
        course_id: i64,
        quiz_id: i64,
        attempt_id: i64,
        correct_count: i32,
        percentage: f64,
        over_time_limit: bool,
    },
    /// Published by the submission subsystem once a score is available.
    AssignmentGraded {
        user_id: i64,
        course_id: i64,
        assignment_id: i64,
    },
    /// Published by the lesson completion tracker.
    LessonCompleted {
        user_id: i64,
        course_id: i64,
        lesson_id: i64,
    },
}

impl AssessmentEvent {
    /// The (user, course) grade this event affects.
    pub fn grade_key(&self) -> (i64, i64) {
        match *self {
            AssessmentEvent::AttemptSubmitted {
                user_id, course_id, ..
            }
            | AssessmentEvent::AssignmentGraded {
                user_id, course_id, ..
            }
            | AssessmentEvent::LessonCompleted {
                user_id, course_id, ..
            } => (user_id, course_id),
        }
    }
}

/// Fan-out channel between the engine and its downstream handlers.
///
/// Publishing never fails the publisher; a bus without subscribers drops events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AssessmentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: AssessmentEvent) {
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!("Event delivered to {} subscribers", receivers),
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!("No subscribers for event {:?}", event)
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssessmentEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        bus.publish(AssessmentEvent::LessonCompleted {
            user_id: 1,
            course_id: 2,
            lesson_id: 3,
        });
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let event = AssessmentEvent::AssignmentGraded {
            user_id: 1,
            course_id: 2,
            assignment_id: 3,
        };
        bus.publish(event.clone());
        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
        assert_eq!(received.grade_key(), (1, 2));
    }
}
