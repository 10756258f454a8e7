// src/services/mod.rs

pub mod attempts;
pub mod evaluator;
pub mod grades;
pub mod scoring;

pub use attempts::{AttemptManager, SubmissionReceipt};
pub use grades::GradeAggregator;
pub use scoring::Scorecard;
