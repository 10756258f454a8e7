// src/lib.rs

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use error::{AssessmentError, AssessmentResult};
pub use state::AppState;
