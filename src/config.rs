// src/config.rs

use std::env;

use dotenvy::dotenv;
use thiserror::Error;
use validator::Validate;

use crate::models::grade::GradeWeights;

pub const DEFAULT_QUIZ_WEIGHT: i32 = 40;
pub const DEFAULT_ASSIGNMENT_WEIGHT: i32 = 50;
pub const DEFAULT_PARTICIPATION_WEIGHT: i32 = 10;

/// Capacity of the post-submit event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub max_connections: u32,
    pub log_dir: String,
    /// Weights given to newly created grade rows.
    pub default_weights: GradeWeights,
    /// Restricts the backfill binary to one course.
    pub backfill_course_id: Option<i64>,
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    parse_value(name, env::var(name).ok())
}

fn parse_value<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let max_connections = parsed("DB_MAX_CONNECTIONS")?.unwrap_or(5);

        let default_weights = GradeWeights {
            quiz: parsed("GRADE_WEIGHT_QUIZ")?.unwrap_or(DEFAULT_QUIZ_WEIGHT),
            assignment: parsed("GRADE_WEIGHT_ASSIGNMENT")?.unwrap_or(DEFAULT_ASSIGNMENT_WEIGHT),
            participation: parsed("GRADE_WEIGHT_PARTICIPATION")?
                .unwrap_or(DEFAULT_PARTICIPATION_WEIGHT),
        };
        if default_weights.validate().is_err() {
            return Err(ConfigError::Invalid {
                name: "GRADE_WEIGHT_*",
                value: format!(
                    "{}/{}/{}",
                    default_weights.quiz, default_weights.assignment, default_weights.participation
                ),
            });
        }

        let backfill_course_id = parsed("BACKFILL_COURSE_ID")?;

        Ok(Self {
            database_url,
            rust_log,
            max_connections,
            log_dir,
            default_weights,
            backfill_course_id,
        })
    }

    /// Configuration for embedding the engine without environment lookups.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            rust_log: "info".to_string(),
            max_connections: 5,
            log_dir: "logs".to_string(),
            default_weights: GradeWeights::default(),
            backfill_course_id: None,
        }
    }
}
