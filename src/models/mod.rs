// src/models/mod.rs

pub mod answer;
pub mod attempt;
pub mod course;
pub mod grade;
pub mod question;
pub mod quiz;
