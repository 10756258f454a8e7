// src/utils/mod.rs

pub mod math;
pub mod selection;
