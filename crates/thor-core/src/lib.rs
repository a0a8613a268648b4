//! Load driver: bounded worker pool, per-unit timing and the report stream

pub mod driver;
pub mod report;
