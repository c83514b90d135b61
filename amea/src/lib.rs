pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod data;
pub mod report;
pub mod types;
