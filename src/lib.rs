pub mod aggregate;
pub mod benchmark_utils;
pub mod charts;
pub mod config;
pub mod deck;
pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod stream_plan;
