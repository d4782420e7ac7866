//! Harvests new-home community listings from rendered pages into normalized records.

pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod store;

pub use errors::{Diagnostic, DiagnosticSink, ScraperError, TracingSink};

#[cfg(test)]
mod tests;
