//! Integration test modules for vario
//!
//! Test categories:
//! - pipeline: end-to-end mutation runs and error propagation
//! - files: MIDI input and output around the pipeline
//! - concurrency: one pipeline shared across threads

pub mod concurrency;
pub mod files;
pub mod pipeline;
