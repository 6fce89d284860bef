//! Retail-competition impact core.
//!
//! Allocates the purchasing power of settlement cells to markets with a
//! Huff-style gravity model, once without ("status quo") and once with
//! ("planned") a proposed development, and stores the resulting flows.

pub mod aggregate;
pub mod attributes;
pub mod clustering;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod event;
pub mod gravity;
pub mod matrix;
pub mod model;
pub mod progress;
pub mod scenario;
pub mod store;
pub mod types;
