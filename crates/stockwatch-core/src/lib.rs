//! Stockwatch Core - Domain models, configuration, and ports
//!
//! This crate contains the shared domain types and port definitions for the
//! stockout detection pipeline: filename timestamp policy, layered
//! configuration, the detector and forwarder ports, and atomic filesystem
//! helpers used by every stage that hands files to another stage.

pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod naming;
pub mod ports;

pub use error::{Result, StockwatchError};
