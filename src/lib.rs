//! Client for the Damon HVAC project portfolio API.
//!
//! Read operations go through a persistent cache; write operations invalidate it.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod upload;
