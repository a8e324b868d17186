//! Core library for the wrap-swap-runner project.
//!
//! For each configured wallet: wrap native currency, quote the wrapped token
//! against a stable token, approve the router and swap, retrying failed
//! transactions until they land.

pub mod config;
pub mod dex;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod runner;
pub mod utils;
