// posguard library crate
// Exposes the detection engine and its surroundings for the binary and tests

pub mod alerts;
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod output;
pub mod parser;
pub mod utils;
