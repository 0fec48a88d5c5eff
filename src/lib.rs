// idswatch library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod analysis;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod poller;
pub mod utils;
pub mod watch;
