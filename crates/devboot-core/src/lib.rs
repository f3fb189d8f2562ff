pub mod config;
pub mod database;
pub mod envfile;
pub mod launcher;
pub mod orchestrator;
pub mod runner;
pub mod setup;
pub mod utils;
