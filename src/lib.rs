pub mod cli;
pub mod config;
pub mod events;
pub mod history;
pub mod render;
pub mod runner;
pub mod sources;
pub mod telemetry;
pub mod tui;
pub mod ui;
