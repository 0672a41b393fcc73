//! sysdeck: an operator console for host telemetry, processes, services,
//! packages and logs. The binary drives `app::App`; the agent crate reuses
//! `providers` and `report`.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod ops;
pub mod providers;
pub mod report;
pub mod state;
pub mod types;
pub mod ui;
pub mod views;
