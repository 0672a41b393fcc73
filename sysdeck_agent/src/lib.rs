//! Headless HTTP agent: serves sysdeck provider snapshots and reports as JSON.

pub mod cli;
pub mod routes;
pub mod state;
