//! TaskPilot API: library crate for the task REST server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `tp-e2e-tests`) can build the router around their own
//! `ProviderManager`.

pub mod config;
pub mod error;
pub mod intent;
pub mod routes;
pub mod state;
pub mod store;
