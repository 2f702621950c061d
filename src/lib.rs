//! Core library for the wbtc-swap project.
//!
//! Two linked amount fields (WBTC and BTC) kept in sync through a fixed
//! conversion fee, and the submission flow that turns them into a swap
//! request for an external execution service.

pub mod amount;
pub mod assets;
pub mod config;
pub mod controller;
pub mod errors;
pub mod local;
pub mod lookup;
pub mod models;
pub mod session;
pub mod submission;
pub mod utils;
pub mod wallet;
