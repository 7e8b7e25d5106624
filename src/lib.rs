//! # Futarchy SDK
//!
//! Client library that assembles transactions for conditional-market futarchy: proposals whose
//! outcome is decided by trading per-outcome conditional markets.
//!
//! A trade is a single transaction that splits a spot deposit into per-outcome conditional
//! balances, swaps inside any subset of the outcome markets and settles the result. See
//! [`orchestrator`] for the pipeline and [`escrow`] for the per-outcome custody primitive.

pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod metrics;
pub mod orchestrator;
pub mod rpc;
pub mod serde;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod upstream;
