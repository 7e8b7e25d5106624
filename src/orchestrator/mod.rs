//! Conditional trade orchestration.
//!
//! A trade runs `split -> deposit -> swap* -> settle` inside a single transaction:
//!
//! - [`SplitProgress`] turns a spot deposit into per-outcome conditional balances.
//! - [`ConditionalSwapBatch`] accumulates those balances and runs swaps against them.
//! - [`ConditionalSwapBatch::finalize`] recombines complete sets into spot and wraps the rest.
//!
//! [`ConditionalTrade`] wires the three together.

mod batch;
pub use batch::{ConditionalSwapBatch, SwapOutput, SwapRequest};

mod quote;
pub use quote::{OutcomeMarkets, QuoteError, QuoteTable, min_amount_out};

mod settlement;
pub use settlement::{RecombinedSet, Remainder, Settlement, SpotPayout};

mod split;
pub use split::{SplitAllocation, SplitProgress};

mod trade;
pub use trade::{ConditionalTrade, Funding, TradePlan};
