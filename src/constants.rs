//! SDK constants.

use crate::types::ObjectId;
use alloy_primitives::B256;

/// Module holding the outcome balance splitter.
pub const MODULE_SPLIT: &str = "conditional_split";

/// Module holding the batch swap sequencer and settlement.
pub const MODULE_SWAP_BATCH: &str = "swap_batch";

/// Module holding the balance wrapper (incomplete set) object.
pub const MODULE_BALANCE: &str = "conditional_balance";

/// Module holding outcome escrows.
pub const MODULE_ESCROW: &str = "outcome_escrow";

/// Module holding proposals.
pub const MODULE_PROPOSAL: &str = "proposal";

/// Module holding conditional AMM pools.
pub const MODULE_AMM: &str = "conditional_amm";

/// Move struct name of the balance wrapper.
pub const BALANCE_WRAPPER_STRUCT: &str = "ConditionalMarketBalance";

/// Move struct name of a proposal.
pub const PROPOSAL_STRUCT: &str = "Proposal";

/// Move struct name of a per-outcome conditional market.
pub const CONDITIONAL_MARKET_STRUCT: &str = "LiquidityPool";

/// Move struct name of an escrow receipt.
pub const ESCROW_RECEIPT_STRUCT: &str = "EscrowReceipt";

/// Current balance wrapper format version.
pub const BALANCE_WRAPPER_VERSION: u64 = 1;

/// The shared clock object.
pub const CLOCK_OBJECT_ID: ObjectId = ObjectId(B256::with_last_byte(6));

/// Initial shared version of the clock object.
pub const CLOCK_INITIAL_SHARED_VERSION: u64 = 1;

/// Most outcomes a proposal can have. Outcome indices are `u8`.
pub const MAX_OUTCOMES: u16 = 256;

/// Index of the baseline "reject" outcome.
pub const REJECT_OUTCOME: u8 = 0;

/// Default gas budget, in the ledger's smallest unit.
pub const DEFAULT_GAS_BUDGET: u64 = 50_000_000;

/// Default timeout for a single RPC request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default slippage tolerance applied when deriving minimum outputs, in basis points.
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Basis points in one unit.
pub const MAX_BPS: u64 = 10_000;

/// Module holding the market escrow of conditional tokens.
pub const MODULE_COIN_ESCROW: &str = "coin_escrow";

/// Move struct name of the market escrow.
pub const MARKET_ESCROW_STRUCT: &str = "TokenEscrow";

/// Move struct name of an outcome escrow.
pub const OUTCOME_ESCROW_STRUCT: &str = "OutcomeEscrow";
