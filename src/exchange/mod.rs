//! Incoming-transaction exchange core.
//!
//! # Data Flow
//! ```text
//! txid
//!     → handler.rs (ledger dedup, routing)
//!     → classifier.rs (Rvn | Asset | Fee, direction)
//!     → engine.rs (eligibility, balance, dispatch)
//!         → resolver.rs (sender backtrace)
//!     → ledger.rs (txid → dispatched result, JSON file)
//! ```
//!
//! # Design Decisions
//! - The engine receives its chain reader and sender resolver at construction
//! - Node-reported confirmations and categories are trusted as-is
//! - No step is retried; a dispatch failure is recorded, never replayed

pub mod classifier;
pub mod engine;
pub mod handler;
pub mod ledger;
pub mod resolver;
pub mod types;

pub use classifier::{classify_record, Classifier};
pub use engine::{evaluate_asset, evaluate_rvn, ExchangeEngine};
pub use handler::{HandleOutcome, IncomingHandler};
pub use ledger::{ExchangeLedger, LedgerEntry, LedgerStatus, LedgerSummary};
pub use resolver::{BacktraceResolver, SenderResolver};
pub use types::{
    AssetExchangePolicy, AssetPattern, Direction, ExchangeDecision, ExchangeError,
    ExchangeReceipt, IncomingTransfer, ResolutionError, RvnExchangePolicy,
    TransactionClassification, TransactionKind, UnmetPredicate,
};
