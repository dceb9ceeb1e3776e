//! Exchange value types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::chain::{Category, ChainError, WalletTransaction};
use crate::config::{AssetPolicyConfig, RvnPolicyConfig};

/// What moved in a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Rvn,
    Asset,
    Fee,
}

/// Which way it moved, from the wallet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    /// `None` for categories that are neither send nor receive.
    pub fn from_category(category: Category) -> Option<Self> {
        match category {
            Category::Send => Some(Direction::Send),
            Category::Receive => Some(Direction::Receive),
            Category::Other => None,
        }
    }
}

/// Kind and direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionClassification {
    pub kind: TransactionKind,
    /// Always `None` for `Fee`.
    pub direction: Option<Direction>,
}

impl TransactionClassification {
    pub fn is_receive(&self) -> bool {
        self.direction == Some(Direction::Receive)
    }
}

impl fmt::Display for TransactionClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TransactionKind::Rvn => "rvn",
            TransactionKind::Asset => "asset",
            TransactionKind::Fee => "fee",
        };
        match self.direction {
            Some(Direction::Send) => write!(f, "{}/send", kind),
            Some(Direction::Receive) => write!(f, "{}/receive", kind),
            None => write!(f, "{}", kind),
        }
    }
}

/// Incoming asset filter: `*` accepts any asset, anything else must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPattern {
    Any,
    Exact(String),
}

impl AssetPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            AssetPattern::Any
        } else {
            AssetPattern::Exact(pattern.to_string())
        }
    }

    /// An empty asset name never matches, not even `*`.
    pub fn matches(&self, asset_name: &str) -> bool {
        match self {
            AssetPattern::Any => !asset_name.is_empty(),
            AssetPattern::Exact(expected) => expected == asset_name,
        }
    }
}

impl fmt::Display for AssetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetPattern::Any => f.write_str("*"),
            AssetPattern::Exact(name) => f.write_str(name),
        }
    }
}

/// Rules for answering an RVN payment with an asset transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct RvnExchangePolicy {
    pub receive_address: String,
    pub asset_to_send: String,
    pub multiplier: Option<u64>,
    pub min_confirmations: u32,
}

impl From<&RvnPolicyConfig> for RvnExchangePolicy {
    fn from(config: &RvnPolicyConfig) -> Self {
        Self {
            receive_address: config.listen_address.clone(),
            asset_to_send: config.asset_to_send.clone(),
            multiplier: config.multiplier,
            min_confirmations: config.min_confirmations,
        }
    }
}

/// Rules for answering an asset payment with another asset transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetExchangePolicy {
    pub receive_address: String,
    pub expected_incoming_asset: AssetPattern,
    pub asset_to_send: String,
    pub multiplier: Option<u64>,
    pub min_confirmations: u32,
}

impl From<&AssetPolicyConfig> for AssetExchangePolicy {
    fn from(config: &AssetPolicyConfig) -> Self {
        Self {
            receive_address: config.listen_address.clone(),
            expected_incoming_asset: AssetPattern::parse(&config.expected_incoming_asset),
            asset_to_send: config.asset_to_send.clone(),
            multiplier: config.multiplier,
            min_confirmations: config.min_confirmations,
        }
    }
}

/// The fields of a wallet transaction a policy looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingTransfer {
    pub category: Category,
    pub receive_address: Option<String>,
    pub amount: f64,
    /// Set for asset transfers only.
    pub asset_name: Option<String>,
    pub confirmations: i64,
}

impl IncomingTransfer {
    /// RVN view: first `details` entry, top-level amount.
    pub fn rvn(tx: &WalletTransaction) -> Option<Self> {
        let detail = tx.details.first()?;
        Some(Self {
            category: detail.category,
            receive_address: detail.address.clone(),
            amount: tx.amount,
            asset_name: None,
            confirmations: tx.confirmations,
        })
    }

    /// Asset view: first `asset_details` entry.
    pub fn asset(tx: &WalletTransaction) -> Option<Self> {
        let detail = tx.asset_details.first()?;
        Some(Self {
            category: detail.category,
            receive_address: Some(detail.destination.clone()),
            amount: detail.amount,
            asset_name: Some(detail.asset_name.clone()),
            confirmations: tx.confirmations,
        })
    }
}

/// One failed eligibility predicate with the values that failed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "predicate", rename_all = "snake_case")]
pub enum UnmetPredicate {
    CategoryNotReceive { actual: Category },
    AddressMismatch { expected: String, actual: Option<String> },
    AmountBelowMinimum { final_amount: i64 },
    InsufficientConfirmations { actual: i64, required: u32 },
    AssetMismatch { expected: String, actual: Option<String> },
}

impl fmt::Display for UnmetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmetPredicate::CategoryNotReceive { actual } => {
                write!(f, "category is {:?}, expected receive", actual)
            }
            UnmetPredicate::AddressMismatch { expected, actual } => write!(
                f,
                "received on {}, expected {}",
                actual.as_deref().unwrap_or("<none>"),
                expected
            ),
            UnmetPredicate::AmountBelowMinimum { final_amount } => {
                write!(f, "final amount {} is below 1", final_amount)
            }
            UnmetPredicate::InsufficientConfirmations { actual, required } => {
                write!(f, "{} confirmations, {} required", actual, required)
            }
            UnmetPredicate::AssetMismatch { expected, actual } => write!(
                f,
                "received asset {}, expected {}",
                actual.as_deref().unwrap_or("<none>"),
                expected
            ),
        }
    }
}

/// Outcome of evaluating a policy against an incoming transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeDecision {
    pub eligible: bool,
    pub reason: String,
    /// `floor(amount)`.
    pub final_amount: i64,
    pub quantity_to_send: u64,
    pub unmet: Vec<UnmetPredicate>,
}

/// Successful exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    /// The incoming transaction.
    pub txid: String,
    pub asset: String,
    pub quantity: u64,
    pub recipient: String,
    pub confirmations: i64,
    /// Transactions created by the transfer.
    pub dispatched_txids: Vec<String>,
}

/// Why the sender of a transaction could not be traced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolutionError {
    /// The transaction has no inputs.
    #[error("Transaction {txid} has no inputs")]
    NoInputs { txid: String },

    /// The first input spends no previous output.
    #[error("Transaction {txid} is funded by a coinbase input")]
    CoinbaseInput { txid: String },

    /// The funding transaction is unknown to the node (pruned or unindexed).
    #[error("Previous transaction {prev_txid} not found")]
    PreviousTransactionNotFound { prev_txid: String },

    /// The funding transaction has no output with the spent index.
    #[error("Output {vout} missing from previous transaction {prev_txid}")]
    OutputMissing { prev_txid: String, vout: u32 },

    /// The spent output lists no address.
    #[error("Output {vout} of previous transaction {prev_txid} has no address")]
    NoAddresses { prev_txid: String, vout: u32 },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Terminal failure of one exchange attempt.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Lookup or balance query failed before anything was sent.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The wallet record has no entry for the policy's side (likely a fee transaction).
    #[error("Transaction has no {side} details")]
    NoDetails { side: &'static str },

    #[error("Insufficient {asset} balance: have {balance}, need {required}")]
    InsufficientAssetBalance {
        asset: String,
        balance: f64,
        required: u64,
    },

    #[error("Eligibility not met: {}", join_unmet(.unmet))]
    EligibilityNotMet { unmet: Vec<UnmetPredicate> },

    #[error("Sender unresolved: {0}")]
    SenderUnresolved(#[from] ResolutionError),

    #[error("Sender address {address} failed node validation")]
    InvalidSenderAddress { address: String },

    /// The transfer call itself failed; it may have reached the node.
    #[error("Transfer dispatch failed: {source}")]
    Dispatch { source: ChainError },

    #[error("Transaction {txid} was already processed")]
    AlreadyProcessed { txid: String },

    /// The transfer went out but its ledger record could not be saved.
    #[error("Transfer for {} dispatched but not recorded: {}", .receipt.txid, .message)]
    LedgerWrite {
        receipt: Box<ExchangeReceipt>,
        message: String,
    },
}

impl ExchangeError {
    /// True unless a transfer was attempted.
    pub fn nothing_sent(&self) -> bool {
        !matches!(
            self,
            ExchangeError::Dispatch { .. } | ExchangeError::LedgerWrite { .. }
        )
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::Chain(_) => "chain_error",
            ExchangeError::NoDetails { .. } => "no_details",
            ExchangeError::InsufficientAssetBalance { .. } => "insufficient_balance",
            ExchangeError::EligibilityNotMet { .. } => "ineligible",
            ExchangeError::SenderUnresolved(_) => "sender_unresolved",
            ExchangeError::InvalidSenderAddress { .. } => "invalid_sender",
            ExchangeError::Dispatch { .. } => "dispatch_failed",
            ExchangeError::AlreadyProcessed { .. } => "already_processed",
            ExchangeError::LedgerWrite { .. } => "ledger_write_failed",
        }
    }
}

fn join_unmet(unmet: &[UnmetPredicate]) -> String {
    unmet
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_pattern() {
        let any = AssetPattern::parse("*");
        assert!(any.matches("SILVER"));
        assert!(any.matches("GOLD/COIN"));
        assert!(!any.matches(""));

        let gold = AssetPattern::parse("GOLD");
        assert!(gold.matches("GOLD"));
        assert!(!gold.matches("SILVER"));
        assert!(!gold.matches("GOLDEN"));
        assert_eq!(gold.to_string(), "GOLD");
    }

    #[test]
    fn test_classification_display() {
        let c = TransactionClassification {
            kind: TransactionKind::Asset,
            direction: Some(Direction::Receive),
        };
        assert_eq!(c.to_string(), "asset/receive");
        assert!(c.is_receive());

        let fee = TransactionClassification {
            kind: TransactionKind::Fee,
            direction: None,
        };
        assert_eq!(fee.to_string(), "fee");
    }

    #[test]
    fn test_nothing_sent() {
        let err = ExchangeError::EligibilityNotMet { unmet: vec![] };
        assert!(err.nothing_sent());

        let err = ExchangeError::Dispatch {
            source: ChainError::NotFound("transfer".into()),
        };
        assert!(!err.nothing_sent());

        let err = ExchangeError::LedgerWrite {
            receipt: Box::new(ExchangeReceipt {
                txid: "t1".into(),
                asset: "ASSETX".into(),
                quantity: 50,
                recipient: "Sender".into(),
                confirmations: 3,
                dispatched_txids: vec!["d1".into()],
            }),
            message: "No such file or directory".into(),
        };
        assert!(!err.nothing_sent());
        assert_eq!(err.kind(), "ledger_write_failed");
        assert!(err.to_string().contains("t1"));
    }

    #[test]
    fn test_eligibility_message_lists_all() {
        let err = ExchangeError::EligibilityNotMet {
            unmet: vec![
                UnmetPredicate::AddressMismatch {
                    expected: "RcvAddr".into(),
                    actual: Some("Other".into()),
                },
                UnmetPredicate::InsufficientConfirmations {
                    actual: 0,
                    required: 1,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("received on Other, expected RcvAddr"));
        assert!(msg.contains("0 confirmations, 1 required"));
    }

    #[test]
    fn test_policy_from_config() {
        let config = AssetPolicyConfig {
            listen_address: "AssetAddr".into(),
            expected_incoming_asset: "*".into(),
            asset_to_send: "GOLD".into(),
            multiplier: Some(5),
            min_confirmations: 2,
        };
        let policy = AssetExchangePolicy::from(&config);
        assert_eq!(policy.expected_incoming_asset, AssetPattern::Any);
        assert_eq!(policy.receive_address, "AssetAddr");
        assert_eq!(policy.min_confirmations, 2);
    }
}
