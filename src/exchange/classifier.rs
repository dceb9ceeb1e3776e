//! Transaction classification.
//!
//! Rules, in order:
//! 1. `asset_details` non-empty and no fee → Asset
//! 2. `details` non-empty → Rvn
//! 3. otherwise → Fee
//!
//! The direction is taken from the first entry of the list that decided the
//! kind. A record with both lists empty and no fee is an internal transaction
//! and classifies as Fee.

use std::sync::Arc;

use crate::chain::{ChainReader, ChainResult, WalletTransaction};
use crate::exchange::types::{Direction, TransactionClassification, TransactionKind};

/// Classify a wallet record without touching the node.
pub fn classify_record(tx: &WalletTransaction) -> TransactionClassification {
    if let (Some(first), None) = (tx.asset_details.first(), tx.fee) {
        return TransactionClassification {
            kind: TransactionKind::Asset,
            direction: Direction::from_category(first.category),
        };
    }

    match tx.details.first() {
        Some(first) => TransactionClassification {
            kind: TransactionKind::Rvn,
            direction: Direction::from_category(first.category),
        },
        None => TransactionClassification {
            kind: TransactionKind::Fee,
            direction: None,
        },
    }
}

/// Fetches wallet records and classifies them.
#[derive(Clone)]
pub struct Classifier {
    reader: Arc<dyn ChainReader>,
}

impl Classifier {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }

    /// Classify `txid`. An unknown txid is `ChainError::NotFound`.
    pub async fn classify(&self, txid: &str) -> ChainResult<TransactionClassification> {
        let tx = self.reader.get_wallet_transaction(txid).await?;
        let classification = classify_record(&tx);
        tracing::debug!(txid = %txid, classification = %classification, "Transaction classified");
        Ok(classification)
    }
}
