//! Incoming transaction handler: what the wallet-notify hook runs per txid.
//!
//! # Flow
//! ```text
//! txid → ledger lookup (Duplicate)
//!      → classify → route by kind/direction (Skipped)
//!      → ledger claim → engine → ledger record → save
//! ```

use std::sync::Arc;

use crate::chain::ChainReader;
use crate::config::ExchangeConfig;
use crate::exchange::classifier::Classifier;
use crate::exchange::engine::ExchangeEngine;
use crate::exchange::ledger::{ExchangeLedger, LedgerStatus};
use crate::exchange::resolver::{BacktraceResolver, SenderResolver};
use crate::exchange::types::{
    AssetExchangePolicy, ExchangeError, ExchangeReceipt, RvnExchangePolicy,
    TransactionClassification, TransactionKind,
};

/// Result of handling one txid.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    /// A reciprocal transfer was sent.
    Exchanged(ExchangeReceipt),
    /// No policy applies to this kind of transaction.
    Skipped {
        classification: TransactionClassification,
    },
    /// The ledger already holds this txid.
    Duplicate { status: LedgerStatus },
}

/// Routes incoming transactions to the configured exchange policies.
pub struct IncomingHandler {
    classifier: Classifier,
    engine: ExchangeEngine,
    ledger: ExchangeLedger,
    rvn_policy: Option<RvnExchangePolicy>,
    asset_policy: Option<AssetExchangePolicy>,
}

impl IncomingHandler {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        resolver: Arc<dyn SenderResolver>,
        ledger: ExchangeLedger,
        rvn_policy: Option<RvnExchangePolicy>,
        asset_policy: Option<AssetExchangePolicy>,
    ) -> Self {
        Self {
            classifier: Classifier::new(reader.clone()),
            engine: ExchangeEngine::new(reader, resolver),
            ledger,
            rvn_policy,
            asset_policy,
        }
    }

    /// Handler with the backtrace resolver and the policies from `config`.
    pub fn from_config(
        reader: Arc<dyn ChainReader>,
        config: &ExchangeConfig,
        ledger: ExchangeLedger,
    ) -> Self {
        let resolver = Arc::new(BacktraceResolver::new(reader.clone()));
        Self::new(
            reader,
            resolver,
            ledger,
            config.rvn.as_ref().map(RvnExchangePolicy::from),
            config.asset.as_ref().map(AssetExchangePolicy::from),
        )
    }

    pub fn ledger(&self) -> &ExchangeLedger {
        &self.ledger
    }

    /// Process `txid` at most once.
    pub async fn handle(&self, txid: &str) -> Result<HandleOutcome, ExchangeError> {
        if let Some(entry) = self.ledger.get(txid) {
            tracing::info!(txid = %txid, status = ?entry.status, "Already in ledger");
            return Ok(HandleOutcome::Duplicate {
                status: entry.status,
            });
        }

        let classification = self.classifier.classify(txid).await?;
        if !classification.is_receive() {
            return Ok(self.skip(txid, classification));
        }

        let route = match (classification.kind, &self.rvn_policy, &self.asset_policy) {
            (TransactionKind::Rvn, Some(policy), _) => Route::Rvn(policy),
            (TransactionKind::Asset, _, Some(policy)) => Route::Asset(policy),
            _ => return Ok(self.skip(txid, classification)),
        };

        if !self.ledger.try_claim(txid) {
            return Err(ExchangeError::AlreadyProcessed {
                txid: txid.to_string(),
            });
        }

        let result = match route {
            Route::Rvn(policy) => self.engine.exchange_rvn_for_asset(txid, policy).await,
            Route::Asset(policy) => self.engine.exchange_asset_for_asset(txid, policy).await,
        };

        match result {
            Ok(receipt) => {
                self.ledger.record_dispatched(&receipt);
                if let Err(e) = self.ledger.save_to_file() {
                    tracing::error!(
                        txid = %txid,
                        error = %e,
                        recipient = %receipt.recipient,
                        quantity = receipt.quantity,
                        dispatched = ?receipt.dispatched_txids,
                        "Dispatched but failed to save exchange ledger"
                    );
                    return Err(ExchangeError::LedgerWrite {
                        receipt: Box::new(receipt),
                        message: e.to_string(),
                    });
                }
                Ok(HandleOutcome::Exchanged(receipt))
            }
            Err(e) if e.nothing_sent() => {
                self.ledger.release(txid);
                Err(e)
            }
            Err(e) => {
                self.ledger.record_dispatch_failed(txid);
                self.persist(txid);
                Err(e)
            }
        }
    }

    fn skip(&self, txid: &str, classification: TransactionClassification) -> HandleOutcome {
        tracing::info!(txid = %txid, classification = %classification, "No policy applies, skipping");
        HandleOutcome::Skipped { classification }
    }

    fn persist(&self, txid: &str) {
        if let Err(e) = self.ledger.save_to_file() {
            tracing::error!(txid = %txid, error = %e, "Failed to save exchange ledger");
        }
    }
}

enum Route<'a> {
    Rvn(&'a RvnExchangePolicy),
    Asset(&'a AssetExchangePolicy),
}
