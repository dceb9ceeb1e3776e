//! Exchange engine.
//!
//! # Flow
//! ```text
//! gettransaction → IncomingTransfer
//!     → evaluate (floor, multiplier, predicates; pure)
//!     → listmyassets (balance >= quantity)
//!     → eligibility verdict
//!     → SenderResolver
//!     → validateaddress
//!     → transfer
//! ```
//!
//! Every step is a possible exit; nothing is retried. Only the final
//! `transfer` can fail after something may have been sent, and that failure
//! is the only one reported as `ExchangeError::Dispatch`.

use std::sync::Arc;
use std::time::Instant;

use crate::chain::{Category, ChainReader};
use crate::exchange::resolver::SenderResolver;
use crate::exchange::types::{
    AssetExchangePolicy, AssetPattern, ExchangeDecision, ExchangeError, ExchangeReceipt,
    IncomingTransfer, RvnExchangePolicy, UnmetPredicate,
};
use crate::observability::metrics;

/// Evaluate the RVN-for-Asset policy against an incoming transfer.
pub fn evaluate_rvn(transfer: &IncomingTransfer, policy: &RvnExchangePolicy) -> ExchangeDecision {
    evaluate(
        transfer,
        &policy.receive_address,
        policy.multiplier,
        policy.min_confirmations,
        None,
    )
}

/// Evaluate the Asset-for-Asset policy against an incoming transfer.
pub fn evaluate_asset(transfer: &IncomingTransfer, policy: &AssetExchangePolicy) -> ExchangeDecision {
    evaluate(
        transfer,
        &policy.receive_address,
        policy.multiplier,
        policy.min_confirmations,
        Some(&policy.expected_incoming_asset),
    )
}

/// Quantity owed for `final_amount`. Negative amounts give 0.
pub fn quantity_for(final_amount: i64, multiplier: Option<u64>) -> u64 {
    let base = u64::try_from(final_amount).unwrap_or(0);
    match multiplier {
        Some(m) if m > 1 => base.saturating_mul(m),
        _ => base,
    }
}

fn evaluate(
    transfer: &IncomingTransfer,
    receive_address: &str,
    multiplier: Option<u64>,
    min_confirmations: u32,
    expected_asset: Option<&AssetPattern>,
) -> ExchangeDecision {
    // `as` saturates and maps NaN to 0.
    let final_amount = transfer.amount.floor() as i64;
    let quantity_to_send = quantity_for(final_amount, multiplier);

    let mut unmet = Vec::new();
    if transfer.category != Category::Receive {
        unmet.push(UnmetPredicate::CategoryNotReceive {
            actual: transfer.category,
        });
    }
    if transfer.receive_address.as_deref() != Some(receive_address) {
        unmet.push(UnmetPredicate::AddressMismatch {
            expected: receive_address.to_string(),
            actual: transfer.receive_address.clone(),
        });
    }
    if final_amount < 1 {
        unmet.push(UnmetPredicate::AmountBelowMinimum { final_amount });
    }
    if transfer.confirmations < i64::from(min_confirmations) {
        unmet.push(UnmetPredicate::InsufficientConfirmations {
            actual: transfer.confirmations,
            required: min_confirmations,
        });
    }
    if let Some(pattern) = expected_asset {
        let matched = transfer
            .asset_name
            .as_deref()
            .is_some_and(|name| pattern.matches(name));
        if !matched {
            unmet.push(UnmetPredicate::AssetMismatch {
                expected: pattern.to_string(),
                actual: transfer.asset_name.clone(),
            });
        }
    }

    let eligible = unmet.is_empty();
    let reason = if eligible {
        format!("eligible for {} units", quantity_to_send)
    } else {
        unmet
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    };

    ExchangeDecision {
        eligible,
        reason,
        final_amount,
        quantity_to_send,
        unmet,
    }
}

/// Runs exchange policies against the node.
#[derive(Clone)]
pub struct ExchangeEngine {
    reader: Arc<dyn ChainReader>,
    resolver: Arc<dyn SenderResolver>,
}

impl ExchangeEngine {
    pub fn new(reader: Arc<dyn ChainReader>, resolver: Arc<dyn SenderResolver>) -> Self {
        Self { reader, resolver }
    }

    /// Answer an RVN payment with `policy.asset_to_send`.
    pub async fn exchange_rvn_for_asset(
        &self,
        txid: &str,
        policy: &RvnExchangePolicy,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let start = Instant::now();
        let result = self.run_rvn(txid, policy).await;
        metrics::record_exchange_outcome("rvn", outcome_label(&result), start);
        result
    }

    /// Answer an asset payment with `policy.asset_to_send`.
    pub async fn exchange_asset_for_asset(
        &self,
        txid: &str,
        policy: &AssetExchangePolicy,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let start = Instant::now();
        let result = self.run_asset(txid, policy).await;
        metrics::record_exchange_outcome("asset", outcome_label(&result), start);
        result
    }

    async fn run_rvn(
        &self,
        txid: &str,
        policy: &RvnExchangePolicy,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let tx = self.reader.get_wallet_transaction(txid).await?;
        let transfer = IncomingTransfer::rvn(&tx).ok_or(ExchangeError::NoDetails { side: "rvn" })?;
        tracing::debug!(txid = %txid, policy = "rvn", "Classified");
        let decision = evaluate_rvn(&transfer, policy);
        self.settle(txid, &transfer, decision, &policy.asset_to_send).await
    }

    async fn run_asset(
        &self,
        txid: &str,
        policy: &AssetExchangePolicy,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let tx = self.reader.get_wallet_transaction(txid).await?;
        let transfer =
            IncomingTransfer::asset(&tx).ok_or(ExchangeError::NoDetails { side: "asset" })?;
        tracing::debug!(txid = %txid, policy = "asset", "Classified");
        let decision = evaluate_asset(&transfer, policy);
        self.settle(txid, &transfer, decision, &policy.asset_to_send).await
    }

    /// Balance check, verdict, sender resolution, validation and dispatch.
    async fn settle(
        &self,
        txid: &str,
        transfer: &IncomingTransfer,
        decision: ExchangeDecision,
        asset_to_send: &str,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let quantity = decision.quantity_to_send;
        tracing::debug!(
            txid = %txid,
            amount = transfer.amount,
            final_amount = decision.final_amount,
            quantity = quantity,
            "Quantity computed"
        );

        let balance = self.reader.list_my_asset_balance(asset_to_send).await?;
        if balance < quantity as f64 {
            tracing::warn!(
                txid = %txid,
                asset = %asset_to_send,
                balance,
                required = quantity,
                "Insufficient asset balance"
            );
            return Err(ExchangeError::InsufficientAssetBalance {
                asset: asset_to_send.to_string(),
                balance,
                required: quantity,
            });
        }

        if !decision.eligible {
            tracing::info!(txid = %txid, reason = %decision.reason, "Rejected");
            return Err(ExchangeError::EligibilityNotMet {
                unmet: decision.unmet,
            });
        }
        tracing::debug!(txid = %txid, "Eligibility checked");

        let sender = self.resolver.resolve_sender(txid).await?;
        tracing::debug!(txid = %txid, sender = %sender, "Sender resolved");

        let validation = self.reader.validate_address(&sender).await?;
        if !validation.isvalid {
            return Err(ExchangeError::InvalidSenderAddress { address: sender });
        }
        tracing::debug!(txid = %txid, sender = %sender, "Address validated");

        let dispatched_txids = self
            .reader
            .transfer_asset(asset_to_send, quantity, &sender)
            .await
            .map_err(|source| ExchangeError::Dispatch { source })?;

        tracing::info!(
            txid = %txid,
            asset = %asset_to_send,
            quantity = quantity,
            recipient = %sender,
            dispatched = ?dispatched_txids,
            "Dispatched"
        );

        Ok(ExchangeReceipt {
            txid: txid.to_string(),
            asset: asset_to_send.to_string(),
            quantity,
            recipient: sender,
            confirmations: transfer.confirmations,
            dispatched_txids,
        })
    }
}

fn outcome_label(result: &Result<ExchangeReceipt, ExchangeError>) -> &'static str {
    match result {
        Ok(_) => "dispatched",
        Err(e) => e.kind(),
    }
}
