//! Sender address inference.
//!
//! The sender of a transaction is not recorded on chain. `BacktraceResolver`
//! follows the first input one hop back and takes the first address of the
//! output it spends. This is a heuristic: multi-input transactions, multisig
//! outputs and exchange hot wallets all defeat it. Failures are reported, a
//! fallback address is never guessed.

use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::{ChainError, ChainReader};
use crate::exchange::types::ResolutionError;

/// Infers the address that funded a transaction.
#[async_trait]
pub trait SenderResolver: Send + Sync {
    async fn resolve_sender(&self, txid: &str) -> Result<String, ResolutionError>;
}

/// Single-hop, first-address backtrace over decoded raw transactions.
#[derive(Clone)]
pub struct BacktraceResolver {
    reader: Arc<dyn ChainReader>,
}

impl BacktraceResolver {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl SenderResolver for BacktraceResolver {
    async fn resolve_sender(&self, txid: &str) -> Result<String, ResolutionError> {
        let tx = self.reader.get_public_transaction(txid).await?;

        let input = tx.vin.first().ok_or_else(|| ResolutionError::NoInputs {
            txid: txid.to_string(),
        })?;
        let (prev_txid, vout) = match (&input.txid, input.vout) {
            (Some(prev), Some(vout)) if input.coinbase.is_none() => (prev.clone(), vout),
            _ => {
                return Err(ResolutionError::CoinbaseInput {
                    txid: txid.to_string(),
                })
            }
        };

        let prev = match self.reader.get_public_transaction(&prev_txid).await {
            Ok(prev) => prev,
            Err(ChainError::NotFound(_)) => {
                return Err(ResolutionError::PreviousTransactionNotFound { prev_txid })
            }
            Err(e) => return Err(e.into()),
        };

        let output = prev.output(vout).ok_or_else(|| ResolutionError::OutputMissing {
            prev_txid: prev_txid.clone(),
            vout,
        })?;

        let addresses = &output.script_pub_key.addresses;
        let sender = addresses
            .first()
            .cloned()
            .ok_or_else(|| ResolutionError::NoAddresses {
                prev_txid: prev_txid.clone(),
                vout,
            })?;

        if addresses.len() > 1 {
            tracing::warn!(
                txid = %txid,
                prev_txid = %prev_txid,
                vout = vout,
                candidates = addresses.len(),
                "Spent output lists several addresses, using the first"
            );
        }

        tracing::debug!(txid = %txid, sender = %sender, "Sender resolved");
        Ok(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fake::{raw_tx, FakeChainReader};
    use crate::chain::TxInput;

    fn resolver(reader: FakeChainReader) -> BacktraceResolver {
        BacktraceResolver::new(Arc::new(reader))
    }

    #[tokio::test]
    async fn test_resolves_first_address_of_spent_output() {
        let reader = FakeChainReader::new()
            .with_raw_tx(raw_tx("t1", Some(("prev", 1)), &[&["RcvAddr"]]))
            .with_raw_tx(raw_tx("prev", None, &[&["Change"], &["Sender"]]));

        assert_eq!(resolver(reader).resolve_sender("t1").await.unwrap(), "Sender");
    }

    #[tokio::test]
    async fn test_multi_address_output_uses_first() {
        let reader = FakeChainReader::new()
            .with_raw_tx(raw_tx("t1", Some(("prev", 0)), &[&["RcvAddr"]]))
            .with_raw_tx(raw_tx("prev", None, &[&["First", "Second"]]));

        assert_eq!(resolver(reader).resolve_sender("t1").await.unwrap(), "First");
    }

    #[tokio::test]
    async fn test_no_inputs() {
        let reader = FakeChainReader::new().with_raw_tx(raw_tx("t1", None, &[&["RcvAddr"]]));
        let err = resolver(reader).resolve_sender("t1").await.unwrap_err();
        assert_eq!(err, ResolutionError::NoInputs { txid: "t1".into() });
    }

    #[tokio::test]
    async fn test_coinbase_input() {
        let mut tx = raw_tx("t1", None, &[&["Miner"]]);
        tx.vin.push(TxInput {
            coinbase: Some("03a0860100".into()),
            ..TxInput::default()
        });
        let reader = FakeChainReader::new().with_raw_tx(tx);

        let err = resolver(reader).resolve_sender("t1").await.unwrap_err();
        assert_eq!(err, ResolutionError::CoinbaseInput { txid: "t1".into() });
    }

    #[tokio::test]
    async fn test_previous_transaction_missing() {
        let reader =
            FakeChainReader::new().with_raw_tx(raw_tx("t1", Some(("pruned", 0)), &[&["RcvAddr"]]));
        let err = resolver(reader).resolve_sender("t1").await.unwrap_err();
        assert_eq!(
            err,
            ResolutionError::PreviousTransactionNotFound {
                prev_txid: "pruned".into()
            }
        );
    }

    #[tokio::test]
    async fn test_output_missing() {
        let reader = FakeChainReader::new()
            .with_raw_tx(raw_tx("t1", Some(("prev", 3)), &[&["RcvAddr"]]))
            .with_raw_tx(raw_tx("prev", None, &[&["Sender"]]));

        let err = resolver(reader).resolve_sender("t1").await.unwrap_err();
        assert_eq!(
            err,
            ResolutionError::OutputMissing {
                prev_txid: "prev".into(),
                vout: 3
            }
        );
    }

    #[tokio::test]
    async fn test_output_without_addresses() {
        let reader = FakeChainReader::new()
            .with_raw_tx(raw_tx("t1", Some(("prev", 0)), &[&["RcvAddr"]]))
            .with_raw_tx(raw_tx("prev", None, &[&[]]));

        let err = resolver(reader).resolve_sender("t1").await.unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NoAddresses {
                prev_txid: "prev".into(),
                vout: 0
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_chain_error() {
        let err = resolver(FakeChainReader::new())
            .resolve_sender("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Chain(ChainError::NotFound(_))));
    }
}
