//! Exchange ledger: txid → dispatch record, with JSON persistence.
//!
//! A txid is claimed before the engine runs and recorded once the engine
//! returns. Only settled entries (dispatched or failed) are written to disk;
//! a claim lost to a crash is not persisted.
//!
//! Several hook processes may share one file. Saves hold an exclusive lock on
//! a sibling `.lock` file, re-read the ledger under it and merge, so one
//! process never drops another's records.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LedgerConfig;
use crate::exchange::types::ExchangeReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Claimed by a running handler.
    Pending,
    Dispatched,
    /// The transfer call failed after being issued. Never retried automatically.
    DispatchFailed,
}

/// What the ledger knows about one incoming transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub status: LedgerStatus,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub dispatched_txids: Vec<String>,
    /// Seconds since epoch.
    pub recorded_at: u64,
}

impl LedgerEntry {
    fn pending() -> Self {
        Self {
            status: LedgerStatus::Pending,
            asset: None,
            quantity: None,
            recipient: None,
            dispatched_txids: Vec::new(),
            recorded_at: now(),
        }
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub dispatched: usize,
    pub pending: usize,
    pub failed: usize,
}

/// A thread-safe ledger of processed transactions.
#[derive(Clone, Default)]
pub struct ExchangeLedger {
    inner: Arc<DashMap<String, LedgerEntry>>,
    persistence_path: Option<PathBuf>,
}

impl ExchangeLedger {
    /// Create an empty ledger. Without a path it only deduplicates in-process.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Ledger for `config`: loaded from disk when a path is set, in-memory otherwise.
    pub fn open(config: &LedgerConfig) -> io::Result<Self> {
        match &config.path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::new(None)),
        }
    }

    /// Load from `path` if it exists; later saves go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let ledger = Self::new(Some(path.to_path_buf()));
        for (txid, entry) in read_entries(path)? {
            ledger.inner.insert(txid, entry);
        }
        tracing::debug!(
            path = %path.display(),
            entries = ledger.inner.len(),
            "Loaded exchange ledger"
        );
        Ok(ledger)
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence_path.as_deref()
    }

    /// Merge settled entries into the persistence file, if any.
    ///
    /// Entries another process saved since this ledger was loaded are kept on
    /// disk and copied into memory. For a txid both sides hold, this ledger's
    /// settled entry wins.
    pub fn save_to_file(&self) -> io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path.with_extension("lock"))?;
        lock.lock_exclusive()?;
        let result = self.merge_into(path);
        FileExt::unlock(&lock)?;
        result
    }

    /// Must be called with the ledger lock held.
    fn merge_into(&self, path: &Path) -> io::Result<()> {
        let mut map = read_entries(path)?;
        for r in self.inner.iter() {
            if r.value().status != LedgerStatus::Pending {
                map.insert(r.key().clone(), r.value().clone());
            }
        }
        for (txid, entry) in &map {
            self.inner
                .entry(txid.clone())
                .or_insert_with(|| entry.clone());
        }

        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, &map)?;
        }
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), entries = map.len(), "Saved exchange ledger");
        Ok(())
    }

    /// Claim `txid` for processing. Only one caller ever wins a given txid.
    pub fn try_claim(&self, txid: &str) -> bool {
        match self.inner.entry(txid.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(LedgerEntry::pending());
                true
            }
        }
    }

    pub fn record_dispatched(&self, receipt: &ExchangeReceipt) {
        self.inner.insert(
            receipt.txid.clone(),
            LedgerEntry {
                status: LedgerStatus::Dispatched,
                asset: Some(receipt.asset.clone()),
                quantity: Some(receipt.quantity),
                recipient: Some(receipt.recipient.clone()),
                dispatched_txids: receipt.dispatched_txids.clone(),
                recorded_at: now(),
            },
        );
    }

    pub fn record_dispatch_failed(&self, txid: &str) {
        let mut entry = LedgerEntry::pending();
        entry.status = LedgerStatus::DispatchFailed;
        self.inner.insert(txid.to_string(), entry);
    }

    /// Drop a pending claim so the txid can be processed again.
    pub fn release(&self, txid: &str) {
        self.inner
            .remove_if(txid, |_, entry| entry.status == LedgerStatus::Pending);
    }

    pub fn get(&self, txid: &str) -> Option<LedgerEntry> {
        self.inner.get(txid).map(|r| r.value().clone())
    }

    pub fn contains(&self, txid: &str) -> bool {
        self.inner.contains_key(txid)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for r in self.inner.iter() {
            match r.value().status {
                LedgerStatus::Dispatched => summary.dispatched += 1,
                LedgerStatus::Pending => summary.pending += 1,
                LedgerStatus::DispatchFailed => summary.failed += 1,
            }
        }
        summary
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> Vec<(String, LedgerEntry)> {
        let mut entries: Vec<_> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| b.1.recorded_at.cmp(&a.1.recorded_at).then(a.0.cmp(&b.0)));
        entries
    }
}

/// Entries persisted at `path`; a missing file is an empty ledger.
fn read_entries(path: &Path) -> io::Result<HashMap<String, LedgerEntry>> {
    match File::open(path) {
        Ok(file) => Ok(serde_json::from_reader(BufReader::new(file))?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e),
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
