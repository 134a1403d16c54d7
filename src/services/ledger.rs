//! Durable purchase ledger.
//!
//! Completed purchases confirmed by webhook are appended to a JSON-lines
//! file so entitlements stay queryable independently of client polling.
//! Appends are serialized behind an async mutex; reads scan the file.

use crate::models::PurchaseRecord;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct PurchaseLedger {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl PurchaseLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a purchase record to the ledger.
    pub async fn record(&self, record: &PurchaseRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_ref())
            .await
            .with_context(|| format!("failed to open ledger at {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(
            tx_ref = %record.tx_ref,
            product_id = %record.product_id,
            "Purchase recorded"
        );
        Ok(())
    }

    /// Look up the most recent record for a transaction reference.
    ///
    /// A missing ledger file means no purchases have been recorded yet.
    pub async fn find(&self, tx_ref: &str) -> Result<Option<PurchaseRecord>> {
        let raw = match tokio::fs::read_to_string(self.path.as_ref()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read ledger at {}", self.path.display())
                })
            }
        };

        let mut found = None;
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            let record: PurchaseRecord = serde_json::from_str(line)
                .with_context(|| format!("corrupt ledger line in {}", self.path.display()))?;
            if record.tx_ref == tx_ref {
                found = Some(record);
            }
        }
        Ok(found)
    }
}
