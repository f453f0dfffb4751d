//! Collaborator seams: snapshot retrieval and order submission.
//!
//! Both traits return boxed futures so they can be used as trait objects.
//! Retrieval and submission live outside the engine; the engine itself
//! never performs I/O.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pmm_core::{AccountSnapshot, MarketSnapshot, OrderIntent, Price, RawOrder};
use pmm_mm::Ladder;
use pmm_risk::FlattenInstruction;

use crate::error::AppResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Market fields that do not depend on the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    pub oracle_price: Price,
    pub funding_rate: Decimal,
}

impl MarketData {
    /// Complete the snapshot with the book top for the mark price.
    pub fn with_book_top(self, best_bid: Option<Price>, best_ask: Option<Price>) -> MarketSnapshot {
        MarketSnapshot::from_book_top(self.oracle_price, self.funding_rate, best_bid, best_ask)
    }
}

/// Source of the three per-cycle snapshots.
pub trait SnapshotSource: Send + Sync {
    /// All resting orders for the market.
    fn fetch_orders(&self) -> BoxFuture<'_, AppResult<Vec<RawOrder>>>;

    /// The maker account.
    fn fetch_account(&self) -> BoxFuture<'_, AppResult<AccountSnapshot>>;

    /// Oracle price and funding rate.
    fn fetch_market(&self) -> BoxFuture<'_, AppResult<MarketData>>;
}

/// Sink for engine decisions.
///
/// Each call is one batched operation: cancel existing + place new for a
/// ladder, cancel all + close for a flatten.
pub trait OrderSubmitter: Send + Sync {
    fn submit_ladder(&self, ladder: Ladder) -> BoxFuture<'_, AppResult<()>>;

    fn flatten(&self, instruction: FlattenInstruction) -> BoxFuture<'_, AppResult<()>>;
}

// ============================================================================
// DryRunSubmitter
// ============================================================================

/// What the dry-run submitter was asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SubmissionRecord {
    Ladder {
        submitted_at: DateTime<Utc>,
        ladder: Ladder,
    },
    Flatten {
        submitted_at: DateTime<Utc>,
        instruction: FlattenInstruction,
    },
}

/// Logs each decision with its fixed-point encoding instead of sending it.
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    batches: AtomicU64,
    history: Mutex<Vec<SubmissionRecord>>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches accepted so far.
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Recorded submissions, oldest first.
    pub fn history(&self) -> Vec<SubmissionRecord> {
        self.history.lock().clone()
    }

    fn log_intent(batch: u64, intent: &OrderIntent) -> AppResult<()> {
        let base_asset_amount = intent.scaled_size()?;
        let oracle_price_offset = intent.scaled_offset()?;
        info!(
            batch,
            side = %intent.side,
            size = %intent.size,
            oracle_offset = %intent.oracle_offset,
            base_asset_amount,
            oracle_price_offset,
            "DRY RUN place order"
        );
        Ok(())
    }
}

impl OrderSubmitter for DryRunSubmitter {
    fn submit_ladder(&self, ladder: Ladder) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(async move {
            let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
            info!(batch, mode = ladder.mode.as_str(), "DRY RUN cancel open orders");
            for intent in ladder.intents() {
                Self::log_intent(batch, intent)?;
            }
            self.history.lock().push(SubmissionRecord::Ladder {
                submitted_at: Utc::now(),
                ladder,
            });
            Ok(())
        })
    }

    fn flatten(&self, instruction: FlattenInstruction) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(async move {
            let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
            let payload = serde_json::to_string(&instruction)?;
            warn!(
                batch,
                risk_ratio = %instruction.risk_ratio,
                close_side = ?instruction.close_side,
                close_size = %instruction.close_size,
                %payload,
                "DRY RUN cancel all and close position"
            );
            self.history.lock().push(SubmissionRecord::Flatten {
                submitted_at: Utc::now(),
                instruction,
            });
            Ok(())
        })
    }
}
