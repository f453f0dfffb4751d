//! In-memory snapshot source and recording submitter.
//!
//! Both collaborators can be slowed down or made to fail so the cycle's
//! deadline and skip handling can be exercised.

use std::time::Duration;

use parking_lot::Mutex;

use pmm_bot::{AppError, AppResult, BoxFuture, MarketData, OrderSubmitter, SnapshotSource};
use pmm_core::{AccountSnapshot, RawOrder};
use pmm_mm::{DecisionResult, Ladder};
use pmm_risk::FlattenInstruction;

/// Snapshot source backed by fixed values.
pub struct MockSource {
    orders: Mutex<Vec<RawOrder>>,
    account: Mutex<AccountSnapshot>,
    market: Mutex<MarketData>,
    delay: Mutex<Duration>,
    fail_account: Mutex<bool>,
}

impl MockSource {
    pub fn new(orders: Vec<RawOrder>, account: AccountSnapshot, market: MarketData) -> Self {
        Self {
            orders: Mutex::new(orders),
            account: Mutex::new(account),
            market: Mutex::new(market),
            delay: Mutex::new(Duration::ZERO),
            fail_account: Mutex::new(false),
        }
    }

    /// Delay applied to every fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Make the account fetch fail.
    pub fn set_fail_account(&self, fail: bool) {
        *self.fail_account.lock() = fail;
    }

    pub fn set_account(&self, account: AccountSnapshot) {
        *self.account.lock() = account;
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl SnapshotSource for MockSource {
    fn fetch_orders(&self) -> BoxFuture<'_, AppResult<Vec<RawOrder>>> {
        Box::pin(async move {
            self.pause().await;
            Ok(self.orders.lock().clone())
        })
    }

    fn fetch_account(&self) -> BoxFuture<'_, AppResult<AccountSnapshot>> {
        Box::pin(async move {
            self.pause().await;
            if *self.fail_account.lock() {
                return Err(AppError::Source("account unavailable".to_string()));
            }
            Ok(self.account.lock().clone())
        })
    }

    fn fetch_market(&self) -> BoxFuture<'_, AppResult<MarketData>> {
        Box::pin(async move {
            self.pause().await;
            Ok(*self.market.lock())
        })
    }
}

/// Submitter that records every decision it completes.
#[derive(Default)]
pub struct RecordingSubmitter {
    decisions: Mutex<Vec<DecisionResult>>,
    delay: Mutex<Duration>,
    fail: Mutex<bool>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// Completed submissions, oldest first.
    pub fn decisions(&self) -> Vec<DecisionResult> {
        self.decisions.lock().clone()
    }

    async fn complete(&self, decision: DecisionResult) -> AppResult<()> {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock() {
            return Err(AppError::Submit("exchange rejected batch".to_string()));
        }
        self.decisions.lock().push(decision);
        Ok(())
    }
}

impl OrderSubmitter for RecordingSubmitter {
    fn submit_ladder(&self, ladder: Ladder) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(self.complete(DecisionResult::Ladder(ladder)))
    }

    fn flatten(&self, instruction: FlattenInstruction) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(self.complete(DecisionResult::Flatten(instruction)))
    }
}
