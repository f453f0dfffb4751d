//! Main application orchestration.
//!
//! Runs the fixed-period decision cycle:
//! - fetch order list, account and market concurrently under one deadline
//! - aggregate the book and fold in the maker's own resting orders
//! - evaluate the configured strategy
//! - submit the decision under its own deadline before the next tick
//!
//! A cycle with missing or late data is skipped, never evaluated on
//! partial input.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use pmm_core::{AccountSnapshot, RawOrder};
use pmm_mm::{DecisionResult, Evaluation, QuoteMode, Strategy};
use pmm_telemetry::Metrics;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::source::{MarketData, OrderSubmitter, SnapshotSource};

// ============================================================================
// Cycle reporting
// ============================================================================

/// What happened in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A ladder was submitted.
    Ladder { mode: QuoteMode, bids: usize, asks: usize },
    /// A flatten was submitted.
    Flatten,
    /// Snapshots did not arrive before the fetch deadline.
    SkippedTimeout,
    /// A snapshot fetch or the evaluation failed.
    SkippedError,
    /// The submitter returned an error.
    SubmitFailed,
    /// The submitter did not finish before the submit deadline.
    SubmitTimeout,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ladder { .. } => "ladder",
            Self::Flatten => "flatten",
            Self::SkippedTimeout => "skipped_timeout",
            Self::SkippedError => "skipped_error",
            Self::SubmitFailed => "submit_failed",
            Self::SubmitTimeout => "submit_timeout",
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedTimeout | Self::SkippedError)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: CycleOutcome,
    /// Present when the cycle reached evaluation.
    pub risk_ratio: Option<Decimal>,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub ladders: u64,
    pub flattens: u64,
    pub skipped: u64,
    pub submit_failures: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Ladder { .. } => self.ladders += 1,
            CycleOutcome::Flatten => self.flattens += 1,
            CycleOutcome::SkippedTimeout | CycleOutcome::SkippedError => self.skipped += 1,
            CycleOutcome::SubmitFailed | CycleOutcome::SubmitTimeout => {
                self.submit_failures += 1
            }
        }
    }
}

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    strategy: Strategy,
    source: Arc<dyn SnapshotSource>,
    submitter: Arc<dyn OrderSubmitter>,
    cycle: u64,
}

impl Application {
    /// Validate the configuration and resolve the strategy.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn SnapshotSource>,
        submitter: Arc<dyn OrderSubmitter>,
    ) -> AppResult<Self> {
        config.validate()?;
        let strategy = Strategy::new(config.strategy.clone(), config.risk.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;

        info!(
            market = %config.market_name,
            strategy = config.strategy.name(),
            cycle_period_ms = config.cycle_period_ms,
            "Application initialized"
        );

        Ok(Self {
            config,
            strategy,
            source,
            submitter,
            cycle: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run cycles until `max_cycles` is reached or Ctrl-C is received.
    pub async fn run(&mut self) -> AppResult<RunSummary> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(ctrl_c).await
    }

    /// Run cycles until `max_cycles` is reached or `shutdown` completes.
    ///
    /// Shutdown is honored between cycles; a running cycle always finishes,
    /// and a shutdown that fires during it stops the loop right after.
    pub async fn run_until<F>(&mut self, shutdown: F) -> AppResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();
        let mut ticker = tokio::time::interval(self.config.cycle_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Entering decision loop");

        loop {
            if self
                .config
                .max_cycles
                .is_some_and(|max| summary.cycles >= max)
            {
                info!(cycles = summary.cycles, "Reached max_cycles");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle().await;
                    summary.record(&report.outcome);
                }
            }
        }

        info!(
            cycles = summary.cycles,
            ladders = summary.ladders,
            flattens = summary.flattens,
            skipped = summary.skipped,
            submit_failures = summary.submit_failures,
            "Shutting down"
        );
        Ok(summary)
    }

    /// Execute one full cycle. Never fails: problems become the outcome.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let cycle = self.cycle;
        let started_at = Utc::now();
        let start = Instant::now();

        let (outcome, risk_ratio) = match self.fetch_snapshots().await {
            Ok((orders, account, market)) => match self.decide(&orders, account, market) {
                Ok(evaluation) => {
                    let risk_ratio = evaluation.risk.risk_ratio;
                    (self.submit(evaluation.decision).await, Some(risk_ratio))
                }
                Err(e) => {
                    warn!(cycle, error = %e, "Evaluation failed, skipping cycle");
                    (CycleOutcome::SkippedError, None)
                }
            },
            Err(outcome) => (outcome, None),
        };

        let elapsed = start.elapsed();
        Metrics::cycle_completed(outcome.as_str(), elapsed.as_secs_f64() * 1000.0);
        debug!(
            cycle,
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Cycle finished"
        );

        CycleReport {
            cycle,
            started_at,
            elapsed,
            outcome,
            risk_ratio,
        }
    }

    /// Fetch all three snapshots concurrently under the fetch deadline.
    async fn fetch_snapshots(
        &self,
    ) -> Result<(Vec<RawOrder>, AccountSnapshot, MarketData), CycleOutcome> {
        let fetch = async {
            tokio::try_join!(
                self.source.fetch_orders(),
                self.source.fetch_account(),
                self.source.fetch_market(),
            )
        };

        match timeout(self.config.fetch_timeout(), fetch).await {
            Ok(Ok(snapshots)) => Ok(snapshots),
            Ok(Err(e)) => {
                warn!(cycle = self.cycle, error = %e, "Snapshot fetch failed, skipping cycle");
                Err(CycleOutcome::SkippedError)
            }
            Err(_) => {
                warn!(
                    cycle = self.cycle,
                    timeout_ms = self.config.fetch_timeout_ms,
                    "Snapshot fetch timed out, skipping cycle"
                );
                Err(CycleOutcome::SkippedTimeout)
            }
        }
    }

    /// Aggregate, fold in own orders, evaluate. Synchronous and side-effect free.
    fn decide(
        &self,
        orders: &[RawOrder],
        account: AccountSnapshot,
        market: MarketData,
    ) -> AppResult<Evaluation> {
        let book = self
            .strategy
            .aggregator()
            .aggregate(orders, market.oracle_price);
        let market = market.with_book_top(book.best_bid, book.best_ask);

        let account = if self.config.owner_address.is_empty() {
            account
        } else {
            account.with_open_orders(book.owner_exposure(&self.config.owner_address))
        };

        let evaluation = self.strategy.evaluate_with_book(&book, &account, &market)?;
        Metrics::risk_observed(
            evaluation.risk.risk_ratio.to_f64().unwrap_or(0.0),
            evaluation.skew.to_f64().unwrap_or(0.0),
        );
        Ok(evaluation)
    }

    /// Hand the decision to the submitter under the submit deadline.
    async fn submit(&self, decision: DecisionResult) -> CycleOutcome {
        let (outcome, submission) = match decision {
            DecisionResult::Flatten(instruction) => {
                Metrics::flatten_issued();
                (CycleOutcome::Flatten, self.submitter.flatten(instruction))
            }
            DecisionResult::Ladder(ladder) => {
                Metrics::ladder_emitted(
                    ladder.mode.as_str(),
                    ladder.bids.len(),
                    ladder.asks.len(),
                );
                let outcome = CycleOutcome::Ladder {
                    mode: ladder.mode,
                    bids: ladder.bids.len(),
                    asks: ladder.asks.len(),
                };
                (outcome, self.submitter.submit_ladder(ladder))
            }
        };

        match timeout(self.config.submit_timeout(), submission).await {
            Ok(Ok(())) => outcome,
            Ok(Err(e)) => {
                error!(cycle = self.cycle, error = %e, "Submission failed");
                CycleOutcome::SubmitFailed
            }
            Err(_) => {
                error!(
                    cycle = self.cycle,
                    timeout_ms = self.config.submit_timeout_ms,
                    "Submission timed out, abandoned"
                );
                CycleOutcome::SubmitTimeout
            }
        }
    }
}
