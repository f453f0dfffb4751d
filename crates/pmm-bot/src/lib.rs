//! Periodic perp market-making bot.
//!
//! Wires the snapshot source, the decision engine and the order submitter
//! into a fixed-period cycle loop. Development mode replays archived
//! snapshots from disk and logs decisions instead of submitting them.

pub mod app;
pub mod config;
pub mod error;
pub mod replay;
pub mod source;

pub use app::{Application, CycleOutcome, CycleReport, RunSummary};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use replay::ReplaySource;
pub use source::{
    BoxFuture, DryRunSubmitter, MarketData, OrderSubmitter, SnapshotSource, SubmissionRecord,
};
