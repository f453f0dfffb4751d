//! Replay source for development mode.
//!
//! Reads archived snapshots from a data directory instead of the network:
//! `dlob.json` (order list), `user.json` (account), `market.json` (market).
//! Files are re-read every cycle so they can be swapped while running.

use std::path::{Path, PathBuf};

use tracing::debug;

use pmm_core::{AccountSnapshot, RawOrder};
use pmm_feed::{parse_account, parse_market, parse_orders};

use crate::error::{AppError, AppResult};
use crate::source::{BoxFuture, MarketData, SnapshotSource};

pub const ORDERS_FILE: &str = "dlob.json";
pub const ACCOUNT_FILE: &str = "user.json";
pub const MARKET_FILE: &str = "market.json";

#[derive(Debug, Clone)]
pub struct ReplaySource {
    data_dir: PathBuf,
}

impl ReplaySource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn read(&self, file: &str) -> AppResult<String> {
        let path = self.data_dir.join(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Source(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = content.len(), "Read replay file");
        Ok(content)
    }
}

impl SnapshotSource for ReplaySource {
    fn fetch_orders(&self) -> BoxFuture<'_, AppResult<Vec<RawOrder>>> {
        Box::pin(async move {
            let content = self.read(ORDERS_FILE).await?;
            Ok(parse_orders(&content)?)
        })
    }

    fn fetch_account(&self) -> BoxFuture<'_, AppResult<AccountSnapshot>> {
        Box::pin(async move {
            let content = self.read(ACCOUNT_FILE).await?;
            Ok(parse_account(&content)?)
        })
    }

    fn fetch_market(&self) -> BoxFuture<'_, AppResult<MarketData>> {
        Box::pin(async move {
            let content = self.read(MARKET_FILE).await?;
            let market = parse_market(&content)?;
            Ok(MarketData {
                oracle_price: market.oracle_price(),
                funding_rate: market.funding_rate(),
            })
        })
    }
}
