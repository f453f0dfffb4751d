//! Integration tests for pmm-bot.
//!
//! These tests drive the cycle loop against in-memory collaborators:
//! - snapshot fetch deadlines and failures
//! - flatten versus ladder submission
//! - owner exposure folded into the account

pub mod common;
