// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache adapter trait for the low-latency key/value and sorted-set store.

use async_trait::async_trait;

use crate::cache::{CacheReply, Pipeline};
use crate::error::PitwallError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for a low-latency cache with TTL keys, sets, and sorted sets.
///
/// Implementations must be safe for concurrent use from many tasks and
/// must execute each command atomically. A pipeline is not a transaction:
/// other clients may interleave between its commands.
#[async_trait]
pub trait CacheStore: PluginAdapter {
    /// Executes every command of the pipeline in order, returning one reply per command.
    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError>;
}
