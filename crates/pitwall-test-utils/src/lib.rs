// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pitwall integration tests.
//!
//! Provides deterministic fakes and a harness for fast, CI-runnable tests
//! without a Redis server, a database file or an AI service.
//!
//! # Components
//!
//! - [`ManualClock`] - clock that moves only when told to
//! - [`MockOracle`] / [`MockEmbedder`] - scripted completion and embedding oracles
//! - [`FlakyCache`] - cache wrapper that fails or hangs on demand
//! - [`MemoryDurableStore`] - counting in-memory usage log and knowledge store
//! - [`TestHarness`] - all components wired together

pub mod clock;
pub mod durable;
pub mod flaky_cache;
pub mod harness;
pub mod mock_oracle;

pub use clock::ManualClock;
pub use durable::MemoryDurableStore;
pub use flaky_cache::{FaultMode, FlakyCache};
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_oracle::{MockEmbedder, MockOracle};
