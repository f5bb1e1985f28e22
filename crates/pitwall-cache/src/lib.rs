// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-latency cache backends for Pitwall.
//!
//! Both backends implement [`pitwall_core::CacheStore`]: [`InMemoryCache`]
//! keeps sorted sets in a B-tree for single-node deployments and tests,
//! [`RedisCache`] talks to a Redis server. [`time_bound`] puts a hard
//! deadline on any cache call.

pub mod ext;
pub mod factory;
pub mod memory;
pub mod redis_backend;
pub mod timeout;

pub use ext::{CacheExt, single};
pub use factory::build_cache;
pub use memory::InMemoryCache;
pub use redis_backend::RedisCache;
pub use timeout::time_bound;
