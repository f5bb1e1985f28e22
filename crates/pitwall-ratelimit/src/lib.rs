// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiting for Pitwall.
//!
//! Counts live in cache sorted sets hydrated from the durable usage log on
//! first access. See [`RateLimiter`] for the degradation policy.

pub mod limiter;
pub mod window;

pub use limiter::RateLimiter;
pub use window::{RateLimitCache, SENTINEL, window_floor, window_key};
