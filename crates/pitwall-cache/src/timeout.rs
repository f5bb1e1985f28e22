// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hard deadlines for cache round-trips.

use std::future::Future;
use std::time::Duration;

use pitwall_core::PitwallError;

/// Runs `fut` with a deadline. Expiry yields [`PitwallError::Timeout`].
///
/// The inner future is dropped on expiry. A command already written to the
/// server may still be applied afterwards.
pub async fn time_bound<T, F>(deadline: Duration, fut: F) -> Result<T, PitwallError>
where
    F: Future<Output = Result<T, PitwallError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(PitwallError::Timeout { duration: deadline }),
    }
}
