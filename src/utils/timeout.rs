//! Deadline helpers for the transport layer.
//!
//! Both connection establishment and data receipt are bounded by a single
//! configurable deadline (see [`crate::config::SocketConfig`]); expiry is
//! reported as [`ProtocolError::Timeout`] so callers can distinguish a slow
//! peer from a broken one.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Default deadline for connection establishment and data receipt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Run `fut` under `deadline`, mapping expiry to [`ProtocolError::Timeout`].
pub async fn with_deadline<F>(deadline: Duration, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| ProtocolError::Timeout)
}
