// ABOUTME: Shared retry policy for generation transports
// ABOUTME: Exponential backoff with jitter, retriable failure classification and attempt timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::{CallError, CompletionTransport, GenerationRequest, RawCompletion};
use crate::config::{GenerationConfig, ModelCandidate};

/// Attempt ceiling, backoff formula and per-attempt timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per candidate, first attempt included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the exponential delay
    pub max_delay: Duration,
    /// Upper bound of uniformly random jitter added to each delay
    pub jitter: Duration,
    /// Bound on every single network attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build the policy from generation configuration
    #[must_use]
    pub const fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            jitter: config.retry_jitter,
            attempt_timeout: config.attempt_timeout,
        }
    }

    /// Policy without delays, used where backoff would only slow things down
    #[must_use]
    pub const fn immediate(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            attempt_timeout,
        }
    }

    /// Backoff before retry number `attempt` (0-based)
    ///
    /// `min(base * 2^attempt, max) + rand(0..=jitter)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let capped = base_ms.saturating_mul(factor).min(max_ms);

        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(0);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        Duration::from_millis(capped.saturating_add(jitter))
    }

    /// Run one attempt bounded by the attempt timeout
    ///
    /// An elapsed timeout is reported as a retriable failure.
    pub async fn attempt(
        &self,
        transport: &dyn CompletionTransport,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        match timeout(self.attempt_timeout, transport.complete(target, request)).await {
            Ok(result) => result,
            Err(_) => Err(CallError::Retriable(format!(
                "{} call to {} timed out after {}s",
                transport.name(),
                target.model,
                self.attempt_timeout.as_secs_f32()
            ))),
        }
    }

    /// Call `target` until success, a non-retriable failure or the attempt ceiling
    ///
    /// Attempts are strictly sequential.
    pub async fn call_with_retry(
        &self,
        transport: &dyn CompletionTransport,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        let mut attempt = 0;
        loop {
            match self.attempt(transport, target, request).await {
                Ok(completion) => return Ok(completion),
                Err(error) if error.is_retriable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    attempt += 1;
                    warn!(
                        transport = transport.name(),
                        model = %target.model,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Retriable generation failure, backing off"
                    );
                    sleep(delay).await;
                }
                Err(error) => {
                    debug!(
                        transport = transport.name(),
                        model = %target.model,
                        attempts = attempt + 1,
                        error = %error,
                        "Giving up on generation target"
                    );
                    return Err(error);
                }
            }
        }
    }
}

/// Check if an HTTP status code is retriable
#[must_use]
pub const fn is_retriable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Check if a request error is retriable (connect, DNS, timeout, reset)
#[must_use]
pub fn is_retriable_request_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || has_connection_reset(error)
}

/// Classify a transport-level `reqwest` failure
pub(crate) fn classify_request_error(service: &str, error: &reqwest::Error) -> CallError {
    if is_retriable_request_error(error) {
        CallError::Retriable(format!("{service} request failed: {error}"))
    } else {
        CallError::Fatal(format!("{service} request failed: {error}"))
    }
}

/// Classify a non-success HTTP status
pub(crate) fn classify_status(service: &str, status: u16, message: &str) -> CallError {
    if status == 404 {
        CallError::NotFound(format!("{service} ({status}): {message}"))
    } else if is_retriable_status(status) {
        CallError::Retriable(format!("{service} ({status}): {message}"))
    } else {
        CallError::Fatal(format!("{service} ({status}): {message}"))
    }
}

fn has_connection_reset(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
