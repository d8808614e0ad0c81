/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Bounded exponential backoff for startup calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff schedule: `initial_delay * multiplier^n`, capped at `max_delay`, at most
/// `max_attempts` calls in total.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the delay randomized around its nominal value (0.0 disables jitter).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max = self.max_delay.as_millis() as f64;
        let mut delay = self.initial_delay.as_millis() as f64;
        for _ in 0..attempt {
            delay *= self.multiplier;
            if delay >= max {
                break;
            }
        }

        if self.jitter_factor > 0.0 {
            delay += delay * self.jitter_factor * (rand::random::<f64>() - 0.5);
        }

        Duration::from_millis(delay.clamp(0.0, max) as u64)
    }
}

/// Why [`retry`] gave up.
#[derive(Debug, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Calls `operation` until it succeeds, returns a non-retryable error, or the attempt budget
/// is spent. `on_retry` sees each retryable failure with the delay about to be slept.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E, Duration),
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !is_retryable(&err) {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                let delay = policy.delay_for(attempt - 1);
                on_retry(attempt, &err, delay);
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{retry, RetryExhausted, RetryPolicy};
    use std::cell::Cell;
    use std::time::Duration;

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            jitter_factor: 0.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn delays_double_until_capped() {
        let policy = no_jitter();
        let delays: Vec<u64> = (0..6)
            .map(|attempt| policy.delay_for(attempt).as_millis() as u64)
            .collect();

        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn jitter_never_exceeds_the_cap() {
        let policy = RetryPolicy {
            jitter_factor: 1.0,
            ..RetryPolicy::default()
        };
        for _ in 0..100 {
            assert!(policy.delay_for(10) <= Duration::from_secs(8));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let mut retries = Vec::new();

        let result: Result<(), _> = retry(
            &no_jitter(),
            || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>("unavailable") }
            },
            |_| true,
            |attempt, _, delay| retries.push((attempt, delay)),
        )
        .await;

        assert_eq!(
            result,
            Err(RetryExhausted {
                attempts: 6,
                last_error: "unavailable"
            })
        );
        assert_eq!(calls.get(), 6);
        assert_eq!(retries.len(), 5);
        assert_eq!(retries[4], (5, Duration::from_secs(8)));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_non_retryable_error() {
        let calls = Cell::new(0);

        let result: Result<(), _> = retry(
            &no_jitter(),
            || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(400) }
            },
            |status| *status >= 500,
            |_, _, _| {},
        )
        .await;

        assert_eq!(result.map_err(|exhausted| exhausted.attempts), Err(1));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);

        let result = retry(
            &no_jitter(),
            || {
                calls.set(calls.get() + 1);
                let outcome = if calls.get() < 3 { Err("refused") } else { Ok(calls.get()) };
                async move { outcome }
            },
            |_| true,
            |_, _, _| {},
        )
        .await;

        assert_eq!(result, Ok(3));
    }
}
