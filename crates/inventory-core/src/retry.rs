//! Bounded retry around [`FactStore::replace_node_facts`].
//!
//! Every attempt re-runs the whole atomic replace, so an aborted attempt
//! leaves nothing behind and the committed attempt is the only one visible.

use std::time::Duration;

use crate::{
  Error, Result,
  model::FactSnapshot,
  store::{FactStore, StorageError as _},
};

/// How many times a write is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first. Values below 1 are treated as 1.
  pub max_attempts: u32,
  /// Delay before the second attempt; doubles for each attempt after that.
  pub base_delay:   Duration,
  pub max_delay:    Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 4,
      base_delay:   Duration::from_millis(100),
      max_delay:    Duration::from_secs(2),
    }
  }
}

impl RetryPolicy {
  /// A policy that retries `max_attempts` times without sleeping.
  pub fn immediate(max_attempts: u32) -> Self {
    Self { max_attempts, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
  }

  /// Delay to wait after failed attempt number `attempt` (1-based).
  pub fn delay_after(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }
}

/// Wraps a store's write path with bounded retry on transient failures.
#[derive(Debug, Clone)]
pub struct RetryingWriter<S> {
  store:  S,
  policy: RetryPolicy,
}

impl<S: FactStore> RetryingWriter<S> {
  pub fn new(store: S, policy: RetryPolicy) -> Self { Self { store, policy } }

  /// Replace the snapshot's node facts, retrying transient failures.
  ///
  /// Permanent failures return [`Error::Storage`] immediately. Running out of
  /// attempts returns [`Error::RetriesExhausted`] carrying the last cause.
  pub async fn save(&self, snapshot: &FactSnapshot) -> Result<(), S::Error> {
    let max_attempts = self.policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      let err = match self.store.replace_node_facts(snapshot).await {
        Ok(()) => {
          tracing::debug!(node = %snapshot.name, attempt, "facts saved");
          return Ok(());
        }
        Err(err) => err,
      };

      if !err.is_transient() {
        tracing::error!(node = %snapshot.name, error = %err, "permanent storage error");
        return Err(Error::Storage(err));
      }
      if attempt >= max_attempts {
        tracing::error!(
          node = %snapshot.name,
          attempts = attempt,
          error = %err,
          "giving up after transient storage errors"
        );
        return Err(Error::RetriesExhausted { attempts: attempt, source: err });
      }

      let delay = self.policy.delay_after(attempt);
      tracing::warn!(
        node = %snapshot.name,
        attempt,
        ?delay,
        error = %err,
        "transient storage error, retrying"
      );
      tokio::time::sleep(delay).await;
      attempt += 1;
    }
  }
}
