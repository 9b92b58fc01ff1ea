//! Key expiry: absolute deadlines, TTL reporting and the active sweep.
//!
//! Lazy expiry lives in [`KeyValueStore`](crate::key_value_store::KeyValueStore)
//! accessors. The sweep here bounds memory held by keys nobody reads again,
//! and goes through the same lock as every command.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    runtime::Handle,
    sync::Mutex,
    task::JoinHandle,
    time::{interval, Instant, MissedTickBehavior},
};

use crate::{commands::CommandError, key_value_store::Value, state::State};

/// Turns a relative duration in milliseconds into an absolute deadline.
///
/// Durations the clock cannot represent fail with `InvalidExpireTime`.
pub fn deadline_from_millis(command: &str, millis: u64) -> Result<Instant, CommandError> {
    Instant::now()
        .checked_add(Duration::from_millis(millis))
        .ok_or_else(|| CommandError::InvalidExpireTime(command.to_lowercase()))
}

pub fn deadline_from_secs(command: &str, secs: u64) -> Result<Instant, CommandError> {
    let millis = secs
        .checked_mul(1000)
        .ok_or_else(|| CommandError::InvalidExpireTime(command.to_lowercase()))?;

    deadline_from_millis(command, millis)
}

/// Remaining lifetime in milliseconds, `-1` when the entry never expires.
pub fn pttl(value: &Value) -> i64 {
    match value.expiration {
        None => -1,
        Some(expiration) => {
            let remaining = expiration.saturating_duration_since(Instant::now());
            i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX)
        }
    }
}

/// Remaining lifetime in whole seconds, rounded up.
pub fn ttl(value: &Value) -> i64 {
    match pttl(value) {
        -1 => -1,
        millis => millis.saturating_add(999) / 1000,
    }
}

/// Aborts the sweep task when dropped.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Starts the periodic sweep on the current runtime, if there is one.
pub fn spawn_sweeper(state: &Arc<Mutex<State>>, period: Duration) -> Option<Sweeper> {
    let Ok(runtime) = Handle::try_current() else {
        tracing::warn!("no tokio runtime, active expiry disabled");
        return None;
    };

    let state: Weak<Mutex<State>> = Arc::downgrade(state);
    let handle = runtime.spawn(async move {
        let mut ticker = interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(shared) = state.upgrade() else {
                break;
            };

            let mut state = shared.lock().await;
            let purged = state.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "swept expired keys");
            }

            let abandoned = state.waiters.prune_closed();
            if abandoned > 0 {
                tracing::debug!(abandoned, "dropped abandoned waiters");
            }
        }
    });

    Some(Sweeper { handle })
}
