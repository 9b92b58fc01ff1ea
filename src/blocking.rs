//! Suspended BLPOP/BRPOP calls.
//!
//! A waiter is registered under the state lock and resolved under the same
//! lock, either by a push that pops on its behalf or by its own deadline.
//! Whichever takes the lock first wins; the other finds the waiter gone.

use std::{collections::VecDeque, sync::Arc};

use tokio::{
    runtime::Handle,
    sync::{oneshot, Mutex},
    time::{timeout_at, Instant},
};

use crate::{key_value_store::KeyValueStore, reply::Reply, state::State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopDirection {
    Front,
    Back,
}

impl PopDirection {
    pub fn pop(self, list: &mut VecDeque<String>) -> Option<String> {
        match self {
            PopDirection::Front => list.pop_front(),
            PopDirection::Back => list.pop_back(),
        }
    }

    fn push_back_popped(self, list: &mut VecDeque<String>, value: String) {
        match self {
            PopDirection::Front => list.push_front(value),
            PopDirection::Back => list.push_back(value),
        }
    }
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    db: usize,
    keys: Vec<String>,
    direction: PopDirection,
    sender: oneshot::Sender<(String, String)>,
}

/// Pending waiters in registration order.
#[derive(Debug, Default)]
pub struct WaiterQueue {
    waiters: VecDeque<Waiter>,
    next_id: u64,
}

impl WaiterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub fn register(
        &mut self,
        db: usize,
        keys: Vec<String>,
        direction: PopDirection,
    ) -> (u64, oneshot::Receiver<(String, String)>) {
        self.prune_closed();

        let (sender, receiver) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(id, db, ?keys, "registering blocked pop");
        self.waiters.push_back(Waiter {
            id,
            db,
            keys,
            direction,
            sender,
        });

        (id, receiver)
    }

    /// Removes a waiter. Returns false if a push already resolved it.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.waiters.iter().position(|waiter| waiter.id == id) {
            Some(position) => {
                self.waiters.remove(position);
                true
            }
            None => false,
        }
    }

    /// Drops waiters whose caller stopped waiting. Returns how many went.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.waiters.len();
        self.waiters.retain(|waiter| !waiter.sender.is_closed());

        before - self.waiters.len()
    }

    /// Serves at most one waiter after a push to `key`.
    ///
    /// The first live waiter, in registration order, that lists `key` gets
    /// one element popped from its side of the list. Waiters whose caller
    /// has gone away are dropped along the way.
    pub fn serve(&mut self, db: usize, key: &str, store: &mut KeyValueStore) -> bool {
        self.prune_closed();

        while let Some(position) = self
            .waiters
            .iter()
            .position(|waiter| waiter.db == db && waiter.keys.iter().any(|k| k == key))
        {
            let Some(waiter) = self.waiters.remove(position) else {
                break;
            };

            let Some(list) = store
                .get_mut(key)
                .and_then(|value| value.data.as_list_mut().ok())
            else {
                self.waiters.insert(position, waiter);
                return false;
            };

            let Some(element) = waiter.direction.pop(list) else {
                self.waiters.insert(position, waiter);
                return false;
            };

            match waiter.sender.send((key.to_string(), element)) {
                Ok(()) => {
                    tracing::debug!(id = waiter.id, key, "served blocked pop");
                    store.remove_if_empty(key);
                    return true;
                }
                Err((_, element)) => {
                    // the receiver went away after the liveness check
                    if let Some(list) = store
                        .get_mut(key)
                        .and_then(|value| value.data.as_list_mut().ok())
                    {
                        waiter.direction.push_back_popped(list, element);
                    }
                }
            }
        }

        false
    }
}

/// A blocking pop that found nothing to pop and is now waiting.
#[derive(Debug)]
pub struct PendingPop {
    pub id: u64,
    pub receiver: oneshot::Receiver<(String, String)>,
    /// `None` waits forever.
    pub deadline: Option<Instant>,
}

impl PendingPop {
    /// Waits outside the state lock until served or timed out.
    ///
    /// If the returned future is dropped first, the waiter is removed from
    /// the queue.
    pub async fn resolve(self, state: &Arc<Mutex<State>>) -> Reply {
        let PendingPop {
            id,
            mut receiver,
            deadline,
        } = self;
        let mut guard = WaiterGuard {
            id,
            state,
            armed: true,
        };

        let outcome = match deadline {
            None => (&mut receiver).await.ok(),
            Some(deadline) => match timeout_at(deadline, &mut receiver).await {
                Ok(result) => result.ok(),
                Err(_) => {
                    let mut state = state.lock().await;

                    if state.waiters.remove(id) {
                        tracing::debug!(id, "blocked pop timed out");
                        None
                    } else {
                        receiver.try_recv().ok()
                    }
                }
            },
        };
        guard.armed = false;

        match outcome {
            Some((key, value)) => Reply::from_strings([key, value]),
            None => Reply::Nil,
        }
    }
}

/// Removes a waiter whose `resolve` future was dropped before finishing.
struct WaiterGuard<'a> {
    id: u64,
    state: &'a Arc<Mutex<State>>,
    armed: bool,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let id = self.id;
        if let Ok(mut state) = self.state.try_lock() {
            state.waiters.remove(id);
            return;
        }

        match Handle::try_current() {
            Ok(runtime) => {
                let state = Arc::clone(self.state);
                runtime.spawn(async move {
                    state.lock().await.waiters.remove(id);
                });
            }
            Err(_) => tracing::warn!(id, "no runtime to remove abandoned waiter"),
        }
    }
}
