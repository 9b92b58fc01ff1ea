use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::Mutex;

use crate::{
    config::EngineConfig,
    connection::Client,
    expiry::{spawn_sweeper, Sweeper},
    state::State,
};

/// The emulated server: shared state plus its background sweep.
#[derive(Debug)]
pub struct RedisServer {
    config: EngineConfig,
    state: Arc<Mutex<State>>,
    next_client_id: AtomicU64,
    _sweeper: Option<Sweeper>,
}

impl RedisServer {
    pub fn new(config: EngineConfig) -> Self {
        let state = Arc::new(Mutex::new(State::new(config.databases)));
        let sweeper = spawn_sweeper(&state, config.sweep_interval);

        tracing::debug!(databases = config.databases, "created server");

        RedisServer {
            config,
            state,
            next_client_id: AtomicU64::new(1),
            _sweeper: sweeper,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a new client handle on database 0.
    pub fn create_client(&self) -> Client {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);

        Client::new(id, Arc::clone(&self.state), self.config.scan_count)
    }
}

impl Default for RedisServer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
