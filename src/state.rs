use crate::{blocking::WaiterQueue, key_value_store::KeyValueStore, pub_sub::PubSub};

/// Everything guarded by the server's single lock.
#[derive(Debug)]
pub struct State {
    pub databases: Vec<KeyValueStore>,
    pub waiters: WaiterQueue,
    pub pub_sub: PubSub,
}

impl State {
    pub fn new(databases: usize) -> Self {
        State {
            databases: (0..databases.max(1)).map(|_| KeyValueStore::new()).collect(),
            waiters: WaiterQueue::new(),
            pub_sub: PubSub::new(),
        }
    }

    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    /// Drops expired entries from every database.
    pub fn purge_expired(&mut self) -> usize {
        self.databases
            .iter_mut()
            .map(KeyValueStore::purge_expired)
            .sum()
    }
}
