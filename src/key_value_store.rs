use std::collections::{HashMap, HashSet, VecDeque};

use tokio::time::Instant;

use crate::{commands::CommandError, sorted_set::SortedSet};

/// The container stored at a key.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    SortedSet(SortedSet),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Hash(_) => "hash",
            DataType::Set(_) => "set",
            DataType::SortedSet(_) => "zset",
        }
    }

    /// Containers are removed the moment they become empty. Strings never are.
    pub fn is_empty_container(&self) -> bool {
        match self {
            DataType::String(_) => false,
            DataType::List(list) => list.is_empty(),
            DataType::Hash(hash) => hash.is_empty(),
            DataType::Set(set) => set.is_empty(),
            DataType::SortedSet(zset) => zset.is_empty(),
        }
    }

    pub fn as_string(&self) -> Result<&String, CommandError> {
        match self {
            DataType::String(s) => Ok(s),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_string_mut(&mut self) -> Result<&mut String, CommandError> {
        match self {
            DataType::String(s) => Ok(s),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_list(&self) -> Result<&VecDeque<String>, CommandError> {
        match self {
            DataType::List(list) => Ok(list),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut VecDeque<String>, CommandError> {
        match self {
            DataType::List(list) => Ok(list),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_hash(&self) -> Result<&HashMap<String, String>, CommandError> {
        match self {
            DataType::Hash(hash) => Ok(hash),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_hash_mut(&mut self) -> Result<&mut HashMap<String, String>, CommandError> {
        match self {
            DataType::Hash(hash) => Ok(hash),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_set(&self) -> Result<&HashSet<String>, CommandError> {
        match self {
            DataType::Set(set) => Ok(set),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut HashSet<String>, CommandError> {
        match self {
            DataType::Set(set) => Ok(set),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_sorted_set(&self) -> Result<&SortedSet, CommandError> {
        match self {
            DataType::SortedSet(zset) => Ok(zset),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_sorted_set_mut(&mut self) -> Result<&mut SortedSet, CommandError> {
        match self {
            DataType::SortedSet(zset) => Ok(zset),
            _ => Err(CommandError::WrongType),
        }
    }
}

/// An entry: the container plus its optional absolute expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expiration, Some(expiration) if expiration <= now)
    }
}

/// One logical database.
///
/// Every accessor applies lazy expiry first, so an expired entry is never
/// observed by a command.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn expire_if_needed(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(Instant::now()));

        if expired {
            tracing::trace!(key, "lazily expiring key");
            self.entries.remove(key);
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.expire_if_needed(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.expire_if_needed(key);
        self.entries.get_mut(key)
    }

    pub fn contains_key(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces whatever is stored at `key`, dropping any previous expiry.
    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn set_data(&mut self, key: &str, data: DataType) {
        self.entries.insert(key.to_string(), Value::new(data));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.expire_if_needed(key);
        self.entries.remove(key)
    }

    /// Returns the live entry at `key`, creating it with `create` if absent.
    pub fn get_or_insert_with(
        &mut self,
        key: &str,
        create: impl FnOnce() -> DataType,
    ) -> &mut Value {
        self.expire_if_needed(key);
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Value::new(create()))
    }

    /// Deletes `key` if its container has become empty.
    pub fn remove_if_empty(&mut self, key: &str) {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.data.is_empty_container())
        {
            self.entries.remove(key);
        }
    }

    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, value| !value.is_expired(now));

        before - self.entries.len()
    }

    /// Live keys in a stable (sorted) order.
    pub fn keys(&mut self) -> Vec<String> {
        self.purge_expired();
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        keys
    }

    pub fn len(&mut self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
