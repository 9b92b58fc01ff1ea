//! An in-process emulation of a Redis server's command surface.
//!
//! A [`RedisServer`](server::RedisServer) owns every database behind one
//! lock and hands out [`Client`](connection::Client) handles. Clients issue
//! commands through [`Client::call`](connection::Client::call) and receive
//! typed [`Reply`](reply::Reply) values, with no wire protocol involved.
//!
//! Supported:
//!
//! - Strings, lists, hashes, sets and sorted sets
//! - Key expiry, both lazy and through a periodic sweep
//! - Glob matching for KEYS, the SCAN family and pattern subscriptions
//! - Blocking list pops with deadlines
//! - MULTI/EXEC batches
//! - Publish/subscribe with typed client notifications

pub mod blocking;
pub mod commands;
pub mod config;
pub mod connection;
pub mod expiry;
pub mod glob;
pub mod key_value_store;
pub mod pub_sub;
pub mod reply;
pub mod server;
pub mod sorted_set;
pub mod state;
pub mod transactions;

pub use commands::CommandError;
pub use config::{ConfigError, EngineConfig};
pub use connection::Client;
pub use pub_sub::ClientEvent;
pub use reply::Reply;
pub use server::RedisServer;
