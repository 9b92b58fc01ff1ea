use crate::{
    blocking::PendingPop,
    commands::{
        admin, blocking_pop, command_error::CommandError, hashes, keys, lists, pub_sub, scan,
        sets, sorted_sets, strings,
    },
    connection::Session,
    key_value_store::KeyValueStore,
    reply::Reply,
    state::State,
};

/// Commands accepted while the client holds a subscription.
const SUBSCRIBER_COMMANDS: &[&str] = &[
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PSUBSCRIBE",
    "PUNSUBSCRIBE",
    "PING",
];

const KNOWN_COMMANDS: &[&str] = &[
    "PING", "ECHO", "AUTH", "SELECT", "DBSIZE", "FLUSHDB", "FLUSHALL",
    "GET", "SET", "GETSET", "SETNX", "SETEX", "MSET", "MSETNX", "MGET",
    "INCR", "INCRBY", "DECR", "DECRBY", "INCRBYFLOAT",
    "DEL", "EXISTS", "TYPE", "EXPIRE", "PEXPIRE", "PERSIST", "TTL", "PTTL",
    "KEYS", "SCAN", "RENAME", "RENAMENX",
    "LPUSH", "RPUSH", "LPUSHX", "RPUSHX", "LPOP", "RPOP", "LLEN", "LINDEX",
    "LRANGE", "LSET", "LTRIM", "BLPOP", "BRPOP",
    "HSET", "HSETNX", "HGET", "HGETALL", "HDEL", "HEXISTS", "HLEN", "HKEYS",
    "HVALS", "HMSET", "HMGET", "HINCRBY", "HINCRBYFLOAT", "HSCAN",
    "SADD", "SREM", "SMEMBERS", "SISMEMBER", "SCARD", "SRANDMEMBER", "SMOVE",
    "ZADD", "ZCARD", "ZCOUNT", "ZINCRBY", "ZRANGE", "ZRANGEBYSCORE", "ZRANK",
    "ZREM", "ZREMRANGEBYRANK", "ZREMRANGEBYSCORE", "ZREVRANGE",
    "ZREVRANGEBYSCORE", "ZREVRANK", "ZSCORE", "ZUNIONSTORE",
    "SUBSCRIBE", "UNSUBSCRIBE", "PSUBSCRIBE", "PUNSUBSCRIBE", "PUBLISH",
    "MULTI", "EXEC", "DISCARD",
    "SSCAN", "ZSCAN", "STRLEN", "APPEND",
    "HSTRLEN", "LREM", "SINTER",
];

#[derive(Debug)]
pub enum CommandResult {
    Response(Reply),
    /// A blocking pop that has to wait outside the lock.
    Blocked(PendingPop),
}

/// What a handler sees while it runs under the state lock.
pub struct CommandContext<'a> {
    pub state: &'a mut State,
    pub session: &'a mut Session,
    pub in_transaction: bool,
}

impl CommandContext<'_> {
    pub fn db(&self) -> usize {
        self.session.db
    }

    /// The database this client has selected.
    pub fn store(&mut self) -> &mut KeyValueStore {
        &mut self.state.databases[self.session.db]
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    pub fn new(name: &str, arguments: Vec<String>) -> Self {
        Self {
            name: name.to_uppercase(),
            arguments,
        }
    }

    /// Rejects commands that can never run. Used when queueing.
    pub fn validate(&self) -> Result<(), CommandError> {
        if KNOWN_COMMANDS.contains(&self.name.as_str()) {
            Ok(())
        } else {
            Err(CommandError::UnknownCommand(self.name.to_lowercase()))
        }
    }

    /// True for the commands a subscribed client may still issue.
    pub fn is_subscriber_command(&self) -> bool {
        SUBSCRIBER_COMMANDS.contains(&self.name.as_str())
    }

    pub fn handle(
        &self,
        state: &mut State,
        session: &mut Session,
        in_transaction: bool,
    ) -> Result<CommandResult, CommandError> {
        if state.pub_sub.is_subscribed(session.id) && !self.is_subscriber_command() {
            return Err(CommandError::SubscriberModeViolation);
        }

        tracing::debug!(client = session.id, command = %self.name, "handling command");

        let mut ctx = CommandContext {
            state,
            session,
            in_transaction,
        };
        let args = self.arguments.as_slice();

        let reply = match self.name.as_str() {
            "PING" => admin::ping(&mut ctx, args),
            "ECHO" => admin::echo(args),
            "AUTH" => admin::auth(args),
            "SELECT" => admin::select(&mut ctx, args),
            "DBSIZE" => admin::dbsize(&mut ctx, args),
            "FLUSHDB" => admin::flushdb(&mut ctx, args),
            "FLUSHALL" => admin::flushall(&mut ctx, args),

            "GET" => strings::get(&mut ctx, args),
            "SET" => strings::set(&mut ctx, args),
            "GETSET" => strings::getset(&mut ctx, args),
            "SETNX" => strings::setnx(&mut ctx, args),
            "SETEX" => strings::setex(&mut ctx, args),
            "MSET" => strings::mset(&mut ctx, args),
            "MSETNX" => strings::msetnx(&mut ctx, args),
            "MGET" => strings::mget(&mut ctx, args),
            "STRLEN" => strings::strlen(&mut ctx, args),
            "APPEND" => strings::append(&mut ctx, args),
            "INCR" => strings::incr(&mut ctx, args),
            "INCRBY" => strings::incrby(&mut ctx, args),
            "DECR" => strings::decr(&mut ctx, args),
            "DECRBY" => strings::decrby(&mut ctx, args),
            "INCRBYFLOAT" => strings::incrbyfloat(&mut ctx, args),

            "DEL" => keys::del(&mut ctx, args),
            "EXISTS" => keys::exists(&mut ctx, args),
            "TYPE" => keys::type_command(&mut ctx, args),
            "EXPIRE" => keys::expire(&mut ctx, args, "EXPIRE"),
            "PEXPIRE" => keys::expire(&mut ctx, args, "PEXPIRE"),
            "PERSIST" => keys::persist(&mut ctx, args),
            "TTL" => keys::ttl(&mut ctx, args),
            "PTTL" => keys::pttl(&mut ctx, args),
            "KEYS" => keys::keys(&mut ctx, args),
            "RENAME" => keys::rename(&mut ctx, args),
            "RENAMENX" => keys::renamenx(&mut ctx, args),
            "SCAN" => scan::scan(&mut ctx, args),
            "HSCAN" => scan::hscan(&mut ctx, args),
            "SSCAN" => scan::sscan(&mut ctx, args),
            "ZSCAN" => scan::zscan(&mut ctx, args),

            "LPUSH" => lists::lpush(&mut ctx, args),
            "RPUSH" => lists::rpush(&mut ctx, args),
            "LPUSHX" => lists::lpushx(&mut ctx, args),
            "RPUSHX" => lists::rpushx(&mut ctx, args),
            "LPOP" => lists::lpop(&mut ctx, args),
            "RPOP" => lists::rpop(&mut ctx, args),
            "LLEN" => lists::llen(&mut ctx, args),
            "LINDEX" => lists::lindex(&mut ctx, args),
            "LRANGE" => lists::lrange(&mut ctx, args),
            "LSET" => lists::lset(&mut ctx, args),
            "LTRIM" => lists::ltrim(&mut ctx, args),
            "LREM" => lists::lrem(&mut ctx, args),
            "BLPOP" => return blocking_pop::blpop(&mut ctx, args),
            "BRPOP" => return blocking_pop::brpop(&mut ctx, args),

            "HSET" => hashes::hset(&mut ctx, args),
            "HMSET" => hashes::hmset(&mut ctx, args),
            "HSETNX" => hashes::hsetnx(&mut ctx, args),
            "HGET" => hashes::hget(&mut ctx, args),
            "HGETALL" => hashes::hgetall(&mut ctx, args),
            "HDEL" => hashes::hdel(&mut ctx, args),
            "HEXISTS" => hashes::hexists(&mut ctx, args),
            "HLEN" => hashes::hlen(&mut ctx, args),
            "HSTRLEN" => hashes::hstrlen(&mut ctx, args),
            "HKEYS" => hashes::hkeys(&mut ctx, args),
            "HVALS" => hashes::hvals(&mut ctx, args),
            "HMGET" => hashes::hmget(&mut ctx, args),
            "HINCRBY" => hashes::hincrby(&mut ctx, args),
            "HINCRBYFLOAT" => hashes::hincrbyfloat(&mut ctx, args),

            "SADD" => sets::sadd(&mut ctx, args),
            "SREM" => sets::srem(&mut ctx, args),
            "SMEMBERS" => sets::smembers(&mut ctx, args),
            "SISMEMBER" => sets::sismember(&mut ctx, args),
            "SCARD" => sets::scard(&mut ctx, args),
            "SRANDMEMBER" => sets::srandmember(&mut ctx, args),
            "SMOVE" => sets::smove(&mut ctx, args),
            "SINTER" => sets::sinter(&mut ctx, args),

            "ZADD" => sorted_sets::zadd(&mut ctx, args),
            "ZCARD" => sorted_sets::zcard(&mut ctx, args),
            "ZCOUNT" => sorted_sets::zcount(&mut ctx, args),
            "ZINCRBY" => sorted_sets::zincrby(&mut ctx, args),
            "ZSCORE" => sorted_sets::zscore(&mut ctx, args),
            "ZRANK" => sorted_sets::zrank(&mut ctx, args, false),
            "ZREVRANK" => sorted_sets::zrank(&mut ctx, args, true),
            "ZRANGE" => sorted_sets::zrange(&mut ctx, args, false),
            "ZREVRANGE" => sorted_sets::zrange(&mut ctx, args, true),
            "ZRANGEBYSCORE" => sorted_sets::zrangebyscore(&mut ctx, args, false),
            "ZREVRANGEBYSCORE" => sorted_sets::zrangebyscore(&mut ctx, args, true),
            "ZREM" => sorted_sets::zrem(&mut ctx, args),
            "ZREMRANGEBYRANK" => sorted_sets::zremrangebyrank(&mut ctx, args),
            "ZREMRANGEBYSCORE" => sorted_sets::zremrangebyscore(&mut ctx, args),
            "ZUNIONSTORE" => sorted_sets::zunionstore(&mut ctx, args),

            "SUBSCRIBE" => pub_sub::subscribe(&mut ctx, args),
            "UNSUBSCRIBE" => pub_sub::unsubscribe(&mut ctx, args),
            "PSUBSCRIBE" => pub_sub::psubscribe(&mut ctx, args),
            "PUNSUBSCRIBE" => pub_sub::punsubscribe(&mut ctx, args),
            "PUBLISH" => pub_sub::publish(&mut ctx, args),

            // transaction control is handled by the client, never queued
            "MULTI" => Err(CommandError::NestedMulti),
            "EXEC" => Err(CommandError::ExecWithoutMulti),
            "DISCARD" => Err(CommandError::DiscardWithoutMulti),

            _ => Err(CommandError::UnknownCommand(self.name.to_lowercase())),
        };

        reply.map(CommandResult::Response)
    }
}
