use tokio::time::Instant;

use crate::{
    commands::{
        command_utils::{check_arity, into_pairs, parse_float, parse_integer},
        CommandContext, CommandError,
    },
    expiry::{deadline_from_millis, deadline_from_secs},
    key_value_store::{DataType, Value},
    reply::{format_float, Reply},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum SetCondition {
    IfAbsent,
    IfPresent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SetExpiration {
    Clear,
    Keep,
    At(Instant),
}

/// Represents the parsed arguments for the SET command.
#[derive(Debug)]
pub struct SetArguments {
    /// The key name to write
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// NX or XX precondition
    condition: Option<SetCondition>,
    /// What happens to the key's time to live
    expiration: SetExpiration,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// Options are case-insensitive and may appear in any order after the
    /// key and value.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments:
    ///   - `[key, value]` - Stores the value and clears any time to live
    ///   - `[key, value, NX|XX]` - Only writes if the key is absent or present
    ///   - `[key, value, EX seconds|PX milliseconds|KEEPTTL]` - Sets or keeps the time to live
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::BadArity)` - If fewer than 2 arguments are given
    /// * `Err(CommandError::SyntaxError)` - If an option is unknown, NX is combined with XX,
    ///   or more than one of EX, PX and KEEPTTL is given
    /// * `Err(CommandError::NotInteger)` - If the expire time is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expire time is zero or negative
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let args = SetArguments::parse(&["k".into(), "v".into(), "PX".into(), "100".into()])?;
    /// // Returns SetArguments with an expiration 100ms from now
    ///
    /// let err = SetArguments::parse(&["k".into(), "v".into(), "NX".into(), "XX".into()]);
    /// // Returns Err(CommandError::SyntaxError)
    /// ```
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("set", arguments, 2, None)?;

        let mut condition = None;
        let mut expiration = SetExpiration::Clear;
        let mut expiration_seen = false;
        let mut options = arguments[2..].iter();

        while let Some(option) = options.next() {
            match option.to_uppercase().as_str() {
                "NX" | "XX" => {
                    let requested = if option.eq_ignore_ascii_case("NX") {
                        SetCondition::IfAbsent
                    } else {
                        SetCondition::IfPresent
                    };

                    if condition.is_some_and(|current| current != requested) {
                        return Err(CommandError::SyntaxError);
                    }
                    condition = Some(requested);
                }
                unit @ ("EX" | "PX") => {
                    if expiration_seen {
                        return Err(CommandError::SyntaxError);
                    }
                    let amount = options.next().ok_or(CommandError::SyntaxError)?;
                    let amount = parse_integer(amount)?;
                    if amount <= 0 {
                        return Err(CommandError::InvalidExpireTime("set".to_string()));
                    }

                    let deadline = if unit == "EX" {
                        deadline_from_secs("set", amount as u64)?
                    } else {
                        deadline_from_millis("set", amount as u64)?
                    };
                    expiration = SetExpiration::At(deadline);
                    expiration_seen = true;
                }
                "KEEPTTL" => {
                    if expiration_seen {
                        return Err(CommandError::SyntaxError);
                    }
                    expiration = SetExpiration::Keep;
                    expiration_seen = true;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            condition,
            expiration,
        })
    }
}

/// Handles the SET command.
///
/// Replaces whatever is stored at the key, regardless of its type. Replies
/// `OK`, or `Nil` when an NX or XX precondition prevents the write.
pub fn set(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;
    let store = ctx.store();

    let previous_expiration = store.get(&set_arguments.key).map(|value| value.expiration);

    match (set_arguments.condition, previous_expiration.is_some()) {
        (Some(SetCondition::IfAbsent), true) | (Some(SetCondition::IfPresent), false) => {
            return Ok(Reply::Nil);
        }
        _ => (),
    }

    let expiration = match set_arguments.expiration {
        SetExpiration::Clear => None,
        SetExpiration::Keep => previous_expiration.flatten(),
        SetExpiration::At(deadline) => Some(deadline),
    };

    store.insert(
        set_arguments.key,
        Value {
            data: DataType::String(set_arguments.value),
            expiration,
        },
    );

    Ok(Reply::ok())
}

pub fn get(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("get", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::bulk(value.data.as_string()?.as_str())),
        None => Ok(Reply::Nil),
    }
}

pub fn getset(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("getset", arguments, 2, Some(2))?;

    let store = ctx.store();
    let previous = match store.get(&arguments[0]) {
        Some(value) => Some(value.data.as_string()?.clone()),
        None => None,
    };

    store.set_data(&arguments[0], DataType::String(arguments[1].clone()));

    Ok(Reply::from_optional(previous))
}

pub fn setnx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("setnx", arguments, 2, Some(2))?;

    let store = ctx.store();
    if store.contains_key(&arguments[0]) {
        return Ok(Reply::Integer(0));
    }

    store.set_data(&arguments[0], DataType::String(arguments[1].clone()));

    Ok(Reply::Integer(1))
}

pub fn setex(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("setex", arguments, 3, Some(3))?;

    let seconds = parse_integer(&arguments[1])?;
    if seconds <= 0 {
        return Err(CommandError::InvalidExpireTime("setex".to_string()));
    }
    let deadline = deadline_from_secs("setex", seconds as u64)?;

    ctx.store().insert(
        arguments[0].clone(),
        Value {
            data: DataType::String(arguments[2].clone()),
            expiration: Some(deadline),
        },
    );

    Ok(Reply::ok())
}

pub fn mset(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    let pairs = into_pairs("mset", arguments)?;
    let store = ctx.store();

    for (key, value) in pairs {
        store.set_data(&key, DataType::String(value));
    }

    Ok(Reply::ok())
}

/// Sets every pair, or nothing at all if any key already exists.
pub fn msetnx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    let pairs = into_pairs("msetnx", arguments)?;
    let store = ctx.store();

    if pairs.iter().any(|(key, _)| store.contains_key(key)) {
        return Ok(Reply::Integer(0));
    }

    for (key, value) in pairs {
        store.set_data(&key, DataType::String(value));
    }

    Ok(Reply::Integer(1))
}

/// Missing keys and keys of another type both read as `Nil`.
pub fn mget(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("mget", arguments, 1, None)?;

    let store = ctx.store();
    let values = arguments
        .iter()
        .map(|key| match store.get(key).map(|value| value.data.as_string()) {
            Some(Ok(s)) => Reply::bulk(s.as_str()),
            _ => Reply::Nil,
        })
        .collect();

    Ok(Reply::Array(values))
}

pub fn strlen(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("strlen", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(value.data.as_string()?.len())),
        None => Ok(Reply::Integer(0)),
    }
}

/// Appends to a string, keeping its time to live.
pub fn append(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("append", arguments, 2, Some(2))?;

    let value = ctx
        .store()
        .get_or_insert_with(&arguments[0], || DataType::String(String::new()));
    let s = value.data.as_string_mut()?;
    s.push_str(&arguments[1]);

    Ok(Reply::from_len(s.len()))
}

/// Adds `delta` to the integer stored at `key`, keeping its time to live.
fn increment(ctx: &mut CommandContext, key: &str, delta: i64) -> Result<Reply, CommandError> {
    let store = ctx.store();

    let current = match store.get(key) {
        Some(value) => parse_integer(value.data.as_string()?)?,
        None => 0,
    };
    let next = current.checked_add(delta).ok_or(CommandError::Overflow)?;

    match store.get_mut(key) {
        Some(value) => value.data = DataType::String(next.to_string()),
        None => store.set_data(key, DataType::String(next.to_string())),
    }

    Ok(Reply::Integer(next))
}

pub fn incr(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("incr", arguments, 1, Some(1))?;

    increment(ctx, &arguments[0], 1)
}

pub fn decr(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("decr", arguments, 1, Some(1))?;

    increment(ctx, &arguments[0], -1)
}

pub fn incrby(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("incrby", arguments, 2, Some(2))?;

    let delta = parse_integer(&arguments[1])?;

    increment(ctx, &arguments[0], delta)
}

pub fn decrby(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("decrby", arguments, 2, Some(2))?;

    let delta = parse_integer(&arguments[1])?
        .checked_neg()
        .ok_or(CommandError::Overflow)?;

    increment(ctx, &arguments[0], delta)
}

pub fn incrbyfloat(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("incrbyfloat", arguments, 2, Some(2))?;

    let key = &arguments[0];
    let delta = parse_float(&arguments[1])?;
    let store = ctx.store();

    let current = match store.get(key) {
        Some(value) => parse_float(value.data.as_string()?)?,
        None => 0.0,
    };

    let next = current + delta;
    if !next.is_finite() {
        return Err(CommandError::NanOrInfinity);
    }
    let formatted = format_float(next);

    match store.get_mut(key) {
        Some(value) => value.data = DataType::String(formatted.clone()),
        None => store.set_data(key, DataType::String(formatted.clone())),
    }

    Ok(Reply::Bulk(formatted))
}
