use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        CommandContext, CommandError,
    },
    expiry::{self, deadline_from_millis, deadline_from_secs},
    glob::GlobPattern,
    reply::Reply,
};

pub fn del(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("del", arguments, 1, None)?;

    let store = ctx.store();
    let removed = arguments
        .iter()
        .filter(|key| store.remove(key).is_some())
        .count();

    Ok(Reply::from_len(removed))
}

/// A key named twice is counted twice.
pub fn exists(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("exists", arguments, 1, None)?;

    let store = ctx.store();
    let found = arguments
        .iter()
        .filter(|key| store.contains_key(key))
        .count();

    Ok(Reply::from_len(found))
}

pub fn type_command(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("type", arguments, 1, Some(1))?;

    let type_name = match ctx.store().get(&arguments[0]) {
        Some(value) => value.data.type_name(),
        None => "none",
    };

    Ok(Reply::Status(type_name.to_string()))
}

/// Handles EXPIRE (seconds) and PEXPIRE (milliseconds).
///
/// A duration that is zero or negative deletes the key straight away.
pub fn expire(
    ctx: &mut CommandContext,
    arguments: &[String],
    command: &str,
) -> Result<Reply, CommandError> {
    check_arity(command, arguments, 2, Some(2))?;

    let key = &arguments[0];
    let amount = parse_integer(&arguments[1])?;
    let store = ctx.store();

    if !store.contains_key(key) {
        return Ok(Reply::Integer(0));
    }

    if amount <= 0 {
        store.remove(key);
        return Ok(Reply::Integer(1));
    }

    let deadline = if command == "EXPIRE" {
        deadline_from_secs(command, amount as u64)?
    } else {
        deadline_from_millis(command, amount as u64)?
    };

    if let Some(value) = store.get_mut(key) {
        value.expiration = Some(deadline);
    }

    Ok(Reply::Integer(1))
}

pub fn persist(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("persist", arguments, 1, Some(1))?;

    let cleared = ctx
        .store()
        .get_mut(&arguments[0])
        .and_then(|value| value.expiration.take())
        .is_some();

    Ok(Reply::from_bool(cleared))
}

pub fn ttl(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("ttl", arguments, 1, Some(1))?;

    Ok(Reply::Integer(
        ctx.store().get(&arguments[0]).map_or(-2, expiry::ttl),
    ))
}

pub fn pttl(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("pttl", arguments, 1, Some(1))?;

    Ok(Reply::Integer(
        ctx.store().get(&arguments[0]).map_or(-2, expiry::pttl),
    ))
}

pub fn keys(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("keys", arguments, 1, Some(1))?;

    let pattern = GlobPattern::new(&arguments[0]);
    let keys = ctx
        .store()
        .keys()
        .into_iter()
        .filter(|key| pattern.is_match(key));

    Ok(Reply::from_strings(keys))
}

/// Moves the value, and its time to live, to a new key.
pub fn rename(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("rename", arguments, 2, Some(2))?;

    let store = ctx.store();
    let value = store.remove(&arguments[0]).ok_or(CommandError::NoSuchKey)?;
    store.insert(arguments[1].clone(), value);

    Ok(Reply::ok())
}

pub fn renamenx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("renamenx", arguments, 2, Some(2))?;

    let store = ctx.store();
    if !store.contains_key(&arguments[0]) {
        return Err(CommandError::NoSuchKey);
    }
    if store.contains_key(&arguments[1]) {
        return Ok(Reply::Integer(0));
    }

    if let Some(value) = store.remove(&arguments[0]) {
        store.insert(arguments[1].clone(), value);
    }

    Ok(Reply::Integer(1))
}
