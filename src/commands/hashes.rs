use std::collections::HashMap;

use crate::{
    commands::{
        command_utils::{check_arity, into_pairs, parse_float, parse_integer},
        CommandContext, CommandError,
    },
    key_value_store::DataType,
    reply::{format_float, Reply},
};

/// Writes field/value pairs, returning how many fields were new.
fn write_fields(
    ctx: &mut CommandContext,
    key: &str,
    pairs: Vec<(String, String)>,
) -> Result<usize, CommandError> {
    let hash = ctx
        .store()
        .get_or_insert_with(key, || DataType::Hash(HashMap::new()))
        .data
        .as_hash_mut()?;

    Ok(pairs
        .into_iter()
        .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
        .count())
}

/// Sorted field/value pairs, so replies are deterministic.
fn sorted_pairs(hash: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut pairs: Vec<(&String, &String)> = hash.iter().collect();
    pairs.sort();

    pairs
}

pub fn hset(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hset", arguments, 3, None)?;

    let pairs = into_pairs("hset", &arguments[1..])?;
    let created = write_fields(ctx, &arguments[0], pairs)?;

    Ok(Reply::from_len(created))
}

pub fn hmset(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hmset", arguments, 3, None)?;

    let pairs = into_pairs("hmset", &arguments[1..])?;
    write_fields(ctx, &arguments[0], pairs)?;

    Ok(Reply::ok())
}

pub fn hsetnx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hsetnx", arguments, 3, Some(3))?;

    let hash = ctx
        .store()
        .get_or_insert_with(&arguments[0], || DataType::Hash(HashMap::new()))
        .data
        .as_hash_mut()?;

    if hash.contains_key(&arguments[1]) {
        return Ok(Reply::Integer(0));
    }
    hash.insert(arguments[1].clone(), arguments[2].clone());

    Ok(Reply::Integer(1))
}

pub fn hget(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hget", arguments, 2, Some(2))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_optional(
            value.data.as_hash()?.get(&arguments[1]).cloned(),
        )),
        None => Ok(Reply::Nil),
    }
}

/// Alternating fields and values. A missing key replies `Nil`.
pub fn hgetall(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hgetall", arguments, 1, Some(1))?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Nil);
    };

    let items = sorted_pairs(value.data.as_hash()?)
        .into_iter()
        .flat_map(|(field, value)| [Reply::bulk(field.as_str()), Reply::bulk(value.as_str())])
        .collect();

    Ok(Reply::Array(items))
}

pub fn hdel(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hdel", arguments, 2, None)?;

    let key = &arguments[0];
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::Integer(0));
    };
    let hash = value.data.as_hash_mut()?;

    let removed = arguments[1..]
        .iter()
        .filter(|field| hash.remove(*field).is_some())
        .count();

    store.remove_if_empty(key);

    Ok(Reply::from_len(removed))
}

pub fn hexists(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hexists", arguments, 2, Some(2))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_bool(
            value.data.as_hash()?.contains_key(&arguments[1]),
        )),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn hlen(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hlen", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(value.data.as_hash()?.len())),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn hstrlen(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hstrlen", arguments, 2, Some(2))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(
            value.data.as_hash()?.get(&arguments[1]).map_or(0, String::len),
        )),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn hkeys(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hkeys", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_strings(
            sorted_pairs(value.data.as_hash()?)
                .into_iter()
                .map(|(field, _)| field.clone()),
        )),
        None => Ok(Reply::Array(Vec::new())),
    }
}

pub fn hvals(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hvals", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_strings(
            sorted_pairs(value.data.as_hash()?)
                .into_iter()
                .map(|(_, value)| value.clone()),
        )),
        None => Ok(Reply::Array(Vec::new())),
    }
}

pub fn hmget(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hmget", arguments, 2, None)?;

    let fields = &arguments[1..];

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Array(vec![Reply::Nil; fields.len()]));
    };
    let hash = value.data.as_hash()?;

    Ok(Reply::Array(
        fields
            .iter()
            .map(|field| Reply::from_optional(hash.get(field).cloned()))
            .collect(),
    ))
}

/// Reads a field for an increment, validating the key's type first.
fn current_field<'a>(
    ctx: &'a mut CommandContext,
    key: &str,
    field: &str,
) -> Result<Option<&'a String>, CommandError> {
    match ctx.store().get(key) {
        Some(value) => Ok(value.data.as_hash()?.get(field)),
        None => Ok(None),
    }
}

pub fn hincrby(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hincrby", arguments, 3, Some(3))?;

    let (key, field) = (&arguments[0], &arguments[1]);
    let delta = parse_integer(&arguments[2])?;

    let current = match current_field(ctx, key, field)? {
        Some(current) => parse_integer(current)?,
        None => 0,
    };
    let next = current.checked_add(delta).ok_or(CommandError::Overflow)?;

    write_fields(ctx, key, vec![(field.clone(), next.to_string())])?;

    Ok(Reply::Integer(next))
}

pub fn hincrbyfloat(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("hincrbyfloat", arguments, 3, Some(3))?;

    let (key, field) = (&arguments[0], &arguments[1]);
    let delta = parse_float(&arguments[2])?;

    let current = match current_field(ctx, key, field)? {
        Some(current) => parse_float(current)?,
        None => 0.0,
    };
    let next = current + delta;
    if !next.is_finite() {
        return Err(CommandError::NanOrInfinity);
    }

    let formatted = format_float(next);
    write_fields(ctx, key, vec![(field.clone(), formatted.clone())])?;

    Ok(Reply::Bulk(formatted))
}
