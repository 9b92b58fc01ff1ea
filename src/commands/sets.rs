use std::collections::HashSet;

use rand::seq::IteratorRandom;

use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        CommandContext, CommandError,
    },
    key_value_store::DataType,
    reply::Reply,
};

fn sorted_members(set: &HashSet<String>) -> Vec<String> {
    let mut members: Vec<String> = set.iter().cloned().collect();
    members.sort();

    members
}

pub fn sadd(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("sadd", arguments, 2, None)?;

    let set = ctx
        .store()
        .get_or_insert_with(&arguments[0], || DataType::Set(HashSet::new()))
        .data
        .as_set_mut()?;

    let added = arguments[1..]
        .iter()
        .filter(|member| set.insert((*member).clone()))
        .count();

    Ok(Reply::from_len(added))
}

pub fn srem(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("srem", arguments, 2, None)?;

    let key = &arguments[0];
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::Integer(0));
    };
    let set = value.data.as_set_mut()?;

    let removed = arguments[1..]
        .iter()
        .filter(|member| set.remove(*member))
        .count();

    store.remove_if_empty(key);

    Ok(Reply::from_len(removed))
}

pub fn smembers(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("smembers", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_strings(sorted_members(value.data.as_set()?))),
        None => Ok(Reply::Array(Vec::new())),
    }
}

pub fn sismember(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("sismember", arguments, 2, Some(2))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_bool(
            value.data.as_set()?.contains(&arguments[1]),
        )),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn scard(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("scard", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(value.data.as_set()?.len())),
        None => Ok(Reply::Integer(0)),
    }
}

/// Without a count, one random member or `Nil`. With a count, up to that
/// many distinct members. Negative counts are rejected.
pub fn srandmember(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("srandmember", arguments, 1, Some(2))?;

    let count = match arguments.get(1) {
        Some(count) => {
            let count = parse_integer(count)?;
            Some(usize::try_from(count).map_err(|_| CommandError::NotInteger)?)
        }
        None => None,
    };

    let mut rng = rand::thread_rng();
    let value = ctx.store().get(&arguments[0]);

    match (value, count) {
        (None, None) => Ok(Reply::Nil),
        (None, Some(_)) => Ok(Reply::Array(Vec::new())),
        (Some(value), None) => {
            let set = value.data.as_set()?;
            Ok(Reply::from_optional(set.iter().choose(&mut rng).cloned()))
        }
        (Some(value), Some(count)) => {
            let set = value.data.as_set()?;
            let members = set.iter().choose_multiple(&mut rng, count);
            Ok(Reply::from_strings(members.into_iter().cloned()))
        }
    }
}

/// Moves a member between sets. Both keys are type checked before anything
/// changes.
pub fn smove(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("smove", arguments, 3, Some(3))?;

    let (source, destination, member) = (&arguments[0], &arguments[1], &arguments[2]);
    let store = ctx.store();

    if let Some(value) = store.get(destination) {
        value.data.as_set()?;
    }

    let Some(value) = store.get_mut(source) else {
        return Ok(Reply::Integer(0));
    };
    if !value.data.as_set_mut()?.remove(member) {
        return Ok(Reply::Integer(0));
    }
    store.remove_if_empty(source);

    store
        .get_or_insert_with(destination, || DataType::Set(HashSet::new()))
        .data
        .as_set_mut()?
        .insert(member.clone());

    Ok(Reply::Integer(1))
}

/// Members present in every given set. A missing key is the empty set.
pub fn sinter(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("sinter", arguments, 1, None)?;

    let store = ctx.store();
    let mut sets = Vec::with_capacity(arguments.len());

    for key in arguments {
        match store.get(key) {
            Some(value) => sets.push(value.data.as_set()?.clone()),
            None => sets.push(HashSet::new()),
        }
    }

    let Some((first, rest)) = sets.split_first() else {
        return Ok(Reply::Array(Vec::new()));
    };

    let common: HashSet<String> = first
        .iter()
        .filter(|member| rest.iter().all(|set| set.contains(*member)))
        .cloned()
        .collect();

    Ok(Reply::from_strings(sorted_members(&common)))
}
