use std::collections::VecDeque;

use crate::{
    blocking::PopDirection,
    commands::{
        command_utils::{
            check_arity, normalize_index, parse_count, parse_integer, validate_range_indexes,
        },
        CommandContext, CommandError,
    },
    key_value_store::DataType,
    reply::Reply,
};

/// Pushes every value in order, then lets one blocked pop take an element.
///
/// Pushing `a b c` to the front leaves `c` at the head, as if each value
/// had been pushed on its own.
fn push(
    ctx: &mut CommandContext,
    arguments: &[String],
    command: &str,
    direction: PopDirection,
    only_if_exists: bool,
) -> Result<Reply, CommandError> {
    check_arity(command, arguments, 2, None)?;

    let key = &arguments[0];
    let db = ctx.db();
    let store = ctx.store();

    if only_if_exists && !store.contains_key(key) {
        return Ok(Reply::Integer(0));
    }

    let list = store
        .get_or_insert_with(key, || DataType::List(VecDeque::new()))
        .data
        .as_list_mut()?;

    for value in &arguments[1..] {
        match direction {
            PopDirection::Front => list.push_front(value.clone()),
            PopDirection::Back => list.push_back(value.clone()),
        }
    }
    let len = list.len();

    let state = &mut *ctx.state;
    state.waiters.serve(db, key, &mut state.databases[db]);

    Ok(Reply::from_len(len))
}

pub fn lpush(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    push(ctx, arguments, "lpush", PopDirection::Front, false)
}

pub fn rpush(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    push(ctx, arguments, "rpush", PopDirection::Back, false)
}

pub fn lpushx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    push(ctx, arguments, "lpushx", PopDirection::Front, true)
}

pub fn rpushx(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    push(ctx, arguments, "rpushx", PopDirection::Back, true)
}

/// LPOP/RPOP with an optional count. With a count the reply is an array.
fn pop(
    ctx: &mut CommandContext,
    arguments: &[String],
    command: &str,
    direction: PopDirection,
) -> Result<Reply, CommandError> {
    check_arity(command, arguments, 1, Some(2))?;

    let key = &arguments[0];
    let count = arguments.get(1).map(|count| parse_count(count)).transpose()?;
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::Nil);
    };
    let list = value.data.as_list_mut()?;

    let reply = match count {
        None => Reply::from_optional(direction.pop(list)),
        Some(count) => {
            let popped: Vec<String> = (0..count).map_while(|_| direction.pop(list)).collect();
            Reply::from_strings(popped)
        }
    };

    store.remove_if_empty(key);

    Ok(reply)
}

pub fn lpop(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    pop(ctx, arguments, "lpop", PopDirection::Front)
}

pub fn rpop(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    pop(ctx, arguments, "rpop", PopDirection::Back)
}

pub fn llen(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("llen", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(value.data.as_list()?.len())),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn lindex(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("lindex", arguments, 2, Some(2))?;

    let index = parse_integer(&arguments[1])?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Nil);
    };
    let list = value.data.as_list()?;

    Ok(Reply::from_optional(
        normalize_index(list.len(), index).and_then(|index| list.get(index).cloned()),
    ))
}

pub fn lrange(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("lrange", arguments, 3, Some(3))?;

    let start_index = parse_integer(&arguments[1])?;
    let end_index = parse_integer(&arguments[2])?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Array(Vec::new()));
    };
    let list = value.data.as_list()?;

    match validate_range_indexes(list.len(), start_index, end_index) {
        Some((start, end)) => Ok(Reply::from_strings(list.range(start..=end).cloned())),
        None => Ok(Reply::Array(Vec::new())),
    }
}

pub fn lset(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("lset", arguments, 3, Some(3))?;

    let index = parse_integer(&arguments[1])?;

    let value = ctx
        .store()
        .get_mut(&arguments[0])
        .ok_or(CommandError::NoSuchKey)?;
    let list = value.data.as_list_mut()?;

    let index = normalize_index(list.len(), index).ok_or(CommandError::IndexOutOfRange)?;
    list[index] = arguments[2].clone();

    Ok(Reply::ok())
}

pub fn ltrim(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("ltrim", arguments, 3, Some(3))?;

    let key = &arguments[0];
    let start_index = parse_integer(&arguments[1])?;
    let end_index = parse_integer(&arguments[2])?;
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::ok());
    };
    let list = value.data.as_list_mut()?;

    match validate_range_indexes(list.len(), start_index, end_index) {
        Some((start, end)) => {
            list.truncate(end + 1);
            list.drain(..start);
        }
        None => list.clear(),
    }

    store.remove_if_empty(key);

    Ok(Reply::ok())
}

/// Removes occurrences of a value: from the head when `count > 0`, from the
/// tail when `count < 0`, all of them when `count == 0`.
pub fn lrem(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("lrem", arguments, 3, Some(3))?;

    let key = &arguments[0];
    let count = parse_integer(&arguments[1])?;
    let element = &arguments[2];
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::Integer(0));
    };
    let list = value.data.as_list_mut()?;

    let limit = if count == 0 {
        usize::MAX
    } else {
        count.unsigned_abs() as usize
    };
    let mut removed = 0;

    if count >= 0 {
        let mut kept = VecDeque::with_capacity(list.len());
        for item in list.drain(..) {
            if removed < limit && &item == element {
                removed += 1;
            } else {
                kept.push_back(item);
            }
        }
        *list = kept;
    } else {
        let mut kept = VecDeque::with_capacity(list.len());
        for item in list.drain(..).rev() {
            if removed < limit && &item == element {
                removed += 1;
            } else {
                kept.push_front(item);
            }
        }
        *list = kept;
    }

    store.remove_if_empty(key);

    Ok(Reply::from_len(removed))
}
