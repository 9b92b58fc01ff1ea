use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        CommandContext, CommandError,
    },
    reply::Reply,
};

pub fn ping(_ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("ping", arguments, 0, Some(1))?;

    match arguments.first() {
        Some(message) => Ok(Reply::bulk(message.as_str())),
        None => Ok(Reply::Status("PONG".to_string())),
    }
}

pub fn echo(arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("echo", arguments, 1, Some(1))?;

    Ok(Reply::bulk(arguments[0].as_str()))
}

/// Credentials are not checked.
pub fn auth(arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("auth", arguments, 1, Some(2))?;

    Ok(Reply::ok())
}

pub fn select(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("select", arguments, 1, Some(1))?;

    let index = parse_integer(&arguments[0])?;
    let index = usize::try_from(index)
        .ok()
        .filter(|index| *index < ctx.state.database_count())
        .ok_or(CommandError::InvalidDbIndex)?;

    ctx.session.db = index;

    Ok(Reply::ok())
}

pub fn dbsize(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("dbsize", arguments, 0, Some(0))?;

    Ok(Reply::from_len(ctx.store().len()))
}

pub fn flushdb(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("flushdb", arguments, 0, Some(1))?;

    ctx.store().clear();

    Ok(Reply::ok())
}

pub fn flushall(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("flushall", arguments, 0, Some(1))?;

    for store in ctx.state.databases.iter_mut() {
        store.clear();
    }

    Ok(Reply::ok())
}
