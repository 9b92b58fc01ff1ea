use std::time::Duration;

use tokio::time::Instant;

use crate::{
    blocking::{PendingPop, PopDirection},
    commands::{command_utils::check_arity, CommandContext, CommandError, CommandResult},
    reply::Reply,
};

/// Represents the parsed arguments for BLPOP and BRPOP.
pub struct BlockingPopArguments {
    /// Keys to try, in argument order
    keys: Vec<String>,
    /// How long to wait. `None` waits until a push arrives
    timeout: Option<Duration>,
}

impl BlockingPopArguments {
    /// Parses `key [key ...] timeout` for BLPOP and BRPOP.
    ///
    /// # Arguments
    ///
    /// * `command` - The command name, used in arity errors
    /// * `arguments` - One or more keys followed by a timeout in seconds,
    ///   which may be fractional
    ///
    /// # Returns
    ///
    /// * `Ok(BlockingPopArguments)` - A timeout of zero becomes `None` and blocks forever
    /// * `Err(CommandError::BadArity)` - If there is no key
    /// * `Err(CommandError::InvalidTimeout)` - If the timeout is not a finite number
    /// * `Err(CommandError::NegativeTimeout)` - If the timeout is below zero
    pub fn parse(command: &str, arguments: &[String]) -> Result<Self, CommandError> {
        check_arity(command, arguments, 2, None)?;

        let (timeout, keys) = arguments
            .split_last()
            .ok_or_else(|| CommandError::bad_arity(command))?;

        let seconds = match timeout.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => seconds,
            _ => return Err(CommandError::InvalidTimeout),
        };
        if seconds < 0.0 {
            return Err(CommandError::NegativeTimeout);
        }

        let timeout = if seconds == 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidTimeout)?)
        };

        Ok(Self {
            keys: keys.to_vec(),
            timeout,
        })
    }
}

/// Pops from the first non-empty list, or registers a waiter.
///
/// Inside a transaction nothing may suspend, so an empty result is `Nil`.
fn blocking_pop(
    ctx: &mut CommandContext,
    arguments: &[String],
    command: &str,
    direction: PopDirection,
) -> Result<CommandResult, CommandError> {
    let pop_arguments = BlockingPopArguments::parse(command, arguments)?;
    let store = ctx.store();

    for key in &pop_arguments.keys {
        let Some(value) = store.get_mut(key) else {
            continue;
        };

        if let Some(element) = direction.pop(value.data.as_list_mut()?) {
            store.remove_if_empty(key);
            return Ok(CommandResult::Response(Reply::from_strings([
                key.clone(),
                element,
            ])));
        }
    }

    if ctx.in_transaction {
        return Ok(CommandResult::Response(Reply::Nil));
    }

    // a timeout the clock cannot represent is as good as forever
    let deadline = pop_arguments
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout));

    let db = ctx.db();
    let (id, receiver) = ctx.state.waiters.register(db, pop_arguments.keys, direction);

    Ok(CommandResult::Blocked(PendingPop {
        id,
        receiver,
        deadline,
    }))
}

pub fn blpop(ctx: &mut CommandContext, arguments: &[String]) -> Result<CommandResult, CommandError> {
    blocking_pop(ctx, arguments, "blpop", PopDirection::Front)
}

pub fn brpop(ctx: &mut CommandContext, arguments: &[String]) -> Result<CommandResult, CommandError> {
    blocking_pop(ctx, arguments, "brpop", PopDirection::Back)
}
