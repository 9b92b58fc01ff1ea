//! Atomic command batches.
//!
//! A batch runs under one acquisition of the state lock, so nothing else
//! touches the engine between its first and last command. A failing command
//! records its error and the rest of the batch still runs.

mod multi;

pub use multi::Multi;

use crate::{
    commands::{CommandError, CommandHandler, CommandResult},
    connection::Session,
    reply::Reply,
    state::State,
};

/// Fired with a command's own outcome the moment it runs inside the batch.
pub type CommandCallback = Box<dyn FnOnce(&Result<Reply, CommandError>) + Send>;

pub struct QueuedCommand {
    pub command: CommandHandler,
    pub callback: Option<CommandCallback>,
}

impl QueuedCommand {
    pub fn new(command: CommandHandler) -> Self {
        Self {
            command,
            callback: None,
        }
    }
}

/// Runs queued commands in order with the lock already held.
pub fn run_transaction_commands(
    state: &mut State,
    session: &mut Session,
    commands: Vec<QueuedCommand>,
) -> Vec<Result<Reply, CommandError>> {
    tracing::debug!(client = session.id, commands = commands.len(), "running transaction");

    let mut responses = Vec::with_capacity(commands.len());

    for QueuedCommand { command, callback } in commands {
        let outcome = match command.handle(state, session, true) {
            Ok(CommandResult::Response(reply)) => Ok(reply),
            Ok(CommandResult::Blocked(pending)) => {
                // handlers never suspend inside a batch
                state.waiters.remove(pending.id);
                Ok(Reply::Nil)
            }
            Err(e) => Err(e),
        };

        if let Some(callback) = callback {
            callback(&outcome);
        }
        responses.push(outcome);
    }

    responses
}
