use crate::{
    commands::{CommandError, CommandHandler},
    connection::Client,
    reply::Reply,
    transactions::{run_transaction_commands, CommandCallback, QueuedCommand},
};

/// A batch of commands bound to one client.
///
/// Nothing is validated when queued; every error surfaces for its own
/// command at [`exec`](Multi::exec) time. Once executed or
/// discarded the batch is spent, and a second `exec` or `discard` fails
/// without running anything.
pub struct Multi<'a> {
    client: &'a mut Client,
    queue: Vec<QueuedCommand>,
    finished: bool,
}

impl<'a> Multi<'a> {
    pub(crate) fn new(client: &'a mut Client, queue: Vec<QueuedCommand>) -> Self {
        Self {
            client,
            queue,
            finished: false,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues a command.
    pub fn queue<I, S>(&mut self, name: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.push(name, args, None)
    }

    /// Queues a command whose outcome is also handed to `callback` as it runs.
    pub fn queue_with<I, S, F>(&mut self, name: &str, args: I, callback: F) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
        F: FnOnce(&Result<Reply, CommandError>) + Send + 'static,
    {
        self.push(name, args, Some(Box::new(callback)))
    }

    fn push<I, S>(&mut self, name: &str, args: I, callback: Option<CommandCallback>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let arguments = args.into_iter().map(|arg| arg.to_string()).collect();
        self.queue.push(QueuedCommand {
            command: CommandHandler::new(name, arguments),
            callback,
        });

        self
    }

    /// Drops the queue. No callback registered so far will ever fire.
    pub fn discard(&mut self) -> Result<(), CommandError> {
        if self.finished {
            return Err(CommandError::DiscardWithoutMulti);
        }

        self.finished = true;
        self.queue.clear();

        Ok(())
    }

    /// Runs the queue atomically and returns every command's outcome in order.
    pub async fn exec(&mut self) -> Result<Vec<Result<Reply, CommandError>>, CommandError> {
        if self.finished {
            return Err(CommandError::ExecWithoutMulti);
        }
        self.finished = true;

        let commands = std::mem::take(&mut self.queue);
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let (state, session) = self.client.parts();
        let mut state = state.lock().await;

        Ok(run_transaction_commands(&mut state, session, commands))
    }
}
