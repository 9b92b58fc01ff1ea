use std::{collections::HashMap, sync::Arc};

use tokio::{
    runtime::Handle,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        Mutex,
    },
};

use crate::{
    commands::{CommandError, CommandHandler, CommandResult},
    pub_sub::ClientEvent,
    reply::Reply,
    state::State,
    transactions::{run_transaction_commands, Multi, QueuedCommand},
};

/// Per-client context handed to command handlers.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    /// Index of the selected database.
    pub db: usize,
    /// Default COUNT for the SCAN family.
    pub scan_count: usize,
    pub events: UnboundedSender<ClientEvent>,
}

/// A handle onto the engine, one per logical connection.
///
/// Every call takes the shared state lock for as long as the command runs.
/// Only BLPOP and BRPOP wait, and they do so with the lock released.
#[derive(Debug)]
pub struct Client {
    session: Session,
    state: Arc<Mutex<State>>,
    events: Option<UnboundedReceiver<ClientEvent>>,
    /// Commands queued between MULTI and EXEC.
    queued: Option<Vec<CommandHandler>>,
    /// Set when a command was rejected while queueing. EXEC then discards.
    queue_aborted: bool,
}

impl Client {
    pub(crate) fn new(id: u64, state: Arc<Mutex<State>>, scan_count: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let _ = sender.send(ClientEvent::Connect);
        let _ = sender.send(ClientEvent::Ready);

        Client {
            session: Session {
                id,
                db: 0,
                scan_count,
                events: sender,
            },
            state,
            events: Some(receiver),
            queued: None,
            queue_aborted: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.session.id
    }

    pub fn selected_db(&self) -> usize {
        self.session.db
    }

    /// Takes the receiving end of this client's notifications. Only the
    /// first call returns it.
    pub fn events(&mut self) -> Option<UnboundedReceiver<ClientEvent>> {
        self.events.take()
    }

    pub(crate) fn parts(&mut self) -> (&Mutex<State>, &mut Session) {
        (&self.state, &mut self.session)
    }

    /// Runs one command.
    ///
    /// The name is case-insensitive. Arguments may be given as any
    /// collection of displayable values, so `["k", "v"]`, `vec![k, v]` and
    /// `[1, 2]` all reach the engine as the same strings.
    pub async fn call<I, S>(&mut self, name: &str, args: I) -> Result<Reply, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let arguments: Vec<String> = args.into_iter().map(|arg| arg.to_string()).collect();
        let command = CommandHandler::new(name, arguments);

        if let Some(reply) = self.handle_transaction_command(&command).await? {
            return Ok(reply);
        }

        let result = {
            let mut state = self.state.lock().await;
            command.handle(&mut state, &mut self.session, false)?
        };

        match result {
            CommandResult::Response(reply) => Ok(reply),
            CommandResult::Blocked(pending) => Ok(pending.resolve(&self.state).await),
        }
    }

    /// MULTI, EXEC and DISCARD issued as plain commands, plus queueing of
    /// everything in between. `None` means the command should run now.
    async fn handle_transaction_command(
        &mut self,
        command: &CommandHandler,
    ) -> Result<Option<Reply>, CommandError> {
        let is_control = matches!(command.name.as_str(), "MULTI" | "EXEC" | "DISCARD");
        if !is_control && self.queued.is_none() {
            return Ok(None);
        }

        if !command.is_subscriber_command()
            && self.state.lock().await.pub_sub.is_subscribed(self.session.id)
        {
            return Err(CommandError::SubscriberModeViolation);
        }

        match command.name.as_str() {
            "MULTI" => {
                if self.queued.is_some() {
                    return Err(CommandError::NestedMulti);
                }
                self.queued = Some(Vec::new());
                self.queue_aborted = false;

                Ok(Some(Reply::ok()))
            }
            "EXEC" => {
                let Some(commands) = self.queued.take() else {
                    return Err(CommandError::ExecWithoutMulti);
                };
                if std::mem::take(&mut self.queue_aborted) {
                    tracing::debug!(client = self.session.id, "discarding aborted transaction");
                    return Err(CommandError::ExecAbort);
                }

                let mut state = self.state.lock().await;
                let replies = run_transaction_commands(
                    &mut state,
                    &mut self.session,
                    commands.into_iter().map(QueuedCommand::new).collect(),
                )
                .into_iter()
                .map(|outcome| outcome.unwrap_or_else(|e| Reply::Error(e.to_string())))
                .collect();

                Ok(Some(Reply::Array(replies)))
            }
            "DISCARD" => match self.queued.take() {
                Some(_) => {
                    self.queue_aborted = false;
                    Ok(Some(Reply::ok()))
                }
                None => Err(CommandError::DiscardWithoutMulti),
            },
            _ => {
                let Some(queued) = self.queued.as_mut() else {
                    return Ok(None);
                };

                if let Err(e) = command.validate() {
                    self.queue_aborted = true;
                    return Err(e);
                }
                queued.push(command.clone());

                Ok(Some(Reply::Status("QUEUED".to_string())))
            }
        }
    }

    /// Starts an empty batch.
    pub fn multi(&mut self) -> Multi<'_> {
        Multi::new(self, Vec::new())
    }

    /// Starts a batch from a prebuilt list of `(command, arguments)`.
    pub fn batch<N, I, S>(&mut self, commands: I) -> Multi<'_>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, Vec<S>)>,
        S: ToString,
    {
        let queue = commands
            .into_iter()
            .map(|(name, args)| {
                let arguments = args.iter().map(|arg| arg.to_string()).collect();
                QueuedCommand::new(CommandHandler::new(name.as_ref(), arguments))
            })
            .collect();

        Multi::new(self, queue)
    }

    /// HSET for a single field. True if the field was created.
    pub async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<bool, CommandError> {
        let reply = self.call("HSET", [key, field, value]).await?;

        Ok(reply.as_integer() == Some(1))
    }

    /// HMSET from ordered field/value pairs, such as a map's entries.
    pub async fn hmset<P, F, V>(&mut self, key: &str, pairs: P) -> Result<(), CommandError>
    where
        P: IntoIterator<Item = (F, V)>,
        F: ToString,
        V: ToString,
    {
        let mut arguments = vec![key.to_string()];
        for (field, value) in pairs {
            arguments.push(field.to_string());
            arguments.push(value.to_string());
        }

        self.call("HMSET", arguments).await?;

        Ok(())
    }

    /// HGETALL as a map. `None` when the key does not exist.
    pub async fn hgetall(
        &mut self,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>, CommandError> {
        let reply = self.call("HGETALL", [key]).await?;

        if reply.is_nil() {
            return Ok(None);
        }

        let items = reply.into_strings();
        Ok(Some(
            items
                .chunks(2)
                .filter_map(|pair| match pair {
                    [field, value] => Some((field.clone(), value.clone())),
                    _ => None,
                })
                .collect(),
        ))
    }

    pub async fn hincrby(
        &mut self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, CommandError> {
        let arguments = [key.to_string(), field.to_string(), delta.to_string()];
        let reply = self.call("HINCRBY", arguments).await?;

        reply.as_integer().ok_or(CommandError::NotInteger)
    }

    /// SADD, returning how many members were new.
    pub async fn sadd<I, S>(&mut self, key: &str, members: I) -> Result<i64, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let arguments: Vec<String> = std::iter::once(key.to_string())
            .chain(members.into_iter().map(|member| member.to_string()))
            .collect();
        let reply = self.call("SADD", arguments).await?;

        reply.as_integer().ok_or(CommandError::NotInteger)
    }
}

impl Drop for Client {
    /// Releases this client's subscriptions.
    fn drop(&mut self) {
        let id = self.session.id;

        if let Ok(mut state) = self.state.try_lock() {
            state.pub_sub.remove_client(id);
            return;
        }

        match Handle::try_current() {
            Ok(runtime) => {
                let state = Arc::clone(&self.state);
                runtime.spawn(async move {
                    state.lock().await.pub_sub.remove_client(id);
                });
            }
            Err(_) => tracing::warn!(client = id, "no runtime to release subscriptions"),
        }
    }
}
