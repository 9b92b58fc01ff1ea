use crate::{
    commands::{command_utils::check_arity, CommandContext, CommandError},
    pub_sub::ClientEvent,
    reply::Reply,
};

fn reject_in_transaction(ctx: &CommandContext) -> Result<(), CommandError> {
    if ctx.in_transaction {
        return Err(CommandError::NotAllowedInTransaction);
    }

    Ok(())
}

/// Notifications go out on the client's own channel. A client that dropped
/// its receiver simply misses them.
fn notify(ctx: &CommandContext, event: ClientEvent) {
    let _ = ctx.session.events.send(event);
}

pub fn subscribe(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("subscribe", arguments, 1, None)?;
    reject_in_transaction(ctx)?;

    let mut count = 0;
    for channel in arguments {
        count = ctx
            .state
            .pub_sub
            .subscribe(ctx.session.id, &ctx.session.events, channel);
        notify(
            ctx,
            ClientEvent::Subscribe {
                channel: channel.clone(),
                count,
            },
        );
    }

    Ok(Reply::from_len(count))
}

pub fn psubscribe(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("psubscribe", arguments, 1, None)?;
    reject_in_transaction(ctx)?;

    let mut count = 0;
    for pattern in arguments {
        count = ctx
            .state
            .pub_sub
            .psubscribe(ctx.session.id, &ctx.session.events, pattern);
        notify(
            ctx,
            ClientEvent::PSubscribe {
                pattern: pattern.clone(),
                count,
            },
        );
    }

    Ok(Reply::from_len(count))
}

/// With no arguments every channel subscription is released, one
/// notification each.
pub fn unsubscribe(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    reject_in_transaction(ctx)?;

    let client_id = ctx.session.id;
    let channels = if arguments.is_empty() {
        ctx.state.pub_sub.channels(client_id)
    } else {
        arguments.to_vec()
    };

    for channel in channels {
        let count = ctx.state.pub_sub.unsubscribe(client_id, &channel);
        notify(ctx, ClientEvent::Unsubscribe { channel, count });
    }

    Ok(Reply::from_len(ctx.state.pub_sub.subscription_count(client_id)))
}

pub fn punsubscribe(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    reject_in_transaction(ctx)?;

    let client_id = ctx.session.id;
    let patterns = if arguments.is_empty() {
        ctx.state.pub_sub.patterns(client_id)
    } else {
        arguments.to_vec()
    };

    for pattern in patterns {
        let count = ctx.state.pub_sub.punsubscribe(client_id, &pattern);
        notify(ctx, ClientEvent::PUnsubscribe { pattern, count });
    }

    Ok(Reply::from_len(ctx.state.pub_sub.subscription_count(client_id)))
}

/// Delivery happens under the state lock, so two messages from the same
/// publisher always arrive in publish order.
pub fn publish(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("publish", arguments, 2, Some(2))?;

    let receivers = ctx.state.pub_sub.publish(&arguments[0], &arguments[1]);

    Ok(Reply::from_len(receivers))
}
