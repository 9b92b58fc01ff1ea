use std::time::Duration;

use redis_emulator::{ClientEvent, CommandError, Reply};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::test_utils::{TestEnv, TestUtils, NO_ARGS};

fn drain(events: &mut UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }

    drained
}

fn message(channel: &str, message: &str) -> ClientEvent {
    ClientEvent::Message {
        channel: channel.to_string(),
        message: message.to_string(),
    }
}

#[tokio::test]
async fn test_new_client_reports_connect_then_ready() {
    let mut env = TestEnv::new();

    let mut events = env.client.events().unwrap();
    assert_eq!(drain(&mut events), vec![ClientEvent::Connect, ClientEvent::Ready]);
    assert!(env.client.events().is_none());
}

#[tokio::test]
async fn test_subscribe_reports_each_channel() {
    let mut env = TestEnv::new();
    let mut events = env.client.events().unwrap();
    drain(&mut events);

    env.exec_command_ok("SUBSCRIBE", ["a", "b", "a"], TestUtils::integer(2))
        .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::Subscribe {
                channel: "a".to_string(),
                count: 1
            },
            ClientEvent::Subscribe {
                channel: "b".to_string(),
                count: 2
            },
            ClientEvent::Subscribe {
                channel: "a".to_string(),
                count: 2
            },
        ]
    );
}

#[tokio::test]
async fn test_publish_delivers_in_order_and_counts_receivers() {
    let mut env = TestEnv::new();
    let mut subscriber = env.new_client();
    let mut events = subscriber.events().unwrap();

    subscriber.call("SUBSCRIBE", ["news"]).await.unwrap();
    drain(&mut events);

    env.exec_command_ok("PUBLISH", ["news", "first"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("PUBLISH", ["news", "second"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("PUBLISH", ["sports", "ignored"], TestUtils::integer(0))
        .await;

    assert_eq!(
        drain(&mut events),
        vec![message("news", "first"), message("news", "second")]
    );
}

#[tokio::test]
async fn test_publish_waits_for_a_receiving_task() {
    let mut env = TestEnv::new();
    let mut subscriber = env.new_client();
    let mut events = subscriber.events().unwrap();
    subscriber.call("SUBSCRIBE", ["jobs"]).await.unwrap();
    drain(&mut events);

    let listener = tokio::spawn(async move {
        let event = events.recv().await;
        (event, subscriber)
    });

    TestUtils::sleep_ms(20).await;
    env.call("PUBLISH", ["jobs", "run"]).await.unwrap();

    let (event, _subscriber) = tokio::time::timeout(Duration::from_secs(1), listener)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, Some(message("jobs", "run")));
}

#[tokio::test]
async fn test_pattern_subscription() {
    let mut env = TestEnv::new();
    let mut subscriber = env.new_client();
    let mut events = subscriber.events().unwrap();

    assert_eq!(
        subscriber.call("PSUBSCRIBE", ["h*llo\\*"]).await,
        Ok(TestUtils::integer(1))
    );
    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::Connect,
            ClientEvent::Ready,
            ClientEvent::PSubscribe {
                pattern: "h*llo\\*".to_string(),
                count: 1
            },
        ]
    );

    env.exec_command_ok("PUBLISH", ["hello*", "a"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("PUBLISH", ["heeello*", "b"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("PUBLISH", ["hello", "c"], TestUtils::integer(0))
        .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::PMessage {
                pattern: "h*llo\\*".to_string(),
                channel: "hello*".to_string(),
                message: "a".to_string(),
            },
            ClientEvent::PMessage {
                pattern: "h*llo\\*".to_string(),
                channel: "heeello*".to_string(),
                message: "b".to_string(),
            },
        ]
    );

    assert_eq!(
        subscriber.call("PUNSUBSCRIBE", NO_ARGS).await,
        Ok(TestUtils::integer(0))
    );
    assert_eq!(
        drain(&mut events),
        vec![ClientEvent::PUnsubscribe {
            pattern: "h*llo\\*".to_string(),
            count: 0
        }]
    );
}

#[tokio::test]
async fn test_channel_and_pattern_both_deliver() {
    let mut env = TestEnv::new();
    let mut subscriber = env.new_client();
    let mut events = subscriber.events().unwrap();

    subscriber.call("SUBSCRIBE", ["news"]).await.unwrap();
    subscriber.call("PSUBSCRIBE", ["n*"]).await.unwrap();
    drain(&mut events);

    env.exec_command_ok("PUBLISH", ["news", "hi"], TestUtils::integer(2))
        .await;
    assert_eq!(drain(&mut events).len(), 2);
}

#[tokio::test]
async fn test_subscriber_mode_restricts_commands() {
    let mut env = TestEnv::new();

    env.call("SUBSCRIBE", ["news"]).await.unwrap();

    env.exec_command_err("SET", ["k", "v"], CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_err("PUBLISH", ["news", "x"], CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_ok("PING", NO_ARGS, TestUtils::status("PONG"))
        .await;
    env.exec_command_ok("PSUBSCRIBE", ["n*"], TestUtils::integer(2))
        .await;

    env.exec_command_ok("UNSUBSCRIBE", NO_ARGS, TestUtils::integer(1))
        .await;
    env.exec_command_err("GET", ["k"], CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_ok("PUNSUBSCRIBE", ["n*"], TestUtils::integer(0))
        .await;

    env.exec_command_ok("SET", ["k", "v"], TestUtils::ok()).await;
}

#[tokio::test]
async fn test_subscriber_mode_rejects_transactions() {
    let mut env = TestEnv::new();

    env.call("SUBSCRIBE", ["news"]).await.unwrap();

    env.exec_command_err("MULTI", NO_ARGS, CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_err("PUBLISH", ["news", "x"], CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_err("EXEC", NO_ARGS, CommandError::SubscriberModeViolation)
        .await;
    env.exec_command_err("DISCARD", NO_ARGS, CommandError::SubscriberModeViolation)
        .await;

    env.call("UNSUBSCRIBE", NO_ARGS).await.unwrap();
    env.exec_command_err("EXEC", NO_ARGS, CommandError::ExecWithoutMulti)
        .await;
    env.exec_command_ok("MULTI", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("PUBLISH", ["news", "x"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_ok("EXEC", NO_ARGS, Reply::Array(vec![TestUtils::integer(0)]))
        .await;
}

#[tokio::test]
async fn test_unsubscribe_all_reports_every_channel() {
    let mut env = TestEnv::new();
    let mut events = env.client.events().unwrap();

    env.call("SUBSCRIBE", ["a", "b", "c"]).await.unwrap();
    drain(&mut events);

    env.exec_command_ok("UNSUBSCRIBE", NO_ARGS, TestUtils::integer(0))
        .await;

    let unsubscribed = drain(&mut events);
    assert_eq!(unsubscribed.len(), 3);
    assert_eq!(
        unsubscribed.last(),
        Some(&ClientEvent::Unsubscribe {
            channel: "c".to_string(),
            count: 0
        })
    );

    env.exec_command_ok("UNSUBSCRIBE", NO_ARGS, TestUtils::integer(0))
        .await;
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_dropped_client_releases_subscriptions() {
    let mut env = TestEnv::new();

    let mut subscriber = env.new_client();
    subscriber.call("SUBSCRIBE", ["news"]).await.unwrap();
    env.exec_command_ok("PUBLISH", ["news", "hi"], TestUtils::integer(1))
        .await;

    drop(subscriber);
    TestUtils::sleep_ms(10).await;

    env.exec_command_ok("PUBLISH", ["news", "hi"], TestUtils::integer(0))
        .await;
}

#[tokio::test]
async fn test_channels_do_not_touch_keys() {
    let mut env = TestEnv::new();
    let mut subscriber = env.new_client();

    subscriber.call("SUBSCRIBE", ["news"]).await.unwrap();
    env.exec_command_ok("EXISTS", ["news"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("DBSIZE", NO_ARGS, TestUtils::integer(0))
        .await;
}
