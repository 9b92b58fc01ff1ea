use std::sync::{Arc, Mutex};

use redis_emulator::{CommandError, Reply};

use crate::test_utils::{TestEnv, TestUtils, NO_ARGS};

#[tokio::test]
async fn test_exec_runs_commands_in_order_with_callbacks() {
    let mut env = TestEnv::new();
    let seen: Arc<Mutex<Vec<Result<Reply, CommandError>>>> = Arc::new(Mutex::new(Vec::new()));

    let mut multi = env.client.multi();
    let first = Arc::clone(&seen);
    multi.queue_with("SET", ["foo", "0"], move |outcome| {
        first.lock().unwrap().push(outcome.clone());
    });
    let second = Arc::clone(&seen);
    multi.queue_with("INCR", ["foo"], move |outcome| {
        second.lock().unwrap().push(outcome.clone());
    });
    assert_eq!(multi.len(), 2);

    let outcomes = multi.exec().await.unwrap();

    let expected = vec![Ok(TestUtils::ok()), Ok(TestUtils::integer(1))];
    assert_eq!(outcomes, expected);
    assert_eq!(*seen.lock().unwrap(), expected);

    env.exec_command_ok("GET", ["foo"], TestUtils::bulk("1")).await;
}

#[tokio::test]
async fn test_discard_drops_queue_and_callbacks() {
    let mut env = TestEnv::new();
    let fired = Arc::new(Mutex::new(false));

    let mut multi = env.client.multi();
    let flag = Arc::clone(&fired);
    multi.queue_with("SET", ["foo", "bar"], move |_| {
        *flag.lock().unwrap() = true;
    });
    multi.discard().unwrap();

    assert_eq!(multi.exec().await, Err(CommandError::ExecWithoutMulti));
    assert_eq!(multi.discard(), Err(CommandError::DiscardWithoutMulti));
    assert!(!*fired.lock().unwrap());

    env.exec_command_ok("GET", ["foo"], Reply::Nil).await;
}

#[tokio::test]
async fn test_exec_twice_fails() {
    let mut env = TestEnv::new();

    let mut multi = env.client.multi();
    multi.queue("SET", ["k", "v"]);
    assert_eq!(multi.exec().await, Ok(vec![Ok(TestUtils::ok())]));
    assert_eq!(multi.exec().await, Err(CommandError::ExecWithoutMulti));
    assert_eq!(multi.discard(), Err(CommandError::DiscardWithoutMulti));
}

#[tokio::test]
async fn test_empty_exec_succeeds() {
    let mut env = TestEnv::new();

    let mut multi = env.client.multi();
    assert!(multi.is_empty());
    assert_eq!(multi.exec().await, Ok(Vec::new()));
}

#[tokio::test]
async fn test_failing_command_does_not_abort_the_batch() {
    let mut env = TestEnv::new();

    env.call("SET", ["text", "abc"]).await.unwrap();

    let mut multi = env.client.multi();
    multi
        .queue("SET", ["a", "1"])
        .queue("INCR", ["text"])
        .queue("NOSUCHCOMMAND", NO_ARGS)
        .queue("SET", ["b", "2"]);
    let outcomes = multi.exec().await.unwrap();

    assert_eq!(
        outcomes,
        vec![
            Ok(TestUtils::ok()),
            Err(CommandError::NotInteger),
            Err(CommandError::UnknownCommand("nosuchcommand".to_string())),
            Ok(TestUtils::ok()),
        ]
    );

    env.exec_command_ok(
        "MGET",
        ["a", "b"],
        Reply::Array(vec![TestUtils::bulk("1"), TestUtils::bulk("2")]),
    )
    .await;
}

#[tokio::test]
async fn test_batch_from_command_list() -> anyhow::Result<()> {
    let mut env = TestEnv::new();

    let commands = vec![
        ("RPUSH", vec!["list", "a", "b"]),
        ("LPUSH", vec!["list", "z"]),
        ("LRANGE", vec!["list", "0", "-1"]),
    ];
    let outcomes = env.client.batch(commands).exec().await?;

    assert_eq!(
        outcomes,
        vec![
            Ok(TestUtils::integer(2)),
            Ok(TestUtils::integer(3)),
            Ok(TestUtils::array(&["z", "a", "b"])),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_batch_sees_no_interleaved_writes() {
    let mut env = TestEnv::new();
    let mut other = env.new_client();

    let writer = tokio::spawn(async move {
        for _ in 0..50 {
            other.call("INCR", ["counter"]).await.unwrap();
        }
    });

    for _ in 0..10 {
        let mut multi = env.client.multi();
        multi.queue("GET", ["counter"]).queue("GET", ["counter"]);
        let outcomes = multi.exec().await.unwrap();
        assert_eq!(outcomes[0], outcomes[1]);
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
    env.exec_command_ok("GET", ["counter"], TestUtils::bulk("50"))
        .await;
}

#[tokio::test]
async fn test_textual_multi_exec() {
    let mut env = TestEnv::new();

    env.exec_command_ok("MULTI", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("SET", ["foo", "0"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_ok("INCR", ["foo"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_ok("INCR", ["foo", "extra"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_err("MULTI", NO_ARGS, CommandError::NestedMulti)
        .await;

    env.exec_command_ok(
        "EXEC",
        NO_ARGS,
        Reply::Array(vec![
            TestUtils::ok(),
            TestUtils::integer(1),
            Reply::Error(CommandError::bad_arity("incr").to_string()),
        ]),
    )
    .await;
    env.exec_command_err("EXEC", NO_ARGS, CommandError::ExecWithoutMulti)
        .await;
}

#[tokio::test]
async fn test_unknown_command_while_queueing_aborts_exec() {
    let mut env = TestEnv::new();

    env.exec_command_ok("MULTI", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("SET", ["foo", "1"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_err(
        "BOGUS",
        NO_ARGS,
        CommandError::UnknownCommand("bogus".to_string()),
    )
    .await;
    env.exec_command_ok("SET", ["bar", "2"], TestUtils::status("QUEUED"))
        .await;

    env.exec_command_err("EXEC", NO_ARGS, CommandError::ExecAbort)
        .await;
    env.exec_command_ok("EXISTS", ["foo", "bar"], TestUtils::integer(0))
        .await;

    // the next transaction starts clean
    env.exec_command_ok("MULTI", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("SET", ["foo", "1"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_ok("EXEC", NO_ARGS, Reply::Array(vec![TestUtils::ok()]))
        .await;
}

#[tokio::test]
async fn test_textual_discard() {
    let mut env = TestEnv::new();

    env.exec_command_err("DISCARD", NO_ARGS, CommandError::DiscardWithoutMulti)
        .await;
    env.exec_command_ok("MULTI", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("SET", ["foo", "bar"], TestUtils::status("QUEUED"))
        .await;
    env.exec_command_ok("DISCARD", NO_ARGS, TestUtils::ok()).await;
    env.exec_command_ok("GET", ["foo"], Reply::Nil).await;
}

#[tokio::test]
async fn test_subscribe_not_allowed_in_batch() {
    let mut env = TestEnv::new();

    let mut multi = env.client.multi();
    multi
        .queue("SUBSCRIBE", ["news"])
        .queue("PSUBSCRIBE", ["n*"])
        .queue("PUBLISH", ["news", "hi"]);
    let outcomes = multi.exec().await.unwrap();

    assert_eq!(
        outcomes,
        vec![
            Err(CommandError::NotAllowedInTransaction),
            Err(CommandError::NotAllowedInTransaction),
            Ok(TestUtils::integer(0)),
        ]
    );

    // the client never entered subscriber mode
    env.exec_command_ok("SET", ["k", "v"], TestUtils::ok()).await;
}

#[tokio::test]
async fn test_control_commands_inside_batch() {
    let mut env = TestEnv::new();

    let mut multi = env.client.multi();
    multi
        .queue("MULTI", NO_ARGS)
        .queue("EXEC", NO_ARGS)
        .queue("DISCARD", NO_ARGS);
    let outcomes = multi.exec().await.unwrap();

    assert_eq!(
        outcomes,
        vec![
            Err(CommandError::NestedMulti),
            Err(CommandError::ExecWithoutMulti),
            Err(CommandError::DiscardWithoutMulti),
        ]
    );
}
