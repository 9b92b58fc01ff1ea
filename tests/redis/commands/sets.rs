use std::collections::HashSet;

use redis_emulator::{CommandError, Reply};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_sadd_and_smembers_commands() {
    let mut env = TestEnv::new();

    env.exec_command_ok("SADD", ["fruits", "pear", "apple"], TestUtils::integer(2))
        .await;
    env.exec_command_ok("SADD", ["fruits", "apple", "fig"], TestUtils::integer(1))
        .await;
    env.exec_command_ok(
        "SMEMBERS",
        ["fruits"],
        TestUtils::array(&["apple", "fig", "pear"]),
    )
    .await;
    env.exec_command_ok("SMEMBERS", ["missing"], TestUtils::empty_array())
        .await;
    env.exec_command_ok("SCARD", ["fruits"], TestUtils::integer(3))
        .await;
    env.exec_command_ok("SISMEMBER", ["fruits", "fig"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("SISMEMBER", ["fruits", "kiwi"], TestUtils::integer(0))
        .await;

    env.call("SET", ["plain", "v"]).await.unwrap();
    env.exec_command_err("SADD", ["plain", "x"], CommandError::WrongType)
        .await;
}

#[tokio::test]
async fn test_handle_srem_command() {
    let mut env = TestEnv::new();

    env.call("SADD", ["s", "a", "b"]).await.unwrap();

    env.exec_command_ok("SREM", ["s", "a", "z"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("SREM", ["s", "b"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("EXISTS", ["s"], TestUtils::integer(0)).await;
    env.exec_command_ok("SREM", ["s", "b"], TestUtils::integer(0))
        .await;
}

#[tokio::test]
async fn test_handle_srandmember_command() {
    let mut env = TestEnv::new();

    env.exec_command_ok("SRANDMEMBER", ["missing"], Reply::Nil).await;
    env.exec_command_ok("SRANDMEMBER", ["missing", "3"], TestUtils::empty_array())
        .await;

    env.call("SADD", ["s", "a", "b", "c"]).await.unwrap();
    let members: HashSet<String> = ["a", "b", "c"].iter().map(|m| m.to_string()).collect();

    let picked = env.call("SRANDMEMBER", ["s"]).await.unwrap();
    assert!(members.contains(picked.as_str().unwrap()));

    let picked = env.call("SRANDMEMBER", ["s", "2"]).await.unwrap().into_strings();
    assert_eq!(picked.len(), 2);
    assert_ne!(picked[0], picked[1]);
    assert!(picked.iter().all(|member| members.contains(member)));

    let picked = env.call("SRANDMEMBER", ["s", "10"]).await.unwrap().into_strings();
    assert_eq!(picked.into_iter().collect::<HashSet<_>>(), members);

    env.exec_command_err("SRANDMEMBER", ["s", "-1"], CommandError::NotInteger)
        .await;
    env.exec_command_ok("SCARD", ["s"], TestUtils::integer(3)).await;
}

#[tokio::test]
async fn test_handle_smove_command() {
    let mut env = TestEnv::new();

    env.call("SADD", ["src", "a", "b"]).await.unwrap();
    env.call("SADD", ["dst", "c"]).await.unwrap();

    env.exec_command_ok("SMOVE", ["src", "dst", "zzz"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("SMEMBERS", ["src"], TestUtils::array(&["a", "b"]))
        .await;
    env.exec_command_ok("SMEMBERS", ["dst"], TestUtils::array(&["c"]))
        .await;

    env.exec_command_ok("SMOVE", ["src", "dst", "a"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("SMEMBERS", ["dst"], TestUtils::array(&["a", "c"]))
        .await;

    env.exec_command_ok("SMOVE", ["src", "fresh", "b"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("EXISTS", ["src"], TestUtils::integer(0)).await;
    env.exec_command_ok("SMEMBERS", ["fresh"], TestUtils::array(&["b"]))
        .await;

    env.call("SET", ["plain", "v"]).await.unwrap();
    env.exec_command_err("SMOVE", ["dst", "plain", "a"], CommandError::WrongType)
        .await;
    env.exec_command_ok("SISMEMBER", ["dst", "a"], TestUtils::integer(1))
        .await;
}

#[tokio::test]
async fn test_handle_sinter_command() {
    let mut env = TestEnv::new();

    env.call("SADD", ["s1", "a", "b", "c"]).await.unwrap();
    env.call("SADD", ["s2", "b", "c", "d"]).await.unwrap();

    env.exec_command_ok("SINTER", ["s1", "s2"], TestUtils::array(&["b", "c"]))
        .await;
    env.exec_command_ok("SINTER", ["s1", "missing"], TestUtils::empty_array())
        .await;
    env.exec_command_ok("SINTER", ["s1"], TestUtils::array(&["a", "b", "c"]))
        .await;
}

#[tokio::test]
async fn test_handle_sscan_command() {
    let mut env = TestEnv::new();

    env.call("SADD", ["s", "m1", "m2", "m3", "other"])
        .await
        .unwrap();

    env.exec_command_ok(
        "SSCAN",
        ["s", "0", "MATCH", "m*"],
        Reply::Array(vec![
            TestUtils::bulk("0"),
            TestUtils::array(&["m1", "m2", "m3"]),
        ]),
    )
    .await;
}
