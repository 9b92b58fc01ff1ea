use redis_emulator::{CommandError, Reply};

use crate::test_utils::{TestEnv, TestUtils};

async fn seed_scores(env: &mut TestEnv) {
    env.exec_command_ok(
        "ZADD",
        ["scores", "1", "one", "2", "two", "3", "three"],
        TestUtils::integer(3),
    )
    .await;
}

#[tokio::test]
async fn test_handle_zadd_and_zrange_commands() {
    let mut env = TestEnv::new();
    seed_scores(&mut env).await;

    env.exec_command_ok(
        "ZRANGE",
        ["scores", "0", "-1"],
        TestUtils::array(&["one", "two", "three"]),
    )
    .await;
    env.exec_command_ok(
        "ZREVRANGE",
        ["scores", "0", "1"],
        TestUtils::array(&["three", "two"]),
    )
    .await;
    env.exec_command_ok(
        "ZRANGE",
        ["scores", "0", "0", "WITHSCORES"],
        TestUtils::array(&["one", "1"]),
    )
    .await;
    env.exec_command_ok("ZRANGE", ["missing", "0", "-1"], TestUtils::empty_array())
        .await;
    env.exec_command_err(
        "ZRANGE",
        ["scores", "0", "-1", "SCORES"],
        CommandError::SyntaxError,
    )
    .await;

    env.exec_command_ok("ZCARD", ["scores"], TestUtils::integer(3))
        .await;
    env.exec_command_ok("ZSCORE", ["scores", "two"], TestUtils::bulk("2"))
        .await;
    env.exec_command_ok("ZSCORE", ["scores", "four"], Reply::Nil)
        .await;
}

#[tokio::test]
async fn test_equal_scores_order_by_member() {
    let mut env = TestEnv::new();

    env.call("ZADD", ["z", "1", "c", "1", "a", "1", "b", "0", "d"])
        .await
        .unwrap();

    env.exec_command_ok(
        "ZRANGE",
        ["z", "0", "-1"],
        TestUtils::array(&["d", "a", "b", "c"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_zrank_commands() {
    let mut env = TestEnv::new();
    seed_scores(&mut env).await;

    env.exec_command_ok("ZRANK", ["scores", "one"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("ZRANK", ["scores", "three"], TestUtils::integer(2))
        .await;
    env.exec_command_ok("ZREVRANK", ["scores", "three"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("ZRANK", ["scores", "four"], Reply::Nil)
        .await;
    env.exec_command_ok("ZRANK", ["missing", "one"], Reply::Nil)
        .await;
}

#[tokio::test]
async fn test_handle_zrangebyscore_commands() {
    let mut env = TestEnv::new();
    seed_scores(&mut env).await;

    let test_cases = vec![
        (vec!["scores", "(1", "3"], TestUtils::array(&["two", "three"])),
        (vec!["scores", "-inf", "+inf"], TestUtils::array(&["one", "two", "three"])),
        (vec!["scores", "(1", "(3"], TestUtils::array(&["two"])),
        (vec!["scores", "5", "10"], TestUtils::empty_array()),
        (
            vec!["scores", "-inf", "inf", "WITHSCORES"],
            TestUtils::array(&["one", "1", "two", "2", "three", "3"]),
        ),
        (
            vec!["scores", "-inf", "inf", "LIMIT", "1", "1"],
            TestUtils::array(&["two"]),
        ),
        (
            vec!["scores", "-inf", "inf", "LIMIT", "1", "-1"],
            TestUtils::array(&["two", "three"]),
        ),
    ];

    for (args, expected) in test_cases {
        env.exec_command_ok("ZRANGEBYSCORE", args, expected).await;
    }

    env.exec_command_ok(
        "ZREVRANGEBYSCORE",
        ["scores", "3", "(1"],
        TestUtils::array(&["three", "two"]),
    )
    .await;
    env.exec_command_err(
        "ZRANGEBYSCORE",
        ["scores", "low", "3"],
        CommandError::InvalidScoreBound,
    )
    .await;
    env.exec_command_err(
        "ZRANGEBYSCORE",
        ["scores", "0", "3", "LIMIT", "1"],
        CommandError::SyntaxError,
    )
    .await;

    env.exec_command_ok("ZCOUNT", ["scores", "(1", "+inf"], TestUtils::integer(2))
        .await;
    env.exec_command_ok("ZCOUNT", ["missing", "0", "1"], TestUtils::integer(0))
        .await;
}

#[tokio::test]
async fn test_handle_zadd_flags() {
    let mut env = TestEnv::new();

    env.exec_command_ok("ZADD", ["z", "1", "a"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZADD", ["z", "5", "a", "2", "b"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZADD", ["z", "CH", "6", "a", "2", "b"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZADD", ["z", "NX", "0", "a", "3", "c"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZADD", ["z", "XX", "7", "a", "4", "d"], TestUtils::integer(0))
        .await;
    env.exec_command_ok(
        "ZRANGE",
        ["z", "0", "-1", "WITHSCORES"],
        TestUtils::array(&["b", "2", "c", "3", "a", "7"]),
    )
    .await;

    env.exec_command_ok("ZADD", ["z", "INCR", "1.5", "a"], TestUtils::bulk("8.5"))
        .await;
    env.exec_command_ok("ZADD", ["z", "XX", "INCR", "1", "zzz"], Reply::Nil)
        .await;
    env.exec_command_ok("ZADD", ["z", "NX", "INCR", "1", "a"], Reply::Nil)
        .await;
    env.exec_command_ok("ZADD", ["fresh", "XX", "1", "a"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("EXISTS", ["fresh"], TestUtils::integer(0))
        .await;

    env.exec_command_err("ZADD", ["z", "NX", "XX", "1", "a"], CommandError::XxAndNx)
        .await;
    env.exec_command_err("ZADD", ["z", "nan", "a"], CommandError::NotFloat)
        .await;

    env.call("SET", ["plain", "v"]).await.unwrap();
    env.exec_command_err("ZADD", ["plain", "1", "a"], CommandError::WrongType)
        .await;
}

#[tokio::test]
async fn test_handle_zincrby_command() {
    let mut env = TestEnv::new();

    env.exec_command_ok("ZINCRBY", ["z", "2", "a"], TestUtils::bulk("2"))
        .await;
    env.exec_command_ok("ZINCRBY", ["z", "-0.5", "a"], TestUtils::bulk("1.5"))
        .await;
    env.exec_command_ok("ZINCRBY", ["z", "inf", "a"], TestUtils::bulk("inf"))
        .await;
    env.exec_command_err("ZINCRBY", ["z", "-inf", "a"], CommandError::NanOrInfinity)
        .await;
    env.exec_command_ok("ZSCORE", ["z", "a"], TestUtils::bulk("inf"))
        .await;
    env.exec_command_err("ZINCRBY", ["z", "x", "a"], CommandError::NotFloat)
        .await;
}

#[tokio::test]
async fn test_handle_zrem_commands() {
    let mut env = TestEnv::new();

    env.call(
        "ZADD",
        ["z", "1", "a", "2", "b", "3", "c", "4", "d", "5", "e"],
    )
    .await
    .unwrap();

    env.exec_command_ok("ZREM", ["z", "a", "nope"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZREMRANGEBYRANK", ["z", "0", "1"], TestUtils::integer(2))
        .await;
    env.exec_command_ok("ZRANGE", ["z", "0", "-1"], TestUtils::array(&["d", "e"]))
        .await;
    env.exec_command_ok("ZREMRANGEBYSCORE", ["z", "(4", "5"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("ZREMRANGEBYSCORE", ["z", "-inf", "+inf"], TestUtils::integer(1))
        .await;
    env.exec_command_ok("EXISTS", ["z"], TestUtils::integer(0)).await;
    env.exec_command_ok("ZREM", ["z", "d"], TestUtils::integer(0))
        .await;
}

#[tokio::test]
async fn test_handle_zunionstore_command() {
    let mut env = TestEnv::new();

    env.call("ZADD", ["s1", "1", "a"]).await.unwrap();
    env.call("ZADD", ["s2", "2", "a", "3", "b"]).await.unwrap();

    env.exec_command_ok("ZUNIONSTORE", ["out", "2", "s1", "s2"], TestUtils::integer(2))
        .await;
    env.exec_command_ok(
        "ZRANGE",
        ["out", "0", "-1", "WITHSCORES"],
        TestUtils::array(&["a", "3", "b", "3"]),
    )
    .await;

    env.exec_command_ok(
        "ZUNIONSTORE",
        ["out", "2", "s1", "s2", "WEIGHTS", "10", "1", "AGGREGATE", "MIN"],
        TestUtils::integer(2),
    )
    .await;
    env.exec_command_ok(
        "ZRANGE",
        ["out", "0", "-1", "WITHSCORES"],
        TestUtils::array(&["a", "2", "b", "3"]),
    )
    .await;

    env.call("SADD", ["plain", "a", "c"]).await.unwrap();
    env.exec_command_ok(
        "ZUNIONSTORE",
        ["out", "3", "s1", "plain", "missing", "AGGREGATE", "max"],
        TestUtils::integer(2),
    )
    .await;
    env.exec_command_ok(
        "ZRANGE",
        ["out", "0", "-1", "WITHSCORES"],
        TestUtils::array(&["a", "1", "c", "1"]),
    )
    .await;
}

#[tokio::test]
async fn test_zunionstore_edge_cases() {
    let mut env = TestEnv::new();

    env.call("SET", ["out", "old"]).await.unwrap();
    env.exec_command_ok("ZUNIONSTORE", ["out", "1", "missing"], TestUtils::integer(0))
        .await;
    env.exec_command_ok("EXISTS", ["out"], TestUtils::integer(0))
        .await;

    env.call("SET", ["plain", "v"]).await.unwrap();
    env.exec_command_err("ZUNIONSTORE", ["out", "1", "plain"], CommandError::WrongType)
        .await;
    env.exec_command_err(
        "ZUNIONSTORE",
        ["out", "0", "plain"],
        CommandError::UnionWithoutKeys,
    )
    .await;
    env.exec_command_err(
        "ZUNIONSTORE",
        ["out", "1", "s", "WEIGHTS", "heavy"],
        CommandError::InvalidWeight,
    )
    .await;
}

#[tokio::test]
async fn test_handle_zscan_command() {
    let mut env = TestEnv::new();
    seed_scores(&mut env).await;

    env.exec_command_ok(
        "ZSCAN",
        ["scores", "0", "MATCH", "t*"],
        Reply::Array(vec![
            TestUtils::bulk("0"),
            TestUtils::array(&["two", "2", "three", "3"]),
        ]),
    )
    .await;
}
