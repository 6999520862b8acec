use std::time::Duration;

use redis_lite::config::Config;

use crate::test_utils::{TestEnv, TestUtils};

#[test]
fn test_handle_ping_and_echo_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(client, &["PING"], TestUtils::simple("PONG"));
    env.assert_reply(client, &["ping", "hello"], TestUtils::bulk("hello"));
    env.assert_reply(client, &["ECHO", "grape"], TestUtils::bulk("grape"));
    env.assert_reply(
        client,
        &["ECHO"],
        TestUtils::error("ERR wrong number of arguments for 'echo' command"),
    );
}

#[test]
fn test_handle_set_and_get_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(client, &["GET", "grape"], TestUtils::nil());
    env.assert_reply(client, &["SET", "grape", "mango"], TestUtils::ok());
    env.assert_reply(client, &["GET", "grape"], TestUtils::bulk("mango"));
    env.assert_reply(client, &["SET", "grape", "apple"], TestUtils::ok());
    env.assert_reply(client, &["GET", "grape"], TestUtils::bulk("apple"));
}

#[tokio::test]
async fn test_handle_set_command_with_expiration() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(client, &["SET", "grape", "mango", "px", "50"], TestUtils::ok());
    env.assert_reply(client, &["GET", "grape"], TestUtils::bulk("mango"));

    tokio::time::sleep(Duration::from_millis(80)).await;

    env.assert_reply(client, &["GET", "grape"], TestUtils::nil());
    env.assert_reply(client, &["TYPE", "grape"], TestUtils::simple("none"));
}

#[test]
fn test_handle_set_command_invalid() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    let test_cases = vec![
        (
            vec!["SET", "grape"],
            "ERR wrong number of arguments for 'set' command",
        ),
        (vec!["SET", "grape", "mango", "XX", "10"], "ERR syntax error"),
        (
            vec!["SET", "grape", "mango", "PX", "soon"],
            "ERR value is not an integer or out of range",
        ),
        (
            vec!["SET", "grape", "mango", "PX", "0"],
            "ERR invalid expire time in 'set' command",
        ),
    ];

    for (parts, expected) in test_cases {
        env.assert_reply(client, &parts, TestUtils::error(expected));
    }

    env.assert_reply(client, &["GET", "grape"], TestUtils::nil());
}

#[test]
fn test_handle_incr_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(client, &["INCR", "counter"], TestUtils::integer(1));
    env.assert_reply(client, &["INCR", "counter"], TestUtils::integer(2));
    env.assert_reply(client, &["SET", "counter", "41"], TestUtils::ok());
    env.assert_reply(client, &["INCR", "counter"], TestUtils::integer(42));
    env.assert_reply(client, &["GET", "counter"], TestUtils::bulk("42"));

    env.assert_reply(client, &["SET", "fruit", "mango"], TestUtils::ok());
    env.assert_reply(
        client,
        &["INCR", "fruit"],
        TestUtils::error("ERR value is not an integer or out of range"),
    );
}

#[test]
fn test_handle_type_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["SET", "s", "v"]);
    env.exec(client, &["RPUSH", "l", "v"]);
    env.exec(client, &["XADD", "x", "1-1", "f", "v"]);
    env.exec(client, &["ZADD", "z", "1", "m"]);

    for (key, expected) in [
        ("s", "string"),
        ("l", "list"),
        ("x", "stream"),
        ("z", "zset"),
        ("missing", "none"),
    ] {
        env.assert_reply(client, &["TYPE", key], TestUtils::simple(expected));
    }
}

#[test]
fn test_handle_keys_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["SET", "mango", "1"]);
    env.exec(client, &["SET", "melon", "2"]);
    env.exec(client, &["RPUSH", "apple", "3"]);

    env.assert_reply(
        client,
        &["KEYS", "*"],
        TestUtils::bulk_array(&["apple", "mango", "melon"]),
    );
    env.assert_reply(
        client,
        &["KEYS", "m*"],
        TestUtils::bulk_array(&["mango", "melon"]),
    );
    env.assert_reply(client, &["KEYS", "m?lon"], TestUtils::bulk_array(&["melon"]));
    env.assert_reply(client, &["KEYS", "pear"], TestUtils::bulk_array(&[]));
}

#[test]
fn test_handle_wrong_type_errors() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();
    let wrong_type =
        TestUtils::error("WRONGTYPE Operation against a key holding the wrong kind of value");

    env.exec(client, &["RPUSH", "fruits", "mango"]);
    env.assert_reply(client, &["GET", "fruits"], wrong_type.clone());
    env.assert_reply(client, &["INCR", "fruits"], wrong_type.clone());
    env.assert_reply(client, &["XADD", "fruits", "*", "a", "b"], wrong_type.clone());
    env.assert_reply(client, &["ZADD", "fruits", "1", "a"], wrong_type);
}

#[test]
fn test_handle_unknown_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(
        client,
        &["FLUSHALL"],
        TestUtils::error("ERR unknown command 'FLUSHALL'"),
    );
    env.assert_reply(client, &["PING"], TestUtils::simple("PONG"));
}

#[test]
fn test_handle_config_get_command() {
    let config = Config::for_master(6379).with_snapshot("/tmp/redis-files", "dump.rdb");
    let mut env = TestEnv::with_snapshot(config, Box::new(redis_lite::rdb::EmptySnapshot));
    let client = env.connect();

    env.assert_reply(
        client,
        &["CONFIG", "GET", "dir"],
        TestUtils::bulk_array(&["dir", "/tmp/redis-files"]),
    );
    env.assert_reply(
        client,
        &["config", "get", "dbfilename"],
        TestUtils::bulk_array(&["dbfilename", "dump.rdb"]),
    );
}

#[test]
fn test_handle_info_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(
        client,
        &["INFO", "replication"],
        TestUtils::bulk(
            "role:master\r\nmaster_replid:8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb\r\nmaster_repl_offset:0",
        ),
    );

    let mut replica = TestEnv::new_replica_server();
    let client = replica.connect();
    let replies = replica.exec(client, &["INFO"]);
    match replies.as_slice() {
        [redis_lite::resp::RespValue::BulkString(body)] => {
            assert!(body.starts_with("role:slave\r\n"), "got {:?}", body)
        }
        other => panic!("unexpected INFO reply {:?}", other),
    }
}
