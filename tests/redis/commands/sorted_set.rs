use crate::test_utils::{TestEnv, TestUtils};

#[test]
fn test_handle_zadd_and_zrange_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(
        client,
        &["ZADD", "racers", "2", "bob", "1", "alice"],
        TestUtils::integer(2),
    );
    env.assert_reply(client, &["ZADD", "racers", "1", "carol"], TestUtils::integer(1));
    env.assert_reply(client, &["ZADD", "racers", "3", "alice"], TestUtils::integer(0));

    env.assert_reply(
        client,
        &["ZRANGE", "racers", "0", "-1"],
        TestUtils::bulk_array(&["carol", "bob", "alice"]),
    );
    env.assert_reply(
        client,
        &["ZRANGE", "racers", "-2", "-1"],
        TestUtils::bulk_array(&["bob", "alice"]),
    );
    env.assert_reply(
        client,
        &["ZRANGE", "racers", "2", "1"],
        TestUtils::bulk_array(&[]),
    );
    env.assert_reply(
        client,
        &["ZRANGE", "missing", "0", "-1"],
        TestUtils::bulk_array(&[]),
    );
}

#[test]
fn test_handle_zrank_zscore_and_zcard_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["ZADD", "racers", "1.5", "alice", "1.5", "aaron", "7", "bob"]);

    env.assert_reply(client, &["ZRANK", "racers", "aaron"], TestUtils::integer(0));
    env.assert_reply(client, &["ZRANK", "racers", "alice"], TestUtils::integer(1));
    env.assert_reply(client, &["ZRANK", "racers", "bob"], TestUtils::integer(2));
    env.assert_reply(client, &["ZRANK", "racers", "zoe"], TestUtils::nil());

    env.assert_reply(client, &["ZSCORE", "racers", "alice"], TestUtils::bulk("1.5"));
    env.assert_reply(client, &["ZSCORE", "racers", "bob"], TestUtils::bulk("7"));
    env.assert_reply(client, &["ZSCORE", "racers", "zoe"], TestUtils::nil());

    env.assert_reply(client, &["ZCARD", "racers"], TestUtils::integer(3));
    env.assert_reply(client, &["ZCARD", "missing"], TestUtils::integer(0));
}

#[test]
fn test_handle_zrem_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["ZADD", "racers", "1", "alice", "2", "bob"]);

    env.assert_reply(
        client,
        &["ZREM", "racers", "alice", "zoe"],
        TestUtils::integer(1),
    );
    env.assert_reply(
        client,
        &["ZRANGE", "racers", "0", "-1"],
        TestUtils::bulk_array(&["bob"]),
    );
    env.assert_reply(client, &["ZREM", "missing", "bob"], TestUtils::integer(0));
}

#[test]
fn test_handle_zadd_command_invalid() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(
        client,
        &["ZADD", "racers", "fast", "alice"],
        TestUtils::error("ERR value is not a valid float"),
    );
    env.assert_reply(
        client,
        &["ZADD", "racers", "1"],
        TestUtils::error("ERR wrong number of arguments for 'zadd' command"),
    );
    env.assert_reply(client, &["ZCARD", "racers"], TestUtils::integer(0));
}
