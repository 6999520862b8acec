use redis_lite::resp::RespValue;

use crate::test_utils::{TestEnv, TestUtils};

fn stream_reply(key: &str, entries: &[(&str, &[&str])]) -> RespValue {
    RespValue::Array(vec![
        TestUtils::bulk(key),
        RespValue::Array(
            entries
                .iter()
                .map(|(id, fields)| {
                    RespValue::Array(vec![TestUtils::bulk(id), TestUtils::bulk_array(fields)])
                })
                .collect(),
        ),
    ])
}

#[test]
fn test_handle_xread_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["XADD", "sensor", "1-1", "temperature", "36"]);
    env.exec(client, &["XADD", "sensor", "1-2", "temperature", "37"]);
    env.exec(client, &["XADD", "other", "3-0", "pressure", "1"]);

    env.assert_reply(
        client,
        &["XREAD", "STREAMS", "sensor", "1-1"],
        RespValue::Array(vec![stream_reply(
            "sensor",
            &[("1-2", &["temperature", "37"][..])],
        )]),
    );
    env.assert_reply(
        client,
        &["XREAD", "streams", "sensor", "other", "0-0", "0-0"],
        RespValue::Array(vec![
            stream_reply(
                "sensor",
                &[
                    ("1-1", &["temperature", "36"][..]),
                    ("1-2", &["temperature", "37"][..]),
                ],
            ),
            stream_reply("other", &[("3-0", &["pressure", "1"][..])]),
        ]),
    );
    env.assert_reply(
        client,
        &["XREAD", "COUNT", "1", "STREAMS", "sensor", "0"],
        RespValue::Array(vec![stream_reply(
            "sensor",
            &[("1-1", &["temperature", "36"][..])],
        )]),
    );
    env.assert_reply(
        client,
        &["XREAD", "STREAMS", "sensor", "1-2"],
        TestUtils::nil(),
    );
}

#[test]
fn test_handle_xread_command_blocking() {
    let mut env = TestEnv::new_master_server();
    let reader = env.connect();
    let writer = env.connect();

    env.exec(writer, &["XADD", "sensor", "1-1", "temperature", "36"]);
    env.assert_blocked(reader, &["XREAD", "BLOCK", "0", "STREAMS", "sensor", "1-1"]);

    env.exec(writer, &["XADD", "sensor", "1-2", "temperature", "37"]);

    assert_eq!(
        env.replies(reader),
        vec![RespValue::Array(vec![stream_reply(
            "sensor",
            &[("1-2", &["temperature", "37"][..])],
        )])]
    );
    assert!(!env.engine.waiters().is_waiting(reader));
}

#[test]
fn test_handle_xread_command_blocking_with_dollar() {
    let mut env = TestEnv::new_master_server();
    let reader = env.connect();
    let writer = env.connect();

    env.exec(writer, &["XADD", "sensor", "1-1", "temperature", "36"]);
    env.assert_blocked(reader, &["XREAD", "BLOCK", "1000", "STREAMS", "sensor", "$"]);

    env.exec(writer, &["XADD", "sensor", "2-1", "temperature", "38"]);

    assert_eq!(
        env.replies(reader),
        vec![RespValue::Array(vec![stream_reply(
            "sensor",
            &[("2-1", &["temperature", "38"][..])],
        )])]
    );
}

#[test]
fn test_handle_xread_command_blocking_timeout() {
    let mut env = TestEnv::new_master_server();
    let reader = env.connect();

    env.assert_blocked(reader, &["XREAD", "BLOCK", "100", "STREAMS", "sensor", "$"]);

    env.advance(20);
    assert!(env.replies(reader).is_empty());

    env.advance(500);
    assert_eq!(env.replies(reader), vec![TestUtils::nil()]);
    assert!(!env.engine.session(reader).unwrap().awaiting);
}

#[test]
fn test_handle_xread_command_invalid() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(
        client,
        &["XREAD", "STREAMS", "a", "b", "0-0"],
        TestUtils::error("ERR syntax error"),
    );
    env.assert_reply(
        client,
        &["XREAD", "STREAMS", "a", "x-y"],
        TestUtils::error("ERR Invalid stream ID specified as stream command argument"),
    );
}
