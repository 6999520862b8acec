use redis_lite::{commands::CommandHandler, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[test]
fn test_handle_multi_and_exec_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();
    let other = env.connect();

    env.assert_reply(client, &["MULTI"], TestUtils::ok());
    env.assert_reply(client, &["SET", "grape", "5"], TestUtils::simple("QUEUED"));
    env.assert_reply(client, &["INCR", "grape"], TestUtils::simple("QUEUED"));
    env.assert_reply(client, &["GET", "grape"], TestUtils::simple("QUEUED"));

    assert_eq!(
        env.engine
            .session(client)
            .and_then(|session| session.transaction.clone()),
        Some(vec![
            CommandHandler::from_parts(["SET", "grape", "5"]).unwrap(),
            CommandHandler::from_parts(["INCR", "grape"]).unwrap(),
            CommandHandler::from_parts(["GET", "grape"]).unwrap(),
        ])
    );
    env.assert_reply(other, &["GET", "grape"], TestUtils::nil());

    env.assert_reply(
        client,
        &["EXEC"],
        RespValue::Array(vec![
            TestUtils::ok(),
            TestUtils::integer(6),
            TestUtils::bulk("6"),
        ]),
    );
    env.assert_reply(other, &["GET", "grape"], TestUtils::bulk("6"));
    assert!(env.engine.session(client).unwrap().transaction.is_none());
}

#[test]
fn test_handle_exec_command_empty_transaction() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["MULTI"]);
    env.assert_reply(client, &["EXEC"], RespValue::Array(vec![]));
}

#[test]
fn test_handle_exec_command_keeps_going_after_errors() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["SET", "fruit", "mango"]);
    env.exec(client, &["MULTI"]);
    env.exec(client, &["INCR", "fruit"]);
    env.exec(client, &["SET", "counter", "1"]);

    env.assert_reply(
        client,
        &["EXEC"],
        RespValue::Array(vec![
            TestUtils::error("ERR value is not an integer or out of range"),
            TestUtils::ok(),
        ]),
    );
    env.assert_reply(client, &["GET", "counter"], TestUtils::bulk("1"));
}

#[test]
fn test_handle_multi_command_rejects_invalid_arguments_without_queueing() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["MULTI"]);
    env.assert_reply(
        client,
        &["SET", "grape"],
        TestUtils::error("ERR wrong number of arguments for 'set' command"),
    );
    env.assert_reply(
        client,
        &["FLUSHALL"],
        TestUtils::error("ERR unknown command 'FLUSHALL'"),
    );
    env.exec(client, &["SET", "grape", "1"]);

    env.assert_reply(client, &["EXEC"], RespValue::Array(vec![TestUtils::ok()]));
}

#[test]
fn test_handle_blocking_commands_inside_transaction() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["MULTI"]);
    env.exec(client, &["BLPOP", "fruits", "0"]);
    env.exec(client, &["XREAD", "BLOCK", "0", "STREAMS", "sensor", "$"]);

    env.assert_reply(
        client,
        &["EXEC"],
        RespValue::Array(vec![TestUtils::nil(), TestUtils::nil()]),
    );
    assert!(!env.engine.session(client).unwrap().awaiting);
}

#[test]
fn test_handle_transaction_control_errors() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.assert_reply(client, &["EXEC"], TestUtils::error("ERR EXEC without MULTI"));
    env.assert_reply(
        client,
        &["DISCARD"],
        TestUtils::error("ERR DISCARD without MULTI"),
    );

    env.exec(client, &["MULTI"]);
    env.assert_reply(
        client,
        &["MULTI"],
        TestUtils::error("ERR MULTI calls can not be nested"),
    );
    env.exec(client, &["SET", "grape", "1"]);

    env.assert_reply(client, &["DISCARD"], TestUtils::ok());
    env.assert_reply(client, &["GET", "grape"], TestUtils::nil());
    env.assert_reply(client, &["EXEC"], TestUtils::error("ERR EXEC without MULTI"));
}

#[test]
fn test_disconnect_drops_open_transaction() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();
    let other = env.connect();

    env.exec(client, &["MULTI"]);
    env.exec(client, &["SET", "grape", "1"]);
    env.disconnect(client);

    assert!(env.engine.session(client).is_none());
    env.assert_reply(other, &["GET", "grape"], TestUtils::nil());
}
