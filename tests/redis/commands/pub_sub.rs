use redis_lite::resp::RespValue;

use crate::test_utils::{TestEnv, TestUtils};

fn confirmation(kind: &str, channel: &str, count: i64) -> RespValue {
    RespValue::Array(vec![
        TestUtils::bulk(kind),
        TestUtils::bulk(channel),
        TestUtils::integer(count),
    ])
}

#[test]
fn test_handle_subscribe_and_publish_commands() {
    let mut env = TestEnv::new_master_server();
    let alice = env.connect();
    let bob = env.connect();
    let publisher = env.connect();

    assert_eq!(
        env.exec(alice, &["SUBSCRIBE", "news", "sports"]),
        vec![
            confirmation("subscribe", "news", 1),
            confirmation("subscribe", "sports", 2),
        ]
    );
    assert_eq!(
        env.exec(bob, &["SUBSCRIBE", "news"]),
        vec![confirmation("subscribe", "news", 1)]
    );

    env.assert_reply(publisher, &["PUBLISH", "news", "hello"], TestUtils::integer(2));
    env.assert_reply(publisher, &["PUBLISH", "sports", "goal"], TestUtils::integer(1));
    env.assert_reply(publisher, &["PUBLISH", "weather", "rain"], TestUtils::integer(0));

    assert_eq!(
        env.replies(alice),
        vec![
            TestUtils::bulk_array(&["message", "news", "hello"]),
            TestUtils::bulk_array(&["message", "sports", "goal"]),
        ]
    );
    assert_eq!(
        env.replies(bob),
        vec![TestUtils::bulk_array(&["message", "news", "hello"])]
    );
}

#[test]
fn test_handle_unsubscribe_command() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();
    let publisher = env.connect();

    env.exec(client, &["SUBSCRIBE", "news", "sports", "weather"]);

    assert_eq!(
        env.exec(client, &["UNSUBSCRIBE", "sports"]),
        vec![confirmation("unsubscribe", "sports", 2)]
    );
    env.assert_reply(publisher, &["PUBLISH", "sports", "goal"], TestUtils::integer(0));

    assert_eq!(
        env.exec(client, &["UNSUBSCRIBE"]),
        vec![
            confirmation("unsubscribe", "news", 1),
            confirmation("unsubscribe", "weather", 0),
        ]
    );

    env.assert_reply(client, &["GET", "anything"], TestUtils::nil());
    env.assert_reply(
        client,
        &["UNSUBSCRIBE"],
        RespValue::Array(vec![
            TestUtils::bulk("unsubscribe"),
            TestUtils::nil(),
            TestUtils::integer(0),
        ]),
    );
}

#[test]
fn test_subscribed_mode_restricts_commands() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();

    env.exec(client, &["SUBSCRIBE", "news"]);

    env.assert_reply(
        client,
        &["SET", "grape", "mango"],
        TestUtils::error(
            "ERR Can't execute 'set': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context",
        ),
    );
    env.assert_reply(client, &["PING"], TestUtils::bulk_array(&["pong", ""]));
    env.assert_reply(client, &["PING", "hi"], TestUtils::bulk_array(&["pong", "hi"]));

    env.assert_reply(client, &["QUIT"], TestUtils::ok());
    assert!(env.is_closed(client));
}

#[test]
fn test_disconnect_drops_subscriptions() {
    let mut env = TestEnv::new_master_server();
    let client = env.connect();
    let publisher = env.connect();

    env.exec(client, &["SUBSCRIBE", "news"]);
    env.disconnect(client);

    env.assert_reply(publisher, &["PUBLISH", "news", "hello"], TestUtils::integer(0));
}
