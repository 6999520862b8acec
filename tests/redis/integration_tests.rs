//! End-to-end tests over real sockets.

use std::time::Duration;

use redis_lite::{config::Config, resp::RespValue};
use tokio::time::sleep;

use crate::test_utils::{TestClient, TestUtils};

#[tokio::test]
async fn test_ping_and_echo() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.request(&["PING"]).await, TestUtils::simple("PONG"));
    assert_eq!(client.request(&["ECHO", "hey"]).await, TestUtils::bulk("hey"));
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut client = TestClient::connect(addr).await;

    client.write_raw(b"*3\r\n$3\r\nSET\r\n$5\r\ngr").await;
    sleep(Duration::from_millis(20)).await;
    client.write_raw(b"ape\r\n$5\r\nmango\r\n").await;

    assert_eq!(client.read_reply().await, TestUtils::ok());
    assert_eq!(client.request(&["GET", "grape"]).await, TestUtils::bulk("mango"));
}

#[tokio::test]
async fn test_pipelined_requests_reply_in_order() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut client = TestClient::connect(addr).await;

    let mut pipeline = Vec::new();
    for parts in [&["INCR", "n"][..], &["INCR", "n"], &["GET", "n"]] {
        pipeline.extend_from_slice(&TestUtils::command(parts).encode());
    }
    client.write_raw(&pipeline).await;

    assert_eq!(client.read_reply().await, TestUtils::integer(1));
    assert_eq!(client.read_reply().await, TestUtils::integer(2));
    assert_eq!(client.read_reply().await, TestUtils::bulk("2"));
}

#[tokio::test]
async fn test_blocked_clients_are_served_by_a_push() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut first = TestClient::connect(addr).await;
    let mut second = TestClient::connect(addr).await;
    let mut pusher = TestClient::connect(addr).await;

    first.send(&["BLPOP", "jobs", "0"]).await;
    second.send(&["BLPOP", "jobs", "0"]).await;
    sleep(Duration::from_millis(50)).await;

    assert_eq!(
        pusher.request(&["RPUSH", "jobs", "a", "b"]).await,
        TestUtils::integer(2)
    );

    let mut served = Vec::new();
    for reply in [first.read_reply().await, second.read_reply().await] {
        let RespValue::Array(items) = reply else {
            panic!("unexpected BLPOP reply {:?}", reply);
        };
        assert_eq!(items[0], TestUtils::bulk("jobs"));
        served.push(items[1].clone());
    }
    served.sort_by_key(|value| format!("{:?}", value));

    assert_eq!(served, vec![TestUtils::bulk("a"), TestUtils::bulk("b")]);
    assert_eq!(pusher.request(&["LLEN", "jobs"]).await, TestUtils::integer(0));
}

#[tokio::test]
async fn test_blpop_times_out_over_socket() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut client = TestClient::connect(addr).await;

    client.send(&["BLPOP", "nothing", "0.1"]).await;
    assert_eq!(client.read_reply().await, TestUtils::nil());
}

#[tokio::test]
async fn test_publish_reaches_subscriber() {
    let (addr, _shutdown) = TestUtils::spawn_server(Config::for_master(0)).await;
    let mut subscriber = TestClient::connect(addr).await;
    let mut publisher = TestClient::connect(addr).await;

    assert_eq!(
        subscriber.request(&["SUBSCRIBE", "news"]).await,
        RespValue::Array(vec![
            TestUtils::bulk("subscribe"),
            TestUtils::bulk("news"),
            TestUtils::integer(1),
        ])
    );

    assert_eq!(
        publisher.request(&["PUBLISH", "news", "hello"]).await,
        TestUtils::integer(1)
    );
    assert_eq!(
        subscriber.read_reply().await,
        TestUtils::bulk_array(&["message", "news", "hello"])
    );
}

/// Polls `request` on `client` until it returns `expected`.
async fn eventually(client: &mut TestClient, request: &[&str], expected: RespValue) {
    let mut last = RespValue::NullBulkString;

    for _ in 0..50 {
        last = client.request(request).await;
        if last == expected {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }

    panic!("{:?} kept replying {:?}, expected {:?}", request, last, expected);
}

#[tokio::test]
async fn test_master_and_replica() {
    let master_dir = tempfile::tempdir().unwrap();
    let replica_dir = tempfile::tempdir().unwrap();

    let (master_addr, _master_shutdown) = TestUtils::spawn_server(
        Config::for_master(0).with_snapshot(master_dir.path(), "dump.rdb"),
    )
    .await;
    let (replica_addr, _replica_shutdown) = TestUtils::spawn_server(
        Config::for_replica(0, "127.0.0.1", master_addr.port())
            .with_snapshot(replica_dir.path(), "dump.rdb"),
    )
    .await;

    let mut master = TestClient::connect(master_addr).await;
    let mut replica = TestClient::connect(replica_addr).await;

    eventually(&mut master, &["WAIT", "1", "0"], TestUtils::integer(1)).await;
    assert!(replica_dir.path().join("dump.rdb").exists());

    assert_eq!(master.request(&["SET", "a", "1"]).await, TestUtils::ok());
    assert_eq!(
        master.request(&["WAIT", "1", "1000"]).await,
        TestUtils::integer(1)
    );

    eventually(&mut replica, &["GET", "a"], TestUtils::bulk("1")).await;
    assert_eq!(
        replica.request(&["SET", "b", "2"]).await,
        TestUtils::error("ERR You can't write against a read only replica.")
    );

    let RespValue::BulkString(info) = replica.request(&["INFO", "replication"]).await else {
        panic!("INFO should reply with a bulk string");
    };
    assert!(info.contains("role:slave"));
}
