use std::path::Path;

use redis_lite::{config::Config, rdb::RdbSnapshotReader, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

/// Expiry far in the future, in milliseconds.
const YEAR_2100_MS: u64 = 4_102_444_800_000;

fn write_snapshot(path: &Path) {
    let mut bytes = b"REDIS0011".to_vec();
    bytes.extend_from_slice(b"\xFA\x09redis-ver\x057.2.0");
    bytes.extend_from_slice(b"\xFE\x00\xFB\x03\x02");

    bytes.extend_from_slice(b"\x00\x05grape\x05mango");

    bytes.push(0xFC);
    bytes.extend_from_slice(&YEAR_2100_MS.to_le_bytes());
    bytes.extend_from_slice(b"\x00\x05apple\x04pear");

    bytes.push(0xFC);
    bytes.extend_from_slice(&1_000u64.to_le_bytes());
    bytes.extend_from_slice(b"\x00\x04plum\x05stale");

    bytes.push(0xFF);
    bytes.extend_from_slice(&[0; 8]);

    std::fs::write(path, bytes).unwrap();
}

fn env_with_snapshot(dir: &Path) -> TestEnv {
    let path = dir.join("dump.rdb");
    write_snapshot(&path);

    TestEnv::with_snapshot(
        Config::for_master(6379).with_snapshot(dir, "dump.rdb"),
        Box::new(RdbSnapshotReader::new(path)),
    )
}

#[test]
fn test_snapshot_keys_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = env_with_snapshot(dir.path());
    let client = env.connect();

    env.assert_reply(client, &["GET", "grape"], TestUtils::bulk("mango"));
    env.assert_reply(client, &["GET", "apple"], TestUtils::bulk("pear"));
    env.assert_reply(client, &["GET", "plum"], TestUtils::nil());
    env.assert_reply(client, &["TYPE", "grape"], TestUtils::simple("string"));
    env.assert_reply(
        client,
        &["KEYS", "*"],
        TestUtils::bulk_array(&["apple", "grape"]),
    );
}

#[test]
fn test_live_writes_shadow_snapshot_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = env_with_snapshot(dir.path());
    let client = env.connect();

    env.assert_reply(client, &["SET", "grape", "banana"], TestUtils::ok());
    env.assert_reply(client, &["GET", "grape"], TestUtils::bulk("banana"));
    env.assert_reply(client, &["SET", "kiwi", "1"], TestUtils::ok());
    env.assert_reply(
        client,
        &["KEYS", "*"],
        TestUtils::bulk_array(&["apple", "grape", "kiwi"]),
    );
    env.assert_reply(client, &["KEYS", "*p*"], TestUtils::bulk_array(&["apple", "grape"]));
}

#[test]
fn test_incr_on_snapshot_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.rdb");
    std::fs::write(&path, b"REDIS0011\xFE\x00\x00\x07counter\xC0\x29\xFF").unwrap();

    let mut env = TestEnv::with_snapshot(
        Config::for_master(6379).with_snapshot(dir.path(), "dump.rdb"),
        Box::new(RdbSnapshotReader::new(path)),
    );
    let client = env.connect();

    env.assert_reply(client, &["GET", "counter"], TestUtils::bulk("41"));
    env.assert_reply(client, &["INCR", "counter"], TestUtils::integer(42));
    env.assert_reply(client, &["GET", "counter"], TestUtils::bulk("42"));
}

#[test]
fn test_missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = TestEnv::with_snapshot(
        Config::for_master(6379).with_snapshot(dir.path(), "absent.rdb"),
        Box::new(RdbSnapshotReader::new(dir.path().join("absent.rdb"))),
    );
    let client = env.connect();

    env.assert_reply(client, &["KEYS", "*"], RespValue::Array(vec![]));
    env.assert_reply(
        client,
        &["CONFIG", "GET", "dbfilename"],
        TestUtils::bulk_array(&["dbfilename", "absent.rdb"]),
    );
}
