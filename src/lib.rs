//! A Redis-compatible in-memory server.
//!
//! The server speaks RESP and supports:
//!
//! - String operations (GET, SET with expiry, INCR, KEYS, TYPE)
//! - List operations (LPUSH, RPUSH, LPOP, BLPOP, LRANGE, LLEN)
//! - Stream operations (XADD, XRANGE, XREAD with BLOCK)
//! - Sorted sets (ZADD, ZRANK, ZRANGE, ZCARD, ZSCORE, ZREM)
//! - Transactions (MULTI, EXEC, DISCARD) and pub/sub
//! - Master-replica replication with WAIT
//!
//! One engine task owns all state; connection tasks only move bytes between
//! sockets and the engine.

pub mod blocking;
pub mod commands;
pub mod config;
pub mod connection;
pub mod engine;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod session;
pub mod store;
