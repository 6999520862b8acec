use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use redis_lite::{
    config::{Config, ConfigSource},
    engine::{Engine, Event},
    rdb::{EmptySnapshot, SnapshotReader},
    resp::{RespDecoder, RespValue},
    server::RedisServer,
    session::{next_client_id, ClientId},
    store::{now_millis, Store},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::{mpsc, oneshot},
    time::timeout,
};

/// Test utilities for simplifying Redis command tests
pub struct TestUtils;

/// An engine driven directly by the test, with one captured outbound queue
/// per fake connection.
pub struct TestEnv {
    pub engine: Engine,
    outbound: HashMap<ClientId, mpsc::UnboundedReceiver<Bytes>>,
    decoders: HashMap<ClientId, RespDecoder>,
}

impl TestEnv {
    /// Create a new test environment with a master server
    pub fn new_master_server() -> Self {
        Self::with_snapshot(Config::for_master(6379), Box::new(EmptySnapshot))
    }

    /// Create a new test environment with a replica server
    pub fn new_replica_server() -> Self {
        Self::with_snapshot(
            Config::for_replica(6380, "127.0.0.1", 6379),
            Box::new(EmptySnapshot),
        )
    }

    pub fn with_snapshot(config: Config, snapshot: Box<dyn SnapshotReader>) -> Self {
        let config: Arc<dyn ConfigSource> = Arc::new(config);

        Self {
            engine: Engine::new(config, Store::new(snapshot)),
            outbound: HashMap::new(),
            decoders: HashMap::new(),
        }
    }

    fn register(&mut self, is_master_link: bool) -> ClientId {
        let client_id = next_client_id();
        let (outbound, receiver) = mpsc::unbounded_channel();

        self.engine.handle_event(Event::Connected {
            client_id,
            outbound,
            is_master_link,
        });
        self.outbound.insert(client_id, receiver);
        self.decoders.insert(client_id, RespDecoder::new());

        client_id
    }

    /// Open a client connection
    pub fn connect(&mut self) -> ClientId {
        self.register(false)
    }

    /// Open the connection a replica keeps to this server's master
    pub fn connect_master_link(&mut self) -> ClientId {
        self.register(true)
    }

    /// Open a connection and complete a full resync on it, leaving it
    /// registered as a replica with the snapshot consumed
    pub fn connect_replica(&mut self) -> ClientId {
        let client_id = self.connect();
        self.send(client_id, &["PSYNC", "?", "-1"]);
        self.drain(client_id);

        let decoder = self.decoders.get_mut(&client_id).expect("decoder");
        let (fullresync, _) = decoder
            .next_value()
            .expect("valid FULLRESYNC")
            .expect("complete FULLRESYNC");
        assert!(matches!(fullresync, RespValue::SimpleString(ref line) if line.starts_with("FULLRESYNC ")));
        decoder
            .next_snapshot()
            .expect("valid snapshot frame")
            .expect("complete snapshot");

        client_id
    }

    /// Feed one request to the engine as if it arrived on `client_id`
    pub fn send(&mut self, client_id: ClientId, parts: &[&str]) {
        self.send_value(client_id, TestUtils::command(parts));
    }

    pub fn send_value(&mut self, client_id: ClientId, value: RespValue) {
        let wire_len = value.encoded_len();
        self.engine.handle_event(Event::Input {
            client_id,
            value,
            wire_len,
        });
    }

    fn drain(&mut self, client_id: ClientId) {
        let receiver = self.outbound.get_mut(&client_id).expect("connected client");
        let decoder = self.decoders.get_mut(&client_id).expect("decoder");

        while let Ok(bytes) = receiver.try_recv() {
            decoder.extend(&bytes);
        }
    }

    /// Every complete reply queued for `client_id` since the last call
    pub fn replies(&mut self, client_id: ClientId) -> Vec<RespValue> {
        self.drain(client_id);

        let decoder = self.decoders.get_mut(&client_id).expect("decoder");
        let mut replies = Vec::new();
        while let Some((value, _)) = decoder.next_value().expect("well-formed reply") {
            replies.push(value);
        }

        replies
    }

    /// Send a request and return the replies it produced
    pub fn exec(&mut self, client_id: ClientId, parts: &[&str]) -> Vec<RespValue> {
        self.send(client_id, parts);
        self.replies(client_id)
    }

    /// Send a request and assert it produced exactly `expected`
    pub fn assert_reply(&mut self, client_id: ClientId, parts: &[&str], expected: RespValue) {
        let replies = self.exec(client_id, parts);
        assert_eq!(replies, vec![expected], "replies to {:?}", parts);
    }

    /// Send a request and assert it produced no reply yet
    pub fn assert_blocked(&mut self, client_id: ClientId, parts: &[&str]) {
        let replies = self.exec(client_id, parts);
        assert!(replies.is_empty(), "{:?} replied {:?}", parts, replies);
        assert!(
            self.engine
                .session(client_id)
                .is_some_and(|session| session.awaiting),
            "{:?} should suspend the session",
            parts
        );
    }

    /// Resolve waiters as if `millis` had passed
    pub fn advance(&mut self, millis: u64) {
        self.engine.tick_at(now_millis() + millis);
    }

    pub fn end_of_stream(&mut self, client_id: ClientId) {
        self.engine.handle_event(Event::EndOfStream { client_id });
    }

    pub fn disconnect(&mut self, client_id: ClientId) {
        self.engine.handle_event(Event::Disconnected { client_id });
    }

    /// True once the engine dropped the session and its queue is drained
    pub fn is_closed(&mut self, client_id: ClientId) -> bool {
        let receiver = self.outbound.get_mut(&client_id).expect("connected client");
        matches!(
            receiver.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}

impl TestUtils {
    /// Build a request from its parts
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::bulk_string_array(parts.iter().copied())
    }

    pub fn ok() -> RespValue {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple(value: &str) -> RespValue {
        RespValue::SimpleString(value.to_string())
    }

    pub fn bulk(value: &str) -> RespValue {
        RespValue::BulkString(value.to_string())
    }

    pub fn integer(value: i64) -> RespValue {
        RespValue::Integer(value)
    }

    pub fn nil() -> RespValue {
        RespValue::NullBulkString
    }

    pub fn error(message: &str) -> RespValue {
        RespValue::Error(message.to_string())
    }

    pub fn bulk_array(values: &[&str]) -> RespValue {
        RespValue::bulk_string_array(values.iter().copied())
    }

    /// Start a server on an ephemeral port. Dropping the sender stops it.
    pub async fn spawn_server(config: Config) -> (SocketAddr, oneshot::Sender<()>) {
        let server = RedisServer::bind(Arc::new(config))
            .await
            .expect("server should bind");
        let addr = server.local_addr().expect("local address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            let _ = server.run_until(shutdown).await;
        });

        (addr, shutdown_tx)
    }
}

/// A raw RESP client over a real socket.
pub struct TestClient {
    stream: TcpStream,
    decoder: RespDecoder,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("server should accept");

        Self {
            stream,
            decoder: RespDecoder::new(),
        }
    }

    pub async fn write_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.expect("write request");
        self.stream.flush().await.expect("flush request");
    }

    pub async fn send(&mut self, parts: &[&str]) {
        let bytes = TestUtils::command(parts).encode();
        self.write_raw(&bytes).await;
    }

    /// Next reply, failing the test if none arrives within `wait`
    pub async fn read_reply_within(&mut self, wait: Duration) -> RespValue {
        timeout(wait, async {
            let mut buffer = [0u8; 1024];
            loop {
                if let Some((value, _)) = self.decoder.next_value().expect("well-formed reply") {
                    return value;
                }

                let n = self.stream.read(&mut buffer).await.expect("read reply");
                assert!(n > 0, "server closed the connection");
                self.decoder.extend(&buffer[..n]);
            }
        })
        .await
        .expect("reply should arrive in time")
    }

    pub async fn read_reply(&mut self) -> RespValue {
        self.read_reply_within(Duration::from_secs(2)).await
    }

    pub async fn request(&mut self, parts: &[&str]) -> RespValue {
        self.send(parts).await;
        self.read_reply().await
    }

    /// True if the server closes the connection within `wait`
    pub async fn is_closed_within(&mut self, wait: Duration) -> bool {
        let mut buffer = [0u8; 64];
        matches!(timeout(wait, self.stream.read(&mut buffer)).await, Ok(Ok(0)))
    }
}
