//! The replica side of replication: handshake, full resync and the
//! long-lived link that streams the master's writes into the engine.

use std::{path::Path, sync::Arc, time::Duration};

use bytes::Bytes;
use regex::Regex;
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc::{self, UnboundedSender},
    time::sleep,
};
use tracing::{info, warn};

use crate::{
    config::{ConfigSource, MasterAddress},
    connection::drive,
    engine::Event,
    resp::{RespDecoder, RespError, RespValue},
    session::next_client_id,
};

/// Pause between a failed or lost link and the next attempt.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Errors that end one replication attempt. The whole handshake is retried.
#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("expected {expected} from master, got {got:?}")]
    UnexpectedReply { expected: String, got: RespValue },
    #[error("invalid FULLRESYNC reply: {0}")]
    InvalidFullResync(String),
    #[error("malformed reply from master: {0}")]
    Protocol(#[from] RespError),
    #[error("master closed the connection")]
    ConnectionClosed,
    #[error("could not persist snapshot: {0}")]
    Persist(String),
}

/// A synced connection to the master, with any bytes read past the
/// snapshot still in the decoder.
struct MasterLink {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    decoder: RespDecoder,
}

/// Keeps this replica attached to its master for as long as the engine runs.
///
/// Each attempt connects, performs the handshake, stores the snapshot the
/// master sends and then hands the connection to the engine as the master
/// link. A failure at any step, or the link closing later, starts over after
/// [`RETRY_DELAY`].
pub async fn run_replica_link(config: Arc<dyn ConfigSource>, events: UnboundedSender<Event>) {
    let Some(master) = config.master_address().cloned() else {
        return;
    };

    loop {
        match connect_and_sync(config.as_ref(), &master).await {
            Ok(link) => {
                let client_id = next_client_id();
                let (outbound, outbound_rx) = mpsc::unbounded_channel();

                if events
                    .send(Event::Connected {
                        client_id,
                        outbound,
                        is_master_link: true,
                    })
                    .is_err()
                {
                    return;
                }

                info!(client_id, %master, "synced with master");
                drive(
                    client_id,
                    link.reader,
                    link.writer,
                    link.decoder,
                    outbound_rx,
                    events.clone(),
                )
                .await;
                warn!(client_id, %master, "lost connection to master");
            }
            Err(e) => warn!(%master, error = %e, "replication attempt failed"),
        }

        if events.is_closed() {
            return;
        }

        sleep(RETRY_DELAY).await;
    }
}

async fn connect_and_sync(
    config: &dyn ConfigSource,
    master: &MasterAddress,
) -> Result<MasterLink, ReplicationError> {
    let stream = TcpStream::connect((master.host.as_str(), master.port)).await?;
    let (reader, writer) = stream.into_split();
    let mut link = MasterLink {
        reader,
        writer,
        decoder: RespDecoder::new(),
    };

    link.expect_ok_reply(RespValue::bulk_string_array(["PING"]), "PONG")
        .await?;
    link.expect_ok_reply(
        RespValue::bulk_string_array([
            "REPLCONF".to_string(),
            "listening-port".to_string(),
            config.port().to_string(),
        ]),
        "OK",
    )
    .await?;
    link.expect_ok_reply(
        RespValue::bulk_string_array(["REPLCONF", "capa", "psync2"]),
        "OK",
    )
    .await?;

    link.send(RespValue::bulk_string_array(["PSYNC", "?", "-1"]))
        .await?;
    let (replication_id, offset) = parse_full_resync(&link.read_value().await?)?;
    info!(%replication_id, offset, "full resync started");

    let snapshot = link.read_snapshot().await?;
    persist_snapshot(&config.snapshot_path(), &snapshot).await?;
    info!(bytes = snapshot.len(), "snapshot received");

    Ok(link)
}

impl MasterLink {
    async fn send(&mut self, command: RespValue) -> Result<(), ReplicationError> {
        self.writer.write_all(&command.encode()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn expect_ok_reply(
        &mut self,
        command: RespValue,
        expected: &str,
    ) -> Result<(), ReplicationError> {
        self.send(command).await?;

        match self.read_value().await? {
            RespValue::SimpleString(reply) if reply.eq_ignore_ascii_case(expected) => Ok(()),
            got => Err(ReplicationError::UnexpectedReply {
                expected: expected.to_string(),
                got,
            }),
        }
    }

    async fn fill(&mut self) -> Result<(), ReplicationError> {
        let mut buffer = [0u8; 1024];
        let n = self.reader.read(&mut buffer).await?;

        if n == 0 {
            return Err(ReplicationError::ConnectionClosed);
        }

        self.decoder.extend(&buffer[..n]);
        Ok(())
    }

    async fn read_value(&mut self) -> Result<RespValue, ReplicationError> {
        loop {
            if let Some((value, _)) = self.decoder.next_value()? {
                return Ok(value);
            }
            self.fill().await?;
        }
    }

    async fn read_snapshot(&mut self) -> Result<Bytes, ReplicationError> {
        loop {
            if let Some(snapshot) = self.decoder.next_snapshot()? {
                return Ok(snapshot);
            }
            self.fill().await?;
        }
    }
}

/// Extracts the replication id and offset from `+FULLRESYNC <id> <offset>`.
fn parse_full_resync(reply: &RespValue) -> Result<(String, u64), ReplicationError> {
    let RespValue::SimpleString(line) = reply else {
        return Err(ReplicationError::UnexpectedReply {
            expected: "FULLRESYNC".to_string(),
            got: reply.clone(),
        });
    };

    let pattern = Regex::new(r"^FULLRESYNC ([a-zA-Z0-9]{40}) (\d+)$")
        .map_err(|e| ReplicationError::InvalidFullResync(e.to_string()))?;
    let captures = pattern
        .captures(line)
        .ok_or_else(|| ReplicationError::InvalidFullResync(line.clone()))?;

    let offset = captures[2]
        .parse::<u64>()
        .map_err(|_| ReplicationError::InvalidFullResync(line.clone()))?;

    Ok((captures[1].to_string(), offset))
}

async fn persist_snapshot(path: &Path, snapshot: &[u8]) -> Result<(), ReplicationError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ReplicationError::Persist(e.to_string()))?;
    }

    tokio::fs::write(path, snapshot)
        .await
        .map_err(|e| ReplicationError::Persist(e.to_string()))
}
