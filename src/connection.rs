//! Per-connection I/O. A connection task only moves bytes: it decodes what
//! the peer sends into engine events and writes whatever the engine queues
//! for it.

use bytes::Bytes;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::debug;

use crate::{
    engine::Event,
    resp::RespDecoder,
    session::{next_client_id, ClientId},
};

/// Size of the scratch buffer each read lands in.
const READ_BUFFER_SIZE: usize = 1024;

/// Registers an accepted client with the engine and serves it until either
/// side closes.
pub async fn handle_connection(stream: TcpStream, events: UnboundedSender<Event>) {
    let client_id = next_client_id();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();

    if events
        .send(Event::Connected {
            client_id,
            outbound,
            is_master_link: false,
        })
        .is_err()
    {
        return;
    }

    let (reader, writer) = stream.into_split();
    drive(client_id, reader, writer, RespDecoder::new(), outbound_rx, events).await;
}

/// Reports the session gone when the task serving it ends, however it ends.
/// The engine ignores the event for a session it has already removed.
struct DisconnectGuard {
    client_id: ClientId,
    events: UnboundedSender<Event>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let _ = self.events.send(Event::Disconnected {
            client_id: self.client_id,
        });
    }
}

/// Pumps bytes both ways for one registered session.
///
/// Reading stops at end of stream, but queued replies are still written
/// until the engine drops the session's sender. `decoder` may already hold
/// bytes read during a handshake.
pub async fn drive(
    client_id: ClientId,
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut decoder: RespDecoder,
    mut outbound: UnboundedReceiver<Bytes>,
    events: UnboundedSender<Event>,
) {
    let _guard = DisconnectGuard {
        client_id,
        events: events.clone(),
    };
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut read_open = true;

    if !decoder.is_empty() && !forward_decoded(client_id, &mut decoder, &events) {
        return;
    }

    loop {
        tokio::select! {
            read = reader.read(&mut buffer), if read_open => match read {
                Ok(0) => {
                    read_open = false;
                    if events.send(Event::EndOfStream { client_id }).is_err() {
                        break;
                    }
                }
                Ok(n) => {
                    decoder.extend(&buffer[..n]);
                    if !forward_decoded(client_id, &mut decoder, &events) {
                        break;
                    }
                }
                Err(e) => {
                    debug!(client_id, error = %e, "read failed");
                    break;
                }
            },
            bytes = outbound.recv() => match bytes {
                Some(bytes) => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        debug!(client_id, error = %e, "write failed");
                        break;
                    }
                }
                None => break,
            },
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(client_id, error = %e, "shutdown failed");
    }
}

/// Sends every complete request in the decoder to the engine. Returns false
/// once the engine is gone.
fn forward_decoded(
    client_id: ClientId,
    decoder: &mut RespDecoder,
    events: &UnboundedSender<Event>,
) -> bool {
    loop {
        let event = match decoder.next_value() {
            Ok(Some((value, wire_len))) => Event::Input {
                client_id,
                value,
                wire_len,
            },
            Ok(None) => return true,
            Err(error) => {
                decoder.clear();
                Event::ProtocolError { client_id, error }
            }
        };

        if events.send(event).is_err() {
            return false;
        }
    }
}
