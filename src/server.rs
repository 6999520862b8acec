use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    sync::mpsc::{self, UnboundedSender},
};
use tracing::{info, warn};

use crate::{
    config::{ConfigSource, Role},
    connection::handle_connection,
    engine::{Engine, Event},
    rdb::RdbSnapshotReader,
    replication::run_replica_link,
    store::Store,
};

/// A bound listener plus the configuration the engine will run with.
pub struct RedisServer {
    listener: TcpListener,
    config: Arc<dyn ConfigSource>,
}

impl RedisServer {
    /// Binds `127.0.0.1:<port>`. Port 0 picks a free port, see [`Self::local_addr`].
    pub async fn bind(config: Arc<dyn ConfigSource>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", config.port()))
            .await
            .with_context(|| format!("failed to bind port {}", config.port()))?;

        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts clients until `shutdown` resolves. The engine and any master
    /// link stop once the last connection referencing them is gone.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let RedisServer { listener, config } = self;
        tokio::pin!(shutdown);

        let (events, events_rx) = mpsc::unbounded_channel();
        let store = Store::new(Box::new(RdbSnapshotReader::new(config.snapshot_path())));
        let engine = Engine::new(Arc::clone(&config), store);
        tokio::spawn(engine.run(events_rx));

        if config.role() == Role::Slave {
            tokio::spawn(run_replica_link(Arc::clone(&config), events.clone()));
        }

        info!(addr = %listener.local_addr()?, role = %config.role(), "accepting connections");

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &events);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn handle_accept_result(
    result: std::io::Result<(TcpStream, SocketAddr)>,
    events: &UnboundedSender<Event>,
) {
    match result {
        Ok((stream, peer)) => {
            if let Err(err) = stream.set_nodelay(true) {
                warn!(%peer, error = ?err, "failed to disable nagle");
            }
            tokio::spawn(handle_connection(stream, events.clone()));
        }
        Err(err) => warn!(error = ?err, "failed to accept connection"),
    }
}
