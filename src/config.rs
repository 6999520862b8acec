use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_REPLICATION_ID: &str = "8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("--replicaof expects \"<host> <port>\", got \"{0}\"")]
    InvalidReplicaOf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for MasterAddress {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();

        match (parts.next(), parts.next(), parts.next()) {
            (Some(host), Some(port), None) => Ok(MasterAddress {
                host: host.to_string(),
                port: port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidReplicaOf(input.to_string()))?,
            }),
            _ => Err(ConfigError::InvalidReplicaOf(input.to_string())),
        }
    }
}

impl fmt::Display for MasterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Everything the server needs to know about where it runs and what it is.
pub trait ConfigSource: fmt::Debug + Send + Sync {
    fn role(&self) -> Role;
    fn port(&self) -> u16;
    fn dir(&self) -> &Path;
    fn dbfilename(&self) -> &str;
    fn replication_id(&self) -> &str;
    fn master_address(&self) -> Option<&MasterAddress>;

    fn snapshot_path(&self) -> PathBuf {
        self.dir().join(self.dbfilename())
    }
}

/// Command line flags.
#[derive(Parser, Debug, Clone)]
#[command(name = "redis-lite", version, about = "In-memory Redis-compatible server")]
pub struct Config {
    /// Port to accept client connections on.
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Directory holding the snapshot file.
    #[arg(long, default_value = "/tmp/redis-data")]
    pub dir: PathBuf,

    /// Snapshot file name inside `--dir`.
    #[arg(long, default_value = "dump.rdb")]
    pub dbfilename: String,

    /// Run as a replica of "<host> <port>".
    #[arg(long, value_parser = parse_master_address)]
    pub replicaof: Option<MasterAddress>,

    #[arg(skip = DEFAULT_REPLICATION_ID.to_string())]
    pub replication_id: String,
}

fn parse_master_address(input: &str) -> Result<MasterAddress, ConfigError> {
    input.parse()
}

impl Config {
    pub fn for_master(port: u16) -> Self {
        Self {
            port,
            dir: PathBuf::from("/tmp/redis-data"),
            dbfilename: "dump.rdb".to_string(),
            replicaof: None,
            replication_id: DEFAULT_REPLICATION_ID.to_string(),
        }
    }

    pub fn for_replica(port: u16, master_host: &str, master_port: u16) -> Self {
        Self {
            replicaof: Some(MasterAddress {
                host: master_host.to_string(),
                port: master_port,
            }),
            ..Self::for_master(port)
        }
    }

    pub fn with_snapshot(mut self, dir: impl Into<PathBuf>, dbfilename: &str) -> Self {
        self.dir = dir.into();
        self.dbfilename = dbfilename.to_string();
        self
    }
}

impl ConfigSource for Config {
    fn role(&self) -> Role {
        match self.replicaof {
            Some(_) => Role::Slave,
            None => Role::Master,
        }
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn dbfilename(&self) -> &str {
        &self.dbfilename
    }

    fn replication_id(&self) -> &str {
        &self.replication_id
    }

    fn master_address(&self) -> Option<&MasterAddress> {
        self.replicaof.as_ref()
    }
}
