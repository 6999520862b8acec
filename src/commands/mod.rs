mod blpop;
mod command_error;
mod command_handler;
mod config_get;
mod echo;
mod get;
mod incr;
mod info;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod pub_sub;
mod replication;
mod rpush_and_lpush;
mod set;
mod sorted_set;
mod stream_utils;
mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use blpop::serve_list_waiters;
pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandResult};
pub use replication::{finish_waits, getack_probe};
pub use transactions::run_transaction;
pub use xread::serve_stream_waiters;
