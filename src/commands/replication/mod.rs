mod psync;
mod replconf;
mod wait;

pub use psync::{psync, PsyncArguments};
pub use replconf::{replconf, ReplconfArguments};
pub use wait::{finish_waits, getack_probe, wait, WaitArguments};
