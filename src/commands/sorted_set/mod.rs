mod zadd;
mod zcard;
mod zrange;
mod zrank;
mod zrem;
mod zscore;

pub use zadd::{zadd, ZaddArguments};
pub use zcard::{zcard, ZcardArguments};
pub use zrange::{zrange, ZrangeArguments};
pub use zrank::{zrank, ZrankArguments};
pub use zrem::{zrem, ZremArguments};
pub use zscore::{zscore, ZscoreArguments};
