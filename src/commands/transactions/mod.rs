mod discard;
mod exec;
mod multi;

pub use discard::discard;
pub use exec::{exec, run_transaction};
pub use multi::multi;
