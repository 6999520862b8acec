use std::collections::HashSet;

use crate::{
    blocking::ListWaiter,
    commands::{command_error::CommandError, command_handler::CommandResult},
    engine::Engine,
    resp::RespValue,
    session::ClientId,
    store::now_millis,
};

/// Represents the parsed arguments for the BLPOP command
pub struct BlpopArguments {
    /// Lists to pop from, checked in order
    keys: Vec<String>,
    /// Seconds to wait; `None` waits forever
    timeout_secs: Option<f64>,
}

impl BlpopArguments {
    /// Parses `BLPOP key [key ...] timeout`.
    ///
    /// The timeout may be omitted when a single key is given. It is a number
    /// of seconds and may be fractional; `0` waits forever.
    ///
    /// # Returns
    ///
    /// * `Ok(BlpopArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If no key was given
    /// * `Err(CommandError::InvalidTimeout)` - If the timeout is not a
    ///   non-negative number
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let args = BlpopArguments::parse(vec!["fruits".to_string(), "0.5".to_string()]).unwrap();
    /// // keys: ["fruits"], timeout_secs: Some(0.5)
    ///
    /// let args = BlpopArguments::parse(vec!["fruits".to_string(), "0".to_string()]).unwrap();
    /// // keys: ["fruits"], timeout_secs: None
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        match arguments.len() {
            0 => Err(CommandError::wrong_arguments("blpop")),
            1 => Ok(Self {
                keys: arguments,
                timeout_secs: None,
            }),
            len => {
                let timeout = arguments[len - 1]
                    .parse::<f64>()
                    .map_err(|_| CommandError::InvalidTimeout)?;

                if !timeout.is_finite() || timeout < 0.0 {
                    return Err(CommandError::InvalidTimeout);
                }

                Ok(Self {
                    keys: arguments[..len - 1].to_vec(),
                    timeout_secs: (timeout > 0.0).then_some(timeout),
                })
            }
        }
    }

    fn deadline(&self, now: u64) -> Option<u64> {
        self.timeout_secs
            .map(|secs| now.saturating_add((secs * 1_000.0).ceil() as u64))
    }
}

/// Replication form of a pop performed by BLPOP.
fn lpop_command(key: &str) -> RespValue {
    RespValue::bulk_string_array(["LPOP", key])
}

/// Handles the Redis BLPOP command.
///
/// Pops the head of the first non-empty list among `keys` and replies with
/// `[key, value]`. When every list is empty the client is queued behind any
/// earlier waiters on each key and the session is suspended; the engine
/// serves it through [`serve_list_waiters`] once a push lands or the
/// timeout passes, in which case the reply is a null bulk string.
///
/// A pop is replicated as `LPOP key`, since replicas must not block.
///
/// # Examples
///
/// ```ignore
/// // BLPOP fruits 0 with fruits = [apple]
/// // Returns: Response(["fruits", "apple"])
///
/// // BLPOP fruits 0 with fruits missing
/// // Returns: Blocked
/// ```
pub fn blpop(
    engine: &mut Engine,
    client_id: ClientId,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    for key in &blpop_arguments.keys {
        if let Some(value) = engine.store.pop_front(key, 1)?.into_iter().next() {
            engine.propagate(&lpop_command(key));
            return Ok(CommandResult::Response(RespValue::bulk_string_array([
                key.clone(),
                value,
            ])));
        }
    }

    if !allow_blocking {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    }

    let deadline = blpop_arguments.deadline(now_millis());
    for key in &blpop_arguments.keys {
        engine.waiters.block_on_list(
            key,
            ListWaiter {
                client_id,
                deadline,
            },
        );
    }

    Ok(CommandResult::Blocked)
}

/// Hands list heads to queued BLPOP clients in arrival order, then times out
/// the ones whose deadline passed.
pub fn serve_list_waiters(engine: &mut Engine, now: u64) {
    for key in engine.waiters.list_keys() {
        while let Some(waiter) = engine.waiters.front_list_waiter(&key).cloned() {
            if !engine.store.list_has_items(&key) {
                break;
            }

            let Ok(popped) = engine.store.pop_front(&key, 1) else {
                break;
            };
            let Some(value) = popped.into_iter().next() else {
                break;
            };

            engine.waiters.purge_client(waiter.client_id);
            engine.propagate(&lpop_command(&key));
            engine.complete_blocked(
                waiter.client_id,
                RespValue::bulk_string_array([key.clone(), value]),
            );
        }
    }

    let mut timed_out = HashSet::new();
    for (_, waiter) in engine.waiters.take_expired_list_waiters(now) {
        if timed_out.insert(waiter.client_id) {
            engine.waiters.purge_client(waiter.client_id);
            engine.complete_blocked(waiter.client_id, RespValue::NullBulkString);
        }
    }
}
