//! Parse and build IRC messages.
//!
//! This library provides an owned IRC message type that can be parsed from and serialized back to
//! the wire format, and builders to write outgoing messages and numeric replies.

#![forbid(unsafe_code)]
#![warn(clippy::all, rust_2018_idioms)]
#![allow(clippy::shadow_unrelated, clippy::use_self)]

pub use buffers::{Buffer, MessageBuffer, ReplyBuffer};
pub use command::Command;
pub use message::{Message, ParamError, MESSAGE_LENGTH, PARAMS_LENGTH};

mod buffers;
mod command;
mod message;
pub mod mode;
pub mod rpl;

/// Assert all data of a message.
///
/// Empty elements in `params` will not be asserted with their equivalent in `msg.params`, but will
/// still count for the assertion of the number of parameters.
pub fn assert_msg(
    msg: &Message,
    prefix: Option<&str>,
    command: Result<Command, &str>,
    params: &[&str],
) {
    assert_eq!(msg.prefix.as_deref(), prefix, "prefix of {:?}", msg);
    assert_eq!(
        msg.command.as_ref().map_err(String::as_str).map(|c| *c),
        command,
        "command of {:?}",
        msg
    );
    assert_eq!(
        msg.params.len(),
        params.len(),
        "number of parameters of {:?}",
        msg
    );
    for (i, (actual, expected)) in msg.params.iter().zip(params.iter()).enumerate() {
        if expected.is_empty() {
            // Some parameters depend on the environment (e.g. the creation date in RPL_CREATED),
            // so they are skipped.
            continue;
        }
        assert_eq!(actual, expected, "parameter #{} of {:?}", i, msg);
    }
}
