//! Testing utilities for `parlance::state`

use super::State;
use crate::client::{MessageQueueItem, User};
use crate::config;
use parlance_tokens::{assert_msg, Command, Message};
use tokio::sync::mpsc;

pub type Queue = mpsc::UnboundedReceiver<MessageQueueItem>;

/// The domain of `simple_state`.
pub const DOMAIN: &str = "parlance.localdomain";

pub fn simple_state() -> State {
    State::new(config::State::sample())
}

pub async fn add_client(s: &State) -> (User, Queue) {
    let (msg_queue, outgoing_msgs) = mpsc::unbounded_channel();
    let user = s.peer_joined("127.0.0.1".to_owned(), msg_queue).await;
    (user, outgoing_msgs)
}

pub async fn add_registered_client(s: &State, nickname: &str) -> (User, Queue) {
    let (mut user, queue) = add_client(s).await;
    handle_message(s, &mut user, &format!("NICK :{}", nickname)).await;
    handle_message(s, &mut user, "USER X X X X").await;
    (user, queue)
}

/// Passes `message` to the state, and cleans up after the client like the connection task would
/// when the connection must be closed.
pub async fn handle_message(state: &State, user: &mut User, message: &str) {
    let message = Message::parse(message).expect("bad message");
    if state.handle_message(user, message).await.is_err() {
        state.peer_quit(user, None).await;
    }
}

pub fn flush(queue: &mut Queue) {
    loop {
        match queue.try_recv() {
            Ok(_msg) => {}
            Err(mpsc::error::TryRecvError::Empty) => return,
            Err(_) => unreachable!(),
        }
    }
}

pub fn collect(res: &mut String, queue: &mut Queue) {
    loop {
        match queue.try_recv() {
            Ok(item) => {
                let s: &str = item.as_ref();
                res.push_str(s);
            }
            Err(mpsc::error::TryRecvError::Empty) => return,
            Err(_) => unreachable!(),
        }
    }
}

pub fn messages(s: &str) -> impl Iterator<Item = Message> + '_ {
    s.lines()
        .map(|line| Message::parse(line).expect("bad message"))
}

type ExpectedMessage<'a> = (Option<&'a str>, Result<Command, &'a str>, &'a [&'a str]);

pub fn assert_msgs(s: &str, expected: &[ExpectedMessage<'_>]) {
    let mut i = 0;
    for msg in messages(s) {
        assert!(i < expected.len(), "unexpected message {:?}", msg);
        let (prefix, command, params) = expected[i];
        assert_msg(&msg, prefix, command, params);
        i += 1;
    }
    assert_eq!(i, expected.len());
}
