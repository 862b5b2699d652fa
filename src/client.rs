//! Client management and connection state.

use parlance_tokens::{Buffer, ReplyBuffer};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A message, or several messages, ready to be written on a connection.
///
/// Cheap to clone, so that broadcasts do not copy the message for each recipient.
#[derive(Clone, Debug)]
pub struct MessageQueueItem(Arc<str>);

impl From<String> for MessageQueueItem {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Buffer> for MessageQueueItem {
    fn from(response: Buffer) -> Self {
        Self::from(response.build())
    }
}

impl From<ReplyBuffer> for MessageQueueItem {
    fn from(response: ReplyBuffer) -> Self {
        Self::from(response.build())
    }
}

impl AsRef<str> for MessageQueueItem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for MessageQueueItem {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// The write end of a connection's outgoing queue.
///
/// The queue is unbounded, so pushing messages onto it never blocks.  The connection's writer
/// task drains the other end.
pub type MessageQueue = mpsc::UnboundedSender<MessageQueueItem>;

/// Lifecycle of a connection.
///
/// The variants are ordered: a connection only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    /// The client has not sent NICK nor USER yet.
    Unknown,

    /// The client has sent NICK or USER, but has not completed its registration.
    Identified,

    /// The client has sent both NICK and USER and holds its nickname.
    Registered,
}

/// Connection data, as stored in the connection directory.
#[derive(Clone, Debug)]
pub struct Connection {
    pub host: String,
    pub state: ConnectionState,
}

impl Connection {
    pub fn new(host: String) -> Self {
        Self {
            host,
            state: ConnectionState::Unknown,
        }
    }

    /// Moves the connection to `state`.
    ///
    /// Returns false and leaves the connection untouched if that would be a downgrade.
    pub fn advance(&mut self, state: ConnectionState) -> bool {
        if state < self.state {
            return false;
        }
        self.state = state;
        true
    }
}

/// User data.
///
/// The connection task owns the authoritative `User` of its client.  The user directory holds a
/// copy of it from the moment the client completes its registration.
#[derive(Clone, Debug)]
pub struct User {
    /// The connection ID, key of the connection directory.
    pub id: usize,

    /// The queue of messages to be sent to the client.
    queue: MessageQueue,

    host: String,
    nick: Option<String>,
    user: Option<String>,
    real: String,

    /// `nick!user@host`, used as prefix of the messages sent on behalf of this user.
    full_name: String,

    registered: bool,
    operator: bool,
    away_message: Option<String>,

    /// The reason sent when a client quits.
    ///
    /// Set when it issues a "QUIT" message.
    quit_message: Option<String>,
}

impl User {
    /// Initialize the data for a new client, given its connection ID, host and message queue.
    pub fn new(id: usize, host: String, queue: MessageQueue) -> Self {
        let mut res = Self {
            id,
            queue,
            host,
            nick: None,
            user: None,
            real: String::new(),
            full_name: String::new(),
            registered: false,
            operator: false,
            away_message: None,
            quit_message: None,
        };
        res.update_full_name();
        res
    }

    fn update_full_name(&mut self) {
        self.full_name.clear();
        self.full_name.push_str(self.nick.as_deref().unwrap_or("*"));
        self.full_name.push('!');
        self.full_name.push_str(self.user.as_deref().unwrap_or("*"));
        self.full_name.push('@');
        self.full_name.push_str(&self.host);
    }

    /// Add a message to the client message queue.
    ///
    /// Returns `Err(())` if the connection's writer is gone.
    pub fn send<M>(&self, msg: M) -> Result<(), ()>
        where M: Into<MessageQueueItem>
    {
        self.queue.send(msg.into()).map_err(|_| ())
    }

    /// A handle on the client message queue, used to send messages without holding any lock.
    pub fn queue(&self) -> MessageQueue {
        self.queue.clone()
    }

    /// The nickname of the client, or `*` if it has not given any.
    pub fn nick(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    pub fn has_nick(&self) -> bool {
        self.nick.is_some()
    }

    /// Change the nickname of the client.
    ///
    /// This function does not change the user directory.
    pub fn set_nick(&mut self, nick: &str) {
        self.nick = Some(nick.to_owned());
        self.update_full_name();
    }

    pub fn clear_nick(&mut self) {
        self.nick = None;
        self.update_full_name();
    }

    /// The username, or `*` if it has not given any.
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("*")
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }

    pub fn real(&self) -> &str {
        &self.real
    }

    /// Change the username and the realname of the client.
    pub fn set_user_real(&mut self, user: &str, real: &str) {
        self.user = Some(user.to_owned());
        self.real.clear();
        self.real.push_str(real);
        self.update_full_name();
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `nick!user@host`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn set_registered(&mut self) {
        self.registered = true;
    }

    pub fn is_operator(&self) -> bool {
        self.operator
    }

    pub fn set_operator(&mut self) {
        self.operator = true;
    }

    pub fn away_message(&self) -> Option<&str> {
        self.away_message.as_deref()
    }

    pub fn set_away_message(&mut self, message: Option<&str>) {
        self.away_message = message.map(str::to_owned);
    }

    /// The client quit message, if it has sent a QUIT.
    pub fn quit_message(&self) -> Option<&str> {
        self.quit_message.as_deref()
    }

    pub fn set_quit_message(&mut self, reason: &str) {
        self.quit_message = Some(reason.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_is_monotonic() {
        let mut conn = Connection::new("127.0.0.1".to_owned());
        assert!(conn.advance(ConnectionState::Identified));
        assert!(conn.advance(ConnectionState::Registered));
        assert!(!conn.advance(ConnectionState::Identified));
        assert!(!conn.advance(ConnectionState::Unknown));
        assert_eq!(conn.state, ConnectionState::Registered);
        assert!(conn.advance(ConnectionState::Registered));
    }

    #[test]
    fn test_full_name() {
        let (queue, _outgoing) = mpsc::unbounded_channel();
        let mut user = User::new(0, "127.0.0.1".to_owned(), queue);
        assert_eq!(user.nick(), "*");
        assert_eq!(user.full_name(), "*!*@127.0.0.1");

        user.set_nick("alice");
        user.set_user_real("a", "Alice A");
        assert_eq!(user.full_name(), "alice!a@127.0.0.1");
        assert_eq!(user.real(), "Alice A");
    }

    #[test]
    fn test_send_fails_once_writer_is_gone() {
        let (queue, outgoing) = mpsc::unbounded_channel();
        let user = User::new(0, "127.0.0.1".to_owned(), queue);
        assert_eq!(user.send(String::from("PING :x\r\n")), Ok(()));
        drop(outgoing);
        assert_eq!(user.send(String::from("PING :x\r\n")), Err(()));
    }
}
