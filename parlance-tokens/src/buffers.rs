use crate::{Command, MESSAGE_LENGTH};
use std::fmt;

/// One IRC message being written into a `Buffer`.
///
/// The message is terminated with CRLF when this value is dropped.  Messages longer than
/// `MESSAGE_LENGTH` are cut (at a character boundary) before the CRLF is added, so that every line
/// sent to a client fits on the wire.
pub struct MessageBuffer<'a> {
    buf: &'a mut String,
    start: usize,
}

impl<'a> MessageBuffer<'a> {
    fn with_prefix<C>(buf: &'a mut String, prefix: &str, command: C) -> Self
    where
        C: Into<Command>,
    {
        let start = buf.len();
        if !prefix.is_empty() {
            buf.push(':');
            buf.push_str(prefix);
            buf.push(' ');
        }
        buf.push_str(command.into().as_str());
        MessageBuffer { buf, start }
    }

    /// Appends a middle parameter.  Surrounding whitespace is trimmed, and blank parameters are
    /// skipped.
    pub fn param(self, param: &str) -> Self {
        let param = param.trim();
        if param.is_empty() {
            return self;
        }
        self.buf.push(' ');
        self.buf.push_str(param);
        self
    }

    /// Appends the `Display` form of `param`, as is.
    ///
    /// ```rust
    /// # use parlance_tokens::{Buffer, rpl};
    /// let mut response = Buffer::new();
    /// response.message("irc.example.org", rpl::LIST).param("#rust").fmt_param(42);
    ///
    /// assert_eq!(&response.build(), ":irc.example.org 322 #rust 42\r\n");
    /// ```
    pub fn fmt_param<T>(self, param: T) -> Self
    where
        T: fmt::Display,
    {
        use std::fmt::Write as _;

        self.buf.push(' ');
        let _ = write!(self.buf, "{}", param);
        self
    }

    /// Appends the trailing parameter, which may be empty or contain spaces, and ends the message.
    pub fn trailing_param(self, param: &str) {
        self.buf.push_str(" :");
        self.buf.push_str(param);
    }

    /// Same as `trailing_param`, for values that implement `Display`.
    pub fn fmt_trailing_param<T>(self, param: T)
    where
        T: fmt::Display,
    {
        use std::fmt::Write as _;

        self.buf.push_str(" :");
        let _ = write!(self.buf, "{}", param);
    }

    /// Starts the trailing parameter and returns the underlying string, so that the caller can
    /// write it piece by piece.
    pub fn raw_trailing_param(&mut self) -> &mut String {
        self.buf.push_str(" :");
        self.buf
    }
}

impl Drop for MessageBuffer<'_> {
    fn drop(&mut self) {
        let mut end = self.start + MESSAGE_LENGTH - 2;
        if end < self.buf.len() {
            while !self.buf.is_char_boundary(end) {
                end -= 1;
            }
            self.buf.truncate(end);
        }
        self.buf.push_str("\r\n");
    }
}

/// A string of CRLF-terminated IRC messages.
///
/// ```rust
/// # use parlance_tokens::{Command, Buffer};
/// let mut response = Buffer::new();
/// response.message("alice!a@127.0.0.1", Command::Topic)
///     .param("#hall")
///     .trailing_param("Be nice");
/// response.message("alice!a@127.0.0.1", Command::Part).param("#hall");
///
/// assert_eq!(&response.build(), ":alice!a@127.0.0.1 TOPIC #hall :Be nice\r\n\
///                                :alice!a@127.0.0.1 PART #hall\r\n");
/// ```
#[derive(Debug, Default)]
pub struct Buffer {
    buf: String,
}

impl Buffer {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Starts a new message.  No prefix is written when `prefix` is empty.
    pub fn message<C>(&mut self, prefix: &str, command: C) -> MessageBuffer<'_>
    where
        C: Into<Command>,
    {
        self.buf.reserve(MESSAGE_LENGTH);
        MessageBuffer::with_prefix(&mut self.buf, prefix, command)
    }

    pub fn build(self) -> String {
        self.buf
    }
}

/// A `Buffer` for the replies sent to one client.
///
/// Replies are prefixed with the server domain and addressed to the client's nickname.
///
/// ```rust
/// # use parlance_tokens::{ReplyBuffer, rpl};
/// let mut response = ReplyBuffer::new("irc.example.org", "*");
/// response.reply(rpl::ERR_NOTREGISTERED).trailing_param("You have not registered");
/// response.set_nick("alice");
/// response.reply(rpl::YOUREOPER).trailing_param("You are now an IRC operator");
///
/// assert_eq!(&response.build(), ":irc.example.org 451 * :You have not registered\r\n\
///                                :irc.example.org 381 alice :You are now an IRC operator\r\n");
/// ```
#[derive(Debug)]
pub struct ReplyBuffer {
    buf: Buffer,
    domain: String,
    nick: String,
}

impl ReplyBuffer {
    pub fn new(domain: &str, nickname: &str) -> Self {
        Self {
            buf: Buffer::new(),
            domain: domain.to_owned(),
            nick: nickname.to_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Changes the target of the next replies, after a registration or a nick change.
    pub fn set_nick(&mut self, nickname: &str) {
        self.nick.clear();
        self.nick.push_str(nickname);
    }

    /// Starts a numeric reply: `:domain <reply> <nick>`.
    pub fn reply<C>(&mut self, r: C) -> MessageBuffer<'_>
    where
        C: Into<Command>,
    {
        let Self { buf, domain, nick } = self;
        buf.message(domain, r).param(nick)
    }

    /// Starts a message from the server that is not addressed to the nickname, like PONG.
    pub fn prefixed_message<C>(&mut self, command: C) -> MessageBuffer<'_>
    where
        C: Into<Command>,
    {
        let Self { buf, domain, .. } = self;
        buf.message(domain, command)
    }

    /// Starts a message with an arbitrary prefix, like the echo of a client's own command.
    pub fn message<C>(&mut self, prefix: &str, command: C) -> MessageBuffer<'_>
    where
        C: Into<Command>,
    {
        self.buf.message(prefix, command)
    }

    pub fn build(self) -> String {
        self.buf.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_trimmed() {
        let mut response = Buffer::new();
        response.message("", Command::Quit).param("").param("  bye ");
        assert_eq!(&response.build(), "QUIT bye\r\n");
    }

    #[test]
    fn test_long_messages_are_cut() {
        let prefix = "alice!alice@127.0.0.1";
        let text = "x".repeat(MESSAGE_LENGTH);
        let mut response = Buffer::new();
        response.message(prefix, Command::PrivMsg).param("#c").trailing_param(&text);
        response.message(prefix, Command::Part).param("#c");
        let res = response.build();

        let mut lines = res.split_terminator("\r\n");
        let long = lines.next().unwrap();
        assert_eq!(long.len() + 2, MESSAGE_LENGTH);
        assert!(long.starts_with(":alice!alice@127.0.0.1 PRIVMSG #c :xxx"));
        assert_eq!(lines.next(), Some(":alice!alice@127.0.0.1 PART #c"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_messages_are_cut_at_char_boundaries() {
        // "é" is two bytes long, so the limit falls in the middle of one.
        let text = "é".repeat(MESSAGE_LENGTH);
        let mut response = Buffer::new();
        response.message("a", Command::Topic).param("#c").trailing_param(&text);
        let res = response.build();

        assert!(res.ends_with("é\r\n"));
        assert!(res.len() <= MESSAGE_LENGTH);
        assert_eq!(res.len(), MESSAGE_LENGTH - 1);
    }

    #[test]
    fn test_raw_trailing_param() {
        let mut response = Buffer::new();
        {
            let mut msg = response.message("irc.example.org", "353").param("alice");
            let names = msg.raw_trailing_param();
            names.push_str("@alice");
            names.push(' ');
            names.push_str("bob");
        }
        assert_eq!(&response.build(), ":irc.example.org 353 alice :@alice bob\r\n");
    }
}
