use crate::Command;
use std::fmt;

/// The maximum length of a message, CRLF included.
///
/// `Message::parse` can parse messages longer than that.  It is used by `Buffer` to avoid multiple
/// allocations when building the same message, and by readers to bound incoming lines.
pub const MESSAGE_LENGTH: usize = 512;

/// The maximum number of parameters a message can hold.
pub const PARAMS_LENGTH: usize = 15;

/// Returns `(word, rest)` where `word` is the first word of the given string and `rest` is the
/// substring starting at the first character of the second word.
///
/// Word boundaries here are spaces only.
fn parse_word(s: &str) -> (&str, &str) {
    let mut split = s.splitn(2, ' ');
    let word = split.next().unwrap_or("");
    let rest = split.next().unwrap_or("").trim_start_matches(' ');
    (word, rest)
}

/// If the given string starts with a prefix, returns `(Some(prefix), rest)` where `rest` starts
/// from the first word after the prefix.
///
/// Otherwise returns `(None, rest)` where `rest` is the substring starting from the first word of
/// the given string.
fn parse_prefix(buf: &str) -> (Option<&str>, &str) {
    if buf.starts_with(':') {
        let (prefix, rest) = parse_word(buf);
        (Some(&prefix[1..]), rest)
    } else {
        (None, buf.trim_start())
    }
}

/// Parses the first word of the string the same way as `parse_word`, and then tries to parse it as
/// a command.
///
/// On success, it returns `(Ok(command), rest)`.  On failure, when the command is not a variant of
/// `Command`, it returns `(Err(unknown_command), rest)`.
fn parse_command(buf: &str) -> (Result<Command, &str>, &str) {
    let (command_string, rest) = parse_word(buf);
    (Command::parse(command_string).ok_or(command_string), rest)
}

/// Whether the given parameter must be sent as a trailing parameter to survive parsing.
fn needs_colon(param: &str) -> bool {
    param.is_empty() || param.contains(' ') || param.starts_with(':')
}

/// Errors returned by `Message::add_param`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamError {
    /// The message already holds `PARAMS_LENGTH` parameters.
    TooMany,

    /// The last parameter of the message is a trailing parameter.
    AfterTrailing,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooMany => write!(f, "a message cannot have more than {} parameters", PARAMS_LENGTH),
            Self::AfterTrailing => write!(f, "no parameter can follow the trailing parameter"),
        }
    }
}

impl std::error::Error for ParamError {}

/// An IRC message.
///
/// See `Message::parse` for documentation on how to read IRC messages, and `Buffer` for
/// how to create messages.
///
/// See the RFC 2812 for a complete description of IRC messages:
/// <https://tools.ietf.org/html/rfc2812.html#section-2.3>.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The prefix of the message, without the leading `:`.
    pub prefix: Option<String>,

    /// The command of the message.
    ///
    /// It can either be a valid command in the form of `Ok(Command::_)`, or a simple string.
    /// `Message::parse` sets this field to `Err(_)` if the command is not a variant of `Command`.
    pub command: Result<Command, String>,

    /// The parameters of the message, at most `PARAMS_LENGTH` of them.
    pub params: Vec<String>,

    /// Whether the last parameter is a trailing parameter.
    ///
    /// A trailing parameter may contain spaces and is never split.
    pub trailing: bool,
}

impl Message {
    /// Creates a message with the given command, no prefix and no parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use parlance_tokens::{Command, Message};
    /// let mut ping = Message::new(Command::Ping);
    /// ping.add_param("hello there", true).unwrap();
    ///
    /// assert_eq!(&ping.serialize(), "PING :hello there\r\n");
    /// ```
    pub fn new<C>(command: C) -> Self
    where
        C: Into<Command>,
    {
        Self {
            prefix: None,
            command: Ok(command.into()),
            params: Vec::new(),
            trailing: false,
        }
    }

    /// Sets the prefix of the message.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_owned());
        self
    }

    /// Parses a string and returns information about the IRC message.
    ///
    /// Relevant source of information:
    /// <https://tools.ietf.org/html/rfc2812.html#section-2.3>.
    ///
    /// # Examples
    ///
    /// Here's an example of message parsing:
    ///
    /// ```rust
    /// # use parlance_tokens::{Command, Message};
    /// let privmsg = Message::parse(":ser PRIVMSG #fosdem :I'm Simon Sir\r\n").unwrap();
    ///
    /// assert_eq!(privmsg.prefix.as_deref(), Some("ser"));
    /// assert_eq!(privmsg.command, Ok(Command::PrivMsg));
    /// assert_eq!(privmsg.params, vec!["#fosdem", "I'm Simon Sir"]);
    /// assert!(privmsg.trailing);
    /// ```
    ///
    /// If the command is unknown, it is stored as `Err(command_string)`, where `command_string` is
    /// taken from the input string:
    ///
    /// ```rust
    /// # use parlance_tokens::{Command, Message};
    /// let unknown = Message::parse("Typo arg1\r\n").unwrap();
    ///
    /// assert_eq!(unknown.prefix, None);
    /// assert_eq!(unknown.command, Err("Typo".to_owned()));
    /// assert_eq!(unknown.params, vec!["arg1"]);
    /// ```
    ///
    /// # Return value
    ///
    /// Returns `Some(msg)` when the message is correctly formed, `None` otherwise.  Correctly
    /// formed means the message has a command and no NUL byte.
    ///
    /// ```rust
    /// # use parlance_tokens::Message;
    /// let empty = Message::parse("  \r \n \t ");
    /// let no_command = Message::parse(":prefix");
    ///
    /// assert!(empty.is_none());
    /// assert!(no_command.is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Message> {
        // Only the line ending is stripped at the end, the trailing parameter keeps its spaces.
        let mut buf = s.trim_end_matches(|c: char| c == '\r' || c == '\n').trim_start();
        if buf.is_empty() || buf.contains('\0') {
            return None;
        }

        let (prefix, rest) = parse_prefix(buf);
        buf = rest;
        let (command, rest) = parse_command(buf);
        buf = rest;

        if let Err("") = command {
            return None;
        }

        let mut params = Vec::new();
        let mut trailing = false;
        while !buf.is_empty() {
            if buf.starts_with(':') {
                params.push(buf[1..].to_owned());
                trailing = true;
                break;
            }
            if params.len() == PARAMS_LENGTH - 1 {
                // RFC 2812: the 15th parameter takes the rest of the line.
                params.push(buf.to_owned());
                trailing = true;
                break;
            }
            let (word, rest) = parse_word(buf);
            params.push(word.to_owned());
            buf = rest;
        }

        Some(Message {
            prefix: prefix.map(str::to_owned),
            command: command.map_err(str::to_owned),
            params,
            trailing,
        })
    }

    /// Appends a parameter to the message.
    ///
    /// Empty parameters are ignored unless they are trailing.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use parlance_tokens::{Command, Message, ParamError};
    /// let mut msg = Message::new(Command::PrivMsg);
    ///
    /// assert_eq!(msg.add_param("#chan", false), Ok(()));
    /// assert_eq!(msg.add_param("", false), Ok(()));
    /// assert_eq!(msg.add_param("hello world", true), Ok(()));
    /// assert_eq!(msg.add_param("late", false), Err(ParamError::AfterTrailing));
    /// assert_eq!(msg.params.len(), 2);
    /// ```
    pub fn add_param(&mut self, param: &str, trailing: bool) -> Result<(), ParamError> {
        if self.trailing {
            return Err(ParamError::AfterTrailing);
        }
        if PARAMS_LENGTH <= self.params.len() {
            return Err(ParamError::TooMany);
        }
        if param.is_empty() && !trailing {
            return Ok(());
        }
        self.params.push(param.to_owned());
        self.trailing = trailing;
        Ok(())
    }

    /// The parameter at the given index, or an empty string if there are not enough parameters.
    pub fn param(&self, i: usize) -> &str {
        self.params.get(i).map_or("", String::as_str)
    }

    /// The command string, whether it is known or not.
    pub fn command_str(&self) -> &str {
        match &self.command {
            Ok(command) => command.as_str(),
            Err(unknown) => unknown,
        }
    }

    /// Returns true if the message has enough parameters for its command.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use parlance_tokens::Message;
    /// let nick = Message::parse("NICK hello there").unwrap();
    /// assert_eq!(nick.has_enough_params(), true);
    ///
    /// let nick = Message::parse("NICK :").unwrap();
    /// assert_eq!(nick.has_enough_params(), true);
    ///
    /// let nick = Message::parse("NICK").unwrap();
    /// assert_eq!(nick.has_enough_params(), false);
    /// ```
    pub fn has_enough_params(&self) -> bool {
        match self.command {
            Ok(cmd) => cmd.required_params() <= self.params.len(),
            Err(_) => false,
        }
    }

    /// Writes the message in the wire format, CRLF included.
    ///
    /// The last parameter is prefixed with `:` when it is a trailing parameter, or when it could
    /// not be parsed back otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use parlance_tokens::Message;
    /// let line = ":nick!user@host PRIVMSG #rust :hello world\r\n";
    /// let msg = Message::parse(line).unwrap();
    ///
    /// assert_eq!(&msg.serialize(), line);
    /// ```
    pub fn serialize(&self) -> String {
        let mut buf = String::with_capacity(MESSAGE_LENGTH);
        if let Some(ref prefix) = self.prefix {
            buf.push(':');
            buf.push_str(prefix);
            buf.push(' ');
        }
        buf.push_str(self.command_str());
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            buf.push(' ');
            if i == last && (self.trailing || needs_colon(param)) {
                buf.push(':');
            }
            buf.push_str(param);
        }
        buf.push_str("\r\n");
        buf
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.serialize().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_msg;

    #[test]
    fn test_parse_prefix_and_params() {
        let msg = Message::parse(":alice!a@127.0.0.1 PRIVMSG bob :hi there\r\n").unwrap();
        assert_msg(
            &msg,
            Some("alice!a@127.0.0.1"),
            Ok(Command::PrivMsg),
            &["bob", "hi there"],
        );
        assert!(msg.trailing);

        let msg = Message::parse("JOIN    #a,#b   key").unwrap();
        assert_msg(&msg, None, Ok(Command::Join), &["#a,#b", "key"]);
        assert!(!msg.trailing);

        let msg = Message::parse("user guest 0 * :Ronnie Reagan").unwrap();
        assert_msg(
            &msg,
            None,
            Ok(Command::User),
            &["guest", "0", "*", "Ronnie Reagan"],
        );
    }

    #[test]
    fn test_parse_trailing_edge_cases() {
        let msg = Message::parse("PRIVMSG #c :").unwrap();
        assert_eq!(msg.params, vec!["#c", ""]);
        assert!(msg.trailing);

        let msg = Message::parse("PRIVMSG #c ::-) x").unwrap();
        assert_eq!(msg.params, vec!["#c", ":-) x"]);

        let msg = Message::parse("TOPIC #c :  spaced  out").unwrap();
        assert_eq!(msg.params, vec!["#c", "  spaced  out"]);

        let msg = Message::parse("PRIVMSG #c :   \r\n").unwrap();
        assert_eq!(msg.params, vec!["#c", "   "]);

        let msg = Message::parse("NICK alice   \r\n").unwrap();
        assert_eq!(msg.params, vec!["alice"]);
        assert!(!msg.trailing);
    }

    #[test]
    fn test_trailing_spaces_survive_serialization() {
        let mut msg = Message::new(Command::PrivMsg).with_prefix("alice!a@127.0.0.1");
        msg.add_param("#c", false).unwrap();
        msg.add_param("hi  ", true).unwrap();
        let line = msg.serialize();
        assert_eq!(line, ":alice!a@127.0.0.1 PRIVMSG #c :hi  \r\n");

        let parsed = Message::parse(&line).unwrap();
        assert_msg(&parsed, Some("alice!a@127.0.0.1"), Ok(Command::PrivMsg), &["#c", "hi  "]);
        assert_eq!(parsed.serialize(), line);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(Message::parse("").is_none());
        assert!(Message::parse("\r\n").is_none());
        assert!(Message::parse(":prefix.only").is_none());
        assert!(Message::parse(":prefix   ").is_none());
        assert!(Message::parse("NICK a\0b").is_none());
    }

    #[test]
    fn test_parse_unknown_command() {
        let msg = Message::parse("FOO bar baz").unwrap();
        assert_msg(&msg, None, Err("FOO"), &["bar", "baz"]);
        assert!(!msg.has_enough_params());
    }

    #[test]
    fn test_parse_param_limit() {
        let line = "CMD 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17";
        let msg = Message::parse(line).unwrap();
        assert_eq!(msg.params.len(), PARAMS_LENGTH);
        assert_eq!(msg.params[13], "14");
        assert_eq!(msg.params[14], "15 16 17");
        assert!(msg.trailing);

        let line = "CMD 1 2 3 4 5 6 7 8 9 10 11 12 13 14 :last one";
        let msg = Message::parse(line).unwrap();
        assert_eq!(msg.params.len(), PARAMS_LENGTH);
        assert_eq!(msg.params[14], "last one");
    }

    #[test]
    fn test_add_param() {
        let mut msg = Message::new(Command::Mode);
        for i in 0..PARAMS_LENGTH {
            assert_eq!(msg.add_param(&i.to_string(), false), Ok(()));
        }
        assert_eq!(msg.add_param("16", false), Err(ParamError::TooMany));
        assert_eq!(msg.params.len(), PARAMS_LENGTH);

        let mut msg = Message::new(Command::Quit);
        assert_eq!(msg.add_param("", true), Ok(()));
        assert_eq!(msg.params, vec![""]);
        assert_eq!(msg.add_param("x", true), Err(ParamError::AfterTrailing));
    }

    #[test]
    fn test_serialize() {
        let mut msg = Message::new(Command::Nick).with_prefix("old!u@h");
        msg.add_param("new", false).unwrap();
        assert_eq!(&msg.serialize(), ":old!u@h NICK new\r\n");

        let mut msg = Message::new("001");
        msg.add_param("alice", false).unwrap();
        msg.add_param("Welcome", true).unwrap();
        assert_eq!(&msg.serialize(), "001 alice :Welcome\r\n");

        let msg = Message {
            prefix: None,
            command: Ok(Command::PrivMsg),
            params: vec!["bob".to_owned(), "two words".to_owned()],
            trailing: false,
        };
        assert_eq!(&msg.serialize(), "PRIVMSG bob :two words\r\n");

        let msg = Message::parse("LUSERS").unwrap();
        assert_eq!(&msg.serialize(), "LUSERS\r\n");
    }

    #[test]
    fn test_round_trip() {
        let lines = &[
            ":irc.example.org 001 alice :Welcome to the Internet Relay Network alice!a@h\r\n",
            "MODE #c +o bob\r\n",
            "PRIVMSG #c :\r\n",
            "QUIT\r\n",
            "CMD 1 2 3 4 5 6 7 8 9 10 11 12 13 14 :fifteen and more\r\n",
        ];
        for line in lines {
            let msg = Message::parse(line).unwrap();
            let again = Message::parse(&msg.serialize()).unwrap();
            assert_eq!(msg.command, again.command, "{:?}", line);
            assert_eq!(msg.params, again.params, "{:?}", line);
            assert_eq!(&msg.serialize(), line);
        }
    }
}
