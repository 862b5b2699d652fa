//! Shared state and API to handle incoming commands.
//!
//! This module is split in several files:
//!
//! - `mod.rs`: public API of the server state, directories and send utilities
//! - `rfc2812.rs`: handlers for messages defined in the RFC 2812

use crate::channel::{Channel, LeaveOutcome};
use crate::client::{Connection, ConnectionState, MessageQueue, MessageQueueItem, User};
use crate::config;
use crate::lines;
use crate::util::{key, time_str};
use parlance_tokens::{mode, rpl, Buffer, Command, Message, ReplyBuffer, MESSAGE_LENGTH};
use slab::Slab;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::{fs, io};
use tokio::sync::Mutex;

#[macro_export]
macro_rules! server_version(() => {concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"))});

mod rfc2812;
#[cfg(test)]
mod test;

type ChannelMap = HashMap<String, Arc<Channel>>;
type UserMap = HashMap<String, User>;
type HandlerResult = Result<(), ()>;

struct CommandContext<'a> {
    user: &'a mut User,
    rb: &'a mut ReplyBuffer,
}

/// The nickname is already held by another user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NickInUse;

/// Number of connections in each state, for LUSERS replies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub unknown: usize,
    pub identified: usize,
    pub registered: usize,
}

/// State of the IRC server.
///
/// This is used by parlance to maintain a consistent state of the network.  Note that this is
/// just an `Arc` to the real data, so it's cheap to clone and clones share the same data.
///
/// # Example
///
/// ```rust
/// # use parlance::State;
/// # use parlance::config;
/// # use parlance_tokens::Message;
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let state = State::new(config::State::sample());
///
/// // The state uses a MPSC queue and pushes the messages meant to be sent
/// // to the client onto the queue.
/// let (msg_queue, mut outgoing_msgs) = tokio::sync::mpsc::unbounded_channel();
/// let mut user = state.peer_joined("127.0.0.1".to_owned(), msg_queue).await;
///
/// // `handle_message` is used to pass messages from the client to the state.
/// let nick = Message::parse("NICK ser\r\n").unwrap();
/// let userm = Message::parse("USER ser 0 * :ser\r\n").unwrap();
/// state.handle_message(&mut user, nick).await.unwrap();
/// state.handle_message(&mut user, userm).await.unwrap();
///
/// // The user has registered, so the state has pushed the welcome burst onto the queue.
/// // Note that one call to `recv` can contain multiple IRC messages.
/// let msg = outgoing_msgs.recv().await.unwrap();
/// let msg: &str = msg.as_ref();
/// let mut lines = msg.split("\r\n");
///
/// assert_eq!(lines.next().unwrap(),
///            ":parlance.localdomain 001 ser :Welcome to the Internet Relay Network \
///            ser!ser@127.0.0.1");
/// # });
/// ```
#[derive(Clone)]
pub struct State(Arc<StateInner>);

impl State {
    /// Intialize the IRC state from the given configuration.
    pub fn new(config: config::State) -> Self {
        Self(Arc::new(StateInner::new(config)))
    }

    /// Adds a new connection to the state, and returns its user data.
    ///
    /// The queue is used to push messages back to the peer.  The returned `User` is owned by the
    /// connection task and must be given back to `handle_message` and `peer_quit`.
    pub async fn peer_joined(&self, host: String, queue: MessageQueue) -> User {
        let id = self.0.add_connection(host.clone()).await;
        log::debug!("{}: Connected from {}", id, host);
        User::new(id, host, queue)
    }

    /// Removes the given connection from the state, with an optional error.
    ///
    /// If the peer has quit unexpectedly, `err` should be set to `Some` and reflect the cause of
    /// the quit, so that other peers can be correctly informed.
    pub async fn peer_quit(&self, user: &User, err: Option<io::Error>) {
        self.0.peer_quit(user, err).await;
    }

    /// Updates the state according to the given message from the given client.
    ///
    /// Returns `Err(())` when the connection must be closed, either because the client sent a
    /// QUIT or because its message queue is closed.
    pub async fn handle_message(&self, user: &mut User, msg: Message) -> Result<(), ()> {
        self.0.handle_message(user, msg).await
    }
}

/// The actual shared data (state) of the IRC server.
///
/// Each directory has its own lock.  When several of them are needed, they are taken in this
/// order: `users`, `channels`, then the lock of each channel.
pub(crate) struct StateInner {
    /// The domain of the server.  This string is used as a prefix for replies sent to clients.
    domain: String,

    /// The operator password, checked by OPER.
    password: String,

    /// The formatted time when this instance is created.  It is sent to the client when they
    /// register (in a "003 RPL_CREATED" reply).
    created_at: String,

    /// The message of the day.
    motd: Option<String>,

    nicklen: usize,
    channellen: usize,

    /// Registered users, by lowercase nickname.
    users: Mutex<UserMap>,

    /// Open connections, by connection ID.
    connections: Mutex<Slab<Connection>>,

    /// Channels, by lowercase name.
    channels: Mutex<ChannelMap>,

    /// The number of users that have been granted the operator status.
    operators: AtomicUsize,
}

impl StateInner {
    pub fn new(config: config::State) -> Self {
        let motd = config.motd_file.and_then(|file| match fs::read_to_string(&file) {
            Ok(motd) => Some(motd),
            Err(err) => {
                log::warn!("Failed to read {:?}: {}", file, err);
                None
            }
        });
        Self {
            domain: config.domain,
            password: config.password,
            created_at: time_str(),
            motd,
            nicklen: config.nicklen,
            channellen: config.channellen,
            users: Mutex::new(HashMap::new()),
            connections: Mutex::new(Slab::new()),
            channels: Mutex::new(HashMap::new()),
            operators: AtomicUsize::new(0),
        }
    }

    pub async fn peer_quit(&self, user: &User, err: Option<io::Error>) {
        log::debug!("{}: Disconnected", user.id);
        if user.is_registered() {
            let reason = match (user.quit_message(), err) {
                (Some(reason), _) => reason.to_owned(),
                (None, Some(err)) => err.to_string(),
                (None, None) => lines::CONNECTION_RESET.to_owned(),
            };
            self.remove_user_everywhere(user, &reason).await;
        }
        self.remove_connection(user.id).await;
    }

    /// Does the cleanup needed when a registered client disconnects:
    ///
    /// - remove the client from each channel it was in,
    /// - remove channels that are now empty,
    /// - remove the client from the user directory,
    /// - send a QUIT message to the clients that shared a channel with it.
    async fn remove_user_everywhere(&self, user: &User, reason: &str) {
        let channels = self.channels_of(user.nick()).await;
        let peers = self.channel_peers(user.nick(), &channels).await;

        for channel in &channels {
            if channel.leave(user.nick()).await == LeaveOutcome::EmptyAfter {
                self.remove_channel_if_empty(channel).await;
            }
        }
        self.remove_user(user.nick()).await;

        let mut response = Buffer::new();
        response.message(user.full_name(), Command::Quit).trailing_param(reason);
        self.send_to_nicks(&peers, MessageQueueItem::from(response)).await;
    }

    pub async fn handle_message(&self, user: &mut User, msg: Message) -> Result<(), ()> {
        let target = if user.is_registered() { user.nick() } else { "*" };
        let mut rb = ReplyBuffer::new(&self.domain, target);

        let command = match msg.command {
            Ok(cmd) => cmd,
            Err(ref unknown) => {
                if user.is_registered() {
                    log::debug!("{}: unknown command {:?}", user.id, unknown);
                    rb.reply(rpl::ERR_UNKNOWNCOMMAND)
                        .param(unknown)
                        .trailing_param(lines::UNKNOWN_COMMAND);
                } else {
                    log::debug!("{}: ignored unknown command {:?}", user.id, unknown);
                }
                return flush(user, rb);
            }
        };

        if !user.is_registered() && !command.is_allowed_unregistered() {
            log::debug!("{}: {} before registration", user.id, command);
            rb.reply(rpl::ERR_NOTREGISTERED).trailing_param(lines::NOT_REGISTERED);
            return flush(user, rb);
        }
        if user.is_registered() && command == Command::User {
            log::debug!("{}: USER after registration", user.id);
            rb.reply(rpl::ERR_ALREADYREGISTRED).trailing_param(lines::ALREADY_REGISTERED);
            return flush(user, rb);
        }

        let n = msg.params.len();
        if !msg.has_enough_params() {
            log::debug!("{}: {} with {} params", user.id, command, n);
            match command {
                Command::Nick | Command::Whois => {
                    rb.reply(rpl::ERR_NONICKNAMEGIVEN).trailing_param(lines::NO_NICKNAME_GIVEN);
                }
                Command::PrivMsg if n == 0 => {
                    rb.reply(rpl::ERR_NORECIPIENT)
                        .fmt_trailing_param(lines_no_recipient!(command));
                }
                Command::PrivMsg => {
                    rb.reply(rpl::ERR_NOTEXTTOSEND).trailing_param(lines::NO_TEXT_TO_SEND);
                }
                Command::Notice => {}
                _ => {
                    rb.reply(rpl::ERR_NEEDMOREPARAMS)
                        .param(command.as_str())
                        .trailing_param(lines::NEED_MORE_PARAMS);
                }
            }
            return flush(user, rb);
        }

        log::debug!("{}: {} {:?}", user.id, command, msg.params);
        let ps = &msg.params;
        let p = |i: usize| msg.param(i);
        let ctx = CommandContext { user: &mut *user, rb: &mut rb };
        let _ = match command {
            Command::Away => self.cmd_away(ctx, p(0)),
            Command::Join => self.cmd_join(ctx, p(0)).await,
            Command::List => self.cmd_list(ctx, p(0)).await,
            Command::Lusers => self.cmd_lusers(ctx).await,
            Command::Mode => self.cmd_mode(ctx, p(0), p(1), &ps[2..]).await,
            Command::Motd => self.cmd_motd(ctx),
            Command::Names => self.cmd_names(ctx, p(0)).await,
            Command::Nick => self.cmd_nick(ctx, p(0)).await,
            Command::Notice => self.cmd_message(ctx, command, p(0), p(1)).await,
            Command::Oper => self.cmd_oper(ctx, p(n - 1)),
            Command::Part => self.cmd_part(ctx, p(0), p(1)).await,
            Command::Ping => self.cmd_ping(ctx, p(0)),
            Command::Pong => Ok(()),
            Command::PrivMsg => self.cmd_message(ctx, command, p(0), p(1)).await,
            Command::Quit => self.cmd_quit(ctx, p(0)),
            Command::Topic => {
                self.cmd_topic(ctx, p(0), if n < 2 { None } else { Some(p(1)) }).await
            }
            Command::User => self.cmd_user(ctx, p(0), p(3)).await,
            Command::Whois => self.cmd_whois(ctx, p(0)).await,
            Command::Reply(_) => Ok(()),
        };

        if command == Command::Away || command == Command::Oper {
            self.update_user(user).await;
        }

        flush(user, rb)?;
        if user.quit_message().is_some() {
            return Err(());
        }
        Ok(())
    }
}

/// Sends the replies in `rb` to `user`.
///
/// Returns `Err(())` if the message queue of `user` is closed.
fn flush(user: &User, rb: ReplyBuffer) -> Result<(), ()> {
    if rb.is_empty() {
        return Ok(());
    }
    user.send(rb).map_err(|_| {
        log::debug!("{}: message queue is closed", user.id);
    })
}

// Directories
impl StateInner {
    async fn add_connection(&self, host: String) -> usize {
        self.connections.lock().await.insert(Connection::new(host))
    }

    async fn remove_connection(&self, id: usize) {
        let mut connections = self.connections.lock().await;
        if connections.contains(id) {
            connections.remove(id);
        }
    }

    /// Moves the connection `id` forward to `state`.
    ///
    /// Returns false if the connection does not exist or if that would be a downgrade.
    async fn set_connection_state(&self, id: usize, state: ConnectionState) -> bool {
        let mut connections = self.connections.lock().await;
        connections.get_mut(id).map_or(false, |conn| conn.advance(state))
    }

    async fn count_connections_by_state(&self) -> ConnectionCounts {
        let connections = self.connections.lock().await;
        let mut res = ConnectionCounts::default();
        for (_, conn) in connections.iter() {
            match conn.state {
                ConnectionState::Unknown => res.unknown += 1,
                ConnectionState::Identified => res.identified += 1,
                ConnectionState::Registered => res.registered += 1,
            }
        }
        res
    }

    /// Inserts `user` in the user directory under `nick`, unless another user holds it already.
    async fn register_nick(&self, nick: &str, user: User) -> Result<(), NickInUse> {
        let mut users = self.users.lock().await;
        let k = key(nick);
        if users.contains_key(&k) {
            return Err(NickInUse);
        }
        users.insert(k, user);
        Ok(())
    }

    /// Moves `user` from `old` to `new` in the user directory, and renames it in the channels it
    /// is a member of.
    ///
    /// Returns the channels `user` is a member of.
    async fn rename_nick(&self, old: &str, new: &str, user: User)
                         -> Result<Vec<Arc<Channel>>, NickInUse>
    {
        let mut users = self.users.lock().await;
        let new_key = key(new);
        if let Some(holder) = users.get(&new_key) {
            if holder.id != user.id {
                return Err(NickInUse);
            }
        }
        users.remove(&key(old));
        users.insert(new_key, user);

        let channels: Vec<_> = self.channels.lock().await.values().cloned().collect();
        let mut res = Vec::new();
        for channel in channels {
            if channel.rename_member(old, new).await {
                res.push(channel);
            }
        }
        Ok(res)
    }

    async fn lookup_user(&self, nick: &str) -> Option<User> {
        self.users.lock().await.get(&key(nick)).cloned()
    }

    /// Replaces the copy of `user` in the user directory with `user`.
    async fn update_user(&self, user: &User) {
        if !user.is_registered() {
            return;
        }
        let mut users = self.users.lock().await;
        if let Some(entry) = users.get_mut(&key(user.nick())) {
            if entry.id == user.id {
                *entry = user.clone();
            }
        }
    }

    async fn remove_user(&self, nick: &str) {
        self.users.lock().await.remove(&key(nick));
    }

    async fn lookup_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.lock().await.get(&key(name)).cloned()
    }

    /// Returns the channel named `name`, and whether it has just been created.
    async fn get_or_create_channel(&self, name: &str) -> (Arc<Channel>, bool) {
        let mut channels = self.channels.lock().await;
        let k = key(name);
        if let Some(channel) = channels.get(&k) {
            return (channel.clone(), false);
        }
        let channel = Arc::new(Channel::new(name));
        channels.insert(k, channel.clone());
        (channel, true)
    }

    /// Removes `channel` from the channel directory if it has no members left.
    async fn remove_channel_if_empty(&self, channel: &Arc<Channel>) {
        let mut channels = self.channels.lock().await;
        let k = key(channel.name());
        let listed = channels.get(&k).map_or(false, |c| Arc::ptr_eq(c, channel));
        if listed && channel.close_if_empty().await {
            log::debug!("Removing channel {}", channel.name());
            channels.remove(&k);
        }
    }

    async fn channel_count(&self) -> usize {
        self.channels.lock().await.len()
    }

    /// A snapshot of every channel, sorted by name.
    async fn all_channels(&self) -> Vec<Arc<Channel>> {
        let mut res: Vec<_> = self.channels.lock().await.values().cloned().collect();
        res.sort_by(|a, b| a.name().cmp(b.name()));
        res
    }

    /// The channels `nick` is a member of.
    async fn channels_of(&self, nick: &str) -> Vec<Arc<Channel>> {
        let mut res = Vec::new();
        for channel in self.all_channels().await {
            if channel.is_member(nick).await {
                res.push(channel);
            }
        }
        res
    }

    /// Gives the operator status to a user.  Returns the number of operators.
    fn grant_operator(&self) -> usize {
        self.operators.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn operator_count(&self) -> usize {
        self.operators.load(Ordering::SeqCst)
    }
}

// Send utilities
impl StateInner {
    /// Sends the given message to the given users.
    ///
    /// The message queues are collected first, so that no lock is held while sending.
    async fn send_to_nicks(&self, nicks: &[String], msg: MessageQueueItem) {
        let queues: Vec<MessageQueue> = {
            let users = self.users.lock().await;
            nicks.iter().filter_map(|nick| users.get(&key(nick))).map(User::queue).collect()
        };
        for queue in queues {
            let _ = queue.send(msg.clone());
        }
    }

    /// Sends the given message to all members of the given channel, except `except`.
    async fn broadcast(&self, channel: &Channel, except: Option<&str>, msg: MessageQueueItem) {
        let mut nicks = channel.member_nicks().await;
        if let Some(except) = except {
            nicks.retain(|nick| !nick.eq_ignore_ascii_case(except));
        }
        self.send_to_nicks(&nicks, msg).await;
    }

    /// The members of `channels`, without duplicates and without `nick`.
    async fn channel_peers(&self, nick: &str, channels: &[Arc<Channel>]) -> Vec<String> {
        let mut seen = HashSet::new();
        seen.insert(key(nick));
        let mut res = Vec::new();
        for channel in channels {
            for member in channel.member_nicks().await {
                if seen.insert(key(&member)) {
                    res.push(member);
                }
            }
        }
        res
    }

    async fn write_lusers(&self, rb: &mut ReplyBuffer) {
        let counts = self.count_connections_by_state().await;
        let channels = self.channel_count().await;
        rb.reply(rpl::LUSERCLIENT).fmt_trailing_param(lines_luser_client!(counts.registered));
        rb.reply(rpl::LUSEROP)
            .fmt_param(self.operator_count())
            .trailing_param(lines::LUSER_OP);
        rb.reply(rpl::LUSERUNKNOWN)
            .fmt_param(counts.unknown)
            .trailing_param(lines::LUSER_UNKNOWN);
        rb.reply(rpl::LUSERCHANNELS)
            .fmt_param(channels)
            .trailing_param(lines::LUSER_CHANNELS);
        rb.reply(rpl::LUSERME)
            .fmt_trailing_param(lines_luser_me!(counts.identified + counts.registered));
    }

    fn write_motd(&self, rb: &mut ReplyBuffer) {
        if let Some(ref motd) = self.motd {
            rb.reply(rpl::MOTDSTART).fmt_trailing_param(lines_motd_start!(&self.domain));
            for line in motd.lines() {
                let mut msg = rb.reply(rpl::MOTD);
                let trailing = msg.raw_trailing_param();
                trailing.push_str("- ");
                trailing.push_str(line);
            }
            rb.reply(rpl::ENDOFMOTD).trailing_param(lines::END_OF_MOTD);
        } else {
            rb.reply(rpl::ERR_NOMOTD).trailing_param(lines::NO_MOTD);
        }
    }

    /// Sends the list of nicknames in `channel`, in as many NAMREPLY as needed.
    async fn write_names(&self, rb: &mut ReplyBuffer, channel: &Channel) {
        // ":domain 353 nick = channel :" and CRLF.
        let overhead = self.domain.len() + self.nicklen + channel.name().len() + 13;
        let budget = MESSAGE_LENGTH.saturating_sub(overhead);

        let mut names = String::new();
        for member in channel.members().await {
            if !names.is_empty() && budget < names.len() + member.nick.len() + 2 {
                rb.reply(rpl::NAMREPLY).param("=").param(channel.name()).trailing_param(&names);
                names.clear();
            }
            if !names.is_empty() {
                names.push(' ');
            }
            if let Some(symbol) = member.symbol() {
                names.push(symbol);
            }
            names.push_str(&member.nick);
        }
        if !names.is_empty() {
            rb.reply(rpl::NAMREPLY).param("=").param(channel.name()).trailing_param(&names);
        }
        rb.reply(rpl::ENDOFNAMES).param(channel.name()).trailing_param(lines::END_OF_NAMES);
    }

    /// Sends welcome messages.  Called when a client has completed its registration.
    async fn write_welcome(&self, rb: &mut ReplyBuffer, user: &User) {
        rb.reply(rpl::WELCOME).fmt_trailing_param(lines_welcome!(user.full_name()));
        rb.reply(rpl::YOURHOST)
            .fmt_trailing_param(lines_your_host!(&self.domain, server_version!()));
        rb.reply(rpl::CREATED).fmt_trailing_param(lines_created!(&self.created_at));
        rb.reply(rpl::MYINFO)
            .param(&self.domain)
            .param(server_version!())
            .param(mode::USER_MODES)
            .param(mode::CHAN_MODES);
        self.write_lusers(rb).await;
        self.write_motd(rb);
    }
}
