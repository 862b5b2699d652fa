//! RFC2812 implementation
//!
//! <https://tools.ietf.org/html/rfc2812.html>

use super::{CommandContext, HandlerResult};
use crate::channel::{Channel, JoinOutcome, LeaveOutcome};
use crate::client::{ConnectionState, MessageQueueItem, User};
use crate::lines;
use crate::util::{is_valid_channel_name, is_valid_nickname};
use parlance_tokens::{mode, rpl, Buffer, Command, MessageBuffer, ReplyBuffer};
use std::sync::Arc;

/// Writes the parameters of a PART message.
fn write_part(msg: MessageBuffer<'_>, channel: &str, reason: &str) {
    let msg = msg.param(channel);
    if !reason.is_empty() {
        msg.trailing_param(reason);
    }
}

// Lookups that reply with an error when they fail.
impl super::StateInner {
    /// Returns `Ok(channel)` when `name` is an existing channel name.  Otherwise returns `Err(())`
    /// and send an error to the client.
    async fn find_channel(&self, id: usize, rb: &mut ReplyBuffer, name: &str)
                          -> Result<Arc<Channel>, ()>
    {
        match self.lookup_channel(name).await {
            Some(channel) => Ok(channel),
            None => {
                log::debug!("{}:     no such channel", id);
                rb.reply(rpl::ERR_NOSUCHCHANNEL).param(name).trailing_param(lines::NO_SUCH_CHANNEL);
                Err(())
            }
        }
    }

    /// Returns `Ok(())` when `nick` is in the given `channel`.  Otherwise returns `Err(())` and
    /// send an error to the client.
    async fn find_member(&self, id: usize, rb: &mut ReplyBuffer, channel: &Channel, nick: &str)
                         -> Result<(), ()>
    {
        if channel.is_member(nick).await {
            return Ok(());
        }
        log::debug!("{}:     not on channel", id);
        rb.reply(rpl::ERR_NOTONCHANNEL)
            .param(channel.name())
            .trailing_param(lines::NOT_ON_CHANNEL);
        Err(())
    }

    /// Returns `Ok(user)` when the client identified by the nickname `nick` is registered.
    /// Otherwise returns `Err(())` and send an error to the client.
    async fn find_nick(&self, id: usize, rb: &mut ReplyBuffer, nick: &str) -> Result<User, ()> {
        match self.lookup_user(nick).await {
            Some(user) => Ok(user),
            None => {
                log::debug!("{}:     nick doesn't exist", id);
                rb.reply(rpl::ERR_NOSUCHNICK).param(nick).trailing_param(lines::NO_SUCH_NICK);
                Err(())
            }
        }
    }
}

// Command handlers
impl super::StateInner {
    // AWAY

    pub fn cmd_away(&self, ctx: CommandContext<'_>, message: &str) -> HandlerResult {
        if message.is_empty() {
            ctx.user.set_away_message(None);
            ctx.rb.reply(rpl::UNAWAY).trailing_param(lines::UN_AWAY);
        } else {
            ctx.user.set_away_message(Some(message));
            ctx.rb.reply(rpl::NOWAWAY).trailing_param(lines::NOW_AWAY);
        }
        Ok(())
    }

    // JOIN

    pub async fn cmd_join(&self, ctx: CommandContext<'_>, targets: &str) -> HandlerResult {
        for name in targets.split(',').filter(|s| !s.is_empty()) {
            if !is_valid_channel_name(name, self.channellen) {
                log::debug!("{}:     invalid channel name {:?}", ctx.user.id, name);
                ctx.rb.reply(rpl::ERR_NOSUCHCHANNEL)
                    .param(name)
                    .trailing_param(lines::NO_SUCH_CHANNEL);
                continue;
            }

            let nick = ctx.user.nick();
            let channel = loop {
                let (channel, created) = self.get_or_create_channel(name).await;
                match channel.join(nick, created).await {
                    JoinOutcome::Joined => break Some(channel),
                    JoinOutcome::AlreadyMember => break None,
                    JoinOutcome::Closed => log::debug!("{}:     {} closed, retrying", ctx.user.id, name),
                }
            };
            let channel = match channel {
                Some(channel) => channel,
                None => {
                    log::debug!("{}:     already in {}", ctx.user.id, name);
                    continue;
                }
            };

            let mut response = Buffer::new();
            response.message(ctx.user.full_name(), Command::Join).param(channel.name());
            self.broadcast(&channel, Some(nick), MessageQueueItem::from(response)).await;

            ctx.rb.message(ctx.user.full_name(), Command::Join).param(channel.name());
            if let Some(topic) = channel.topic().await {
                ctx.rb.reply(rpl::TOPIC).param(channel.name()).trailing_param(&topic);
            }
            self.write_names(ctx.rb, &channel).await;
        }
        Ok(())
    }

    // LIST

    pub async fn cmd_list(&self, ctx: CommandContext<'_>, targets: &str) -> HandlerResult {
        let channels = if targets.is_empty() {
            self.all_channels().await
        } else {
            let mut res = Vec::new();
            for name in targets.split(',') {
                if let Some(channel) = self.lookup_channel(name).await {
                    res.push(channel);
                }
            }
            res
        };

        for channel in channels {
            let count = channel.member_count().await;
            let topic = channel.topic().await.unwrap_or_default();
            ctx.rb.reply(rpl::LIST)
                .param(channel.name())
                .fmt_param(count)
                .trailing_param(&topic);
        }
        ctx.rb.reply(rpl::LISTEND).trailing_param(lines::END_OF_LIST);
        Ok(())
    }

    // LUSERS

    pub async fn cmd_lusers(&self, ctx: CommandContext<'_>) -> HandlerResult {
        self.write_lusers(ctx.rb).await;
        Ok(())
    }

    // MODE

    pub async fn cmd_mode(&self, ctx: CommandContext<'_>, target: &str, modes: &str,
                          params: &[String]) -> HandlerResult
    {
        let channel = self.find_channel(ctx.user.id, ctx.rb, target).await?;

        let mut changes = Vec::new();
        for change in mode::channel_query(modes, params) {
            match change {
                Ok(change) => changes.push(change),
                Err(mode::Error::Unknown(letter, _)) => {
                    log::debug!("{}:     unknown mode {:?}", ctx.user.id, letter);
                    ctx.rb.reply(rpl::ERR_UNKNOWNMODE)
                        .param(&letter.to_string())
                        .fmt_trailing_param(lines_unknown_mode!(channel.name()));
                    return Err(());
                }
                Err(mode::Error::MissingParam(..)) => {
                    ctx.rb.reply(rpl::ERR_NEEDMOREPARAMS)
                        .param(Command::Mode.as_str())
                        .trailing_param(lines::NEED_MORE_PARAMS);
                    return Err(());
                }
            }
        }

        let nick = ctx.user.nick();
        if !ctx.user.is_operator() && !channel.is_operator(nick).await {
            log::debug!("{}:     not operator", ctx.user.id);
            ctx.rb.reply(rpl::ERR_CHANOPRIVSNEEDED)
                .param(channel.name())
                .trailing_param(lines::CHAN_O_PRIVS_NEEDED);
            return Err(());
        }

        for change in changes {
            let member = change.param();
            if !channel.set_operator(member, change.value()).await {
                log::debug!("{}:     {} not on {}", ctx.user.id, member, channel.name());
                ctx.rb.reply(rpl::ERR_USERNOTINCHANNEL)
                    .param(member)
                    .param(channel.name())
                    .trailing_param(lines::USER_NOT_IN_CHANNEL);
                continue;
            }

            let mode_string = change.mode_string();
            let mut response = Buffer::new();
            response.message(ctx.user.full_name(), Command::Mode)
                .param(channel.name())
                .param(&mode_string)
                .param(member);
            self.broadcast(&channel, Some(nick), MessageQueueItem::from(response)).await;
            ctx.rb.message(ctx.user.full_name(), Command::Mode)
                .param(channel.name())
                .param(&mode_string)
                .param(member);
        }
        Ok(())
    }

    // MOTD

    pub fn cmd_motd(&self, ctx: CommandContext<'_>) -> HandlerResult {
        self.write_motd(ctx.rb);
        Ok(())
    }

    // NAMES

    pub async fn cmd_names(&self, ctx: CommandContext<'_>, targets: &str) -> HandlerResult {
        if targets.is_empty() {
            for channel in self.all_channels().await {
                self.write_names(ctx.rb, &channel).await;
            }
            return Ok(());
        }
        for name in targets.split(',').filter(|s| !s.is_empty()) {
            match self.lookup_channel(name).await {
                Some(channel) => self.write_names(ctx.rb, &channel).await,
                None => {
                    ctx.rb.reply(rpl::ENDOFNAMES).param(name).trailing_param(lines::END_OF_NAMES);
                }
            }
        }
        Ok(())
    }

    // NICK

    pub async fn cmd_nick(&self, ctx: CommandContext<'_>, nick: &str) -> HandlerResult {
        if nick.is_empty() {
            ctx.rb.reply(rpl::ERR_NONICKNAMEGIVEN).trailing_param(lines::NO_NICKNAME_GIVEN);
            return Err(());
        }
        if !is_valid_nickname(nick, self.nicklen) {
            log::debug!("{}:     invalid nickname", ctx.user.id);
            ctx.rb.reply(rpl::ERR_ERRONEUSNICKNAME)
                .param(nick)
                .trailing_param(lines::ERRONEOUS_NICKNAME);
            return Err(());
        }

        if !ctx.user.is_registered() {
            if self.lookup_user(nick).await.is_some() {
                log::debug!("{}:     nickname in use", ctx.user.id);
                ctx.rb.reply(rpl::ERR_NICKNAMEINUSE)
                    .param(nick)
                    .trailing_param(lines::NICKNAME_IN_USE);
                return Err(());
            }
            ctx.user.set_nick(nick);
            self.set_connection_state(ctx.user.id, ConnectionState::Identified).await;
            return self.try_register(ctx).await;
        }

        if ctx.user.nick() == nick {
            return Ok(());
        }

        let old_nick = ctx.user.nick().to_owned();
        let old_full_name = ctx.user.full_name().to_owned();
        let mut renamed = ctx.user.clone();
        renamed.set_nick(nick);

        let channels = match self.rename_nick(&old_nick, nick, renamed).await {
            Ok(channels) => channels,
            Err(_) => {
                log::debug!("{}:     nickname in use", ctx.user.id);
                ctx.rb.reply(rpl::ERR_NICKNAMEINUSE)
                    .param(nick)
                    .trailing_param(lines::NICKNAME_IN_USE);
                return Err(());
            }
        };
        ctx.user.set_nick(nick);

        let mut response = Buffer::new();
        response.message(&old_full_name, Command::Nick).param(nick);
        let peers = self.channel_peers(nick, &channels).await;
        self.send_to_nicks(&peers, MessageQueueItem::from(response)).await;

        ctx.rb.message(&old_full_name, Command::Nick).param(nick);
        ctx.rb.set_nick(nick);
        Ok(())
    }

    /// Registers the user if it has given both its nickname and its username.
    async fn try_register(&self, ctx: CommandContext<'_>) -> HandlerResult {
        if !ctx.user.has_nick() || !ctx.user.has_user() {
            return Ok(());
        }

        let nick = ctx.user.nick().to_owned();
        let mut entry = ctx.user.clone();
        entry.set_registered();
        if self.register_nick(&nick, entry).await.is_err() {
            log::debug!("{}:     nickname in use", ctx.user.id);
            ctx.rb.reply(rpl::ERR_NICKNAMEINUSE)
                .param(&nick)
                .trailing_param(lines::NICKNAME_IN_USE);
            ctx.user.clear_nick();
            return Err(());
        }

        ctx.user.set_registered();
        self.set_connection_state(ctx.user.id, ConnectionState::Registered).await;
        log::debug!("{}: Registered as {}", ctx.user.id, ctx.user.full_name());

        ctx.rb.set_nick(&nick);
        self.write_welcome(ctx.rb, ctx.user).await;
        Ok(())
    }

    // OPER

    pub fn cmd_oper(&self, ctx: CommandContext<'_>, password: &str) -> HandlerResult {
        if password != self.password {
            log::debug!("{}:     password mismatch", ctx.user.id);
            ctx.rb.reply(rpl::ERR_PASSWDMISMATCH).trailing_param(lines::PASSWORD_MISMATCH);
            return Err(());
        }

        if !ctx.user.is_operator() {
            ctx.user.set_operator();
            let count = self.grant_operator();
            log::info!("{} is now an operator ({} in total)", ctx.user.nick(), count);
        }
        ctx.rb.reply(rpl::YOUREOPER).trailing_param(lines::YOURE_OPER);
        Ok(())
    }

    // PART

    pub async fn cmd_part(&self, ctx: CommandContext<'_>, targets: &str, reason: &str)
                          -> HandlerResult
    {
        for name in targets.split(',').filter(|s| !s.is_empty()) {
            let channel = match self.find_channel(ctx.user.id, ctx.rb, name).await {
                Ok(channel) => channel,
                Err(()) => continue,
            };

            let outcome = channel.leave(ctx.user.nick()).await;
            if outcome == LeaveOutcome::NotMember {
                log::debug!("{}:     not on channel", ctx.user.id);
                ctx.rb.reply(rpl::ERR_NOTONCHANNEL)
                    .param(name)
                    .trailing_param(lines::NOT_ON_CHANNEL);
                continue;
            }

            write_part(ctx.rb.message(ctx.user.full_name(), Command::Part), channel.name(), reason);
            if outcome == LeaveOutcome::EmptyAfter {
                self.remove_channel_if_empty(&channel).await;
            } else {
                let mut response = Buffer::new();
                write_part(response.message(ctx.user.full_name(), Command::Part),
                           channel.name(), reason);
                self.broadcast(&channel, None, MessageQueueItem::from(response)).await;
            }
        }
        Ok(())
    }

    // PING

    pub fn cmd_ping(&self, ctx: CommandContext<'_>, payload: &str) -> HandlerResult {
        ctx.rb.prefixed_message(Command::Pong).param(&self.domain).trailing_param(payload);
        Ok(())
    }

    // PRIVMSG and NOTICE

    /// Handles PRIVMSG and NOTICE.  NOTICE never sends an error back.
    pub async fn cmd_message(&self, ctx: CommandContext<'_>, command: Command, target: &str,
                             content: &str) -> HandlerResult
    {
        let is_privmsg = command == Command::PrivMsg;
        if content.is_empty() {
            if is_privmsg {
                ctx.rb.reply(rpl::ERR_NOTEXTTOSEND).trailing_param(lines::NO_TEXT_TO_SEND);
            }
            return Err(());
        }

        let mut response = Buffer::new();
        response.message(ctx.user.full_name(), command).param(target).trailing_param(content);
        let msg = MessageQueueItem::from(response);
        let nick = ctx.user.nick();

        if target.starts_with('#') {
            let channel = match self.lookup_channel(target).await {
                Some(channel) => channel,
                None => {
                    log::debug!("{}:     no such channel", ctx.user.id);
                    if is_privmsg {
                        ctx.rb.reply(rpl::ERR_NOSUCHNICK)
                            .param(target)
                            .trailing_param(lines::NO_SUCH_NICK);
                    }
                    return Err(());
                }
            };
            if !channel.is_member(nick).await {
                log::debug!("{}:     not on channel", ctx.user.id);
                if is_privmsg {
                    ctx.rb.reply(rpl::ERR_CANNOTSENDTOCHAN)
                        .param(target)
                        .trailing_param(lines::CANNOT_SEND_TO_CHAN);
                }
                return Err(());
            }
            self.broadcast(&channel, Some(nick), msg).await;
        } else {
            let recipient = match self.lookup_user(target).await {
                Some(recipient) => recipient,
                None => {
                    log::debug!("{}:     nick doesn't exist", ctx.user.id);
                    if is_privmsg {
                        ctx.rb.reply(rpl::ERR_NOSUCHNICK)
                            .param(target)
                            .trailing_param(lines::NO_SUCH_NICK);
                    }
                    return Err(());
                }
            };
            if recipient.send(msg).is_err() {
                log::debug!("{}:     {} is leaving", ctx.user.id, recipient.nick());
            }
            if let (true, Some(away)) = (is_privmsg, recipient.away_message()) {
                ctx.rb.reply(rpl::AWAY).param(recipient.nick()).trailing_param(away);
            }
        }
        Ok(())
    }

    // QUIT

    pub fn cmd_quit(&self, ctx: CommandContext<'_>, reason: &str) -> HandlerResult {
        let reason = if reason.is_empty() { lines::CLIENT_QUIT } else { reason };
        ctx.user.set_quit_message(reason);
        ctx.rb.message("", "ERROR")
            .fmt_trailing_param(lines_closing_link!(ctx.user.host(), reason));
        Ok(())
    }

    // TOPIC

    pub async fn cmd_topic(&self, ctx: CommandContext<'_>, target: &str, topic: Option<&str>)
                           -> HandlerResult
    {
        let channel = self.find_channel(ctx.user.id, ctx.rb, target).await?;

        let topic = match topic {
            Some(topic) => topic,
            None => {
                match channel.topic().await {
                    Some(topic) => {
                        ctx.rb.reply(rpl::TOPIC).param(channel.name()).trailing_param(&topic);
                    }
                    None => {
                        ctx.rb.reply(rpl::NOTOPIC)
                            .param(channel.name())
                            .trailing_param(lines::NO_TOPIC);
                    }
                }
                return Ok(());
            }
        };

        self.find_member(ctx.user.id, ctx.rb, &channel, ctx.user.nick()).await?;
        channel.set_topic(topic).await;

        let mut response = Buffer::new();
        response.message(ctx.user.full_name(), Command::Topic)
            .param(channel.name())
            .trailing_param(topic);
        self.broadcast(&channel, Some(ctx.user.nick()), MessageQueueItem::from(response)).await;
        ctx.rb.message(ctx.user.full_name(), Command::Topic)
            .param(channel.name())
            .trailing_param(topic);
        Ok(())
    }

    // USER

    pub async fn cmd_user(&self, ctx: CommandContext<'_>, user: &str, real: &str)
                          -> HandlerResult
    {
        ctx.user.set_user_real(user, real);
        self.set_connection_state(ctx.user.id, ConnectionState::Identified).await;
        self.try_register(ctx).await
    }

    // WHOIS

    pub async fn cmd_whois(&self, ctx: CommandContext<'_>, nick: &str) -> HandlerResult {
        let target = self.find_nick(ctx.user.id, ctx.rb, nick).await?;

        ctx.rb.reply(rpl::WHOISUSER)
            .param(target.nick())
            .param(target.user())
            .param(target.host())
            .param("*")
            .trailing_param(target.real());

        let mut channels = String::new();
        for channel in self.channels_of(target.nick()).await {
            if !channels.is_empty() {
                channels.push(' ');
            }
            if channel.is_operator(target.nick()).await {
                channels.push('@');
            }
            channels.push_str(channel.name());
        }
        if !channels.is_empty() {
            ctx.rb.reply(rpl::WHOISCHANNELS).param(target.nick()).trailing_param(&channels);
        }

        ctx.rb.reply(rpl::WHOISSERVER)
            .param(target.nick())
            .param(&self.domain)
            .trailing_param(lines::WHOIS_SERVER_INFO);
        if let Some(away) = target.away_message() {
            ctx.rb.reply(rpl::AWAY).param(target.nick()).trailing_param(away);
        }
        if target.is_operator() {
            ctx.rb.reply(rpl::WHOISOPERATOR)
                .param(target.nick())
                .trailing_param(lines::WHOIS_OPERATOR);
        }
        ctx.rb.reply(rpl::ENDOFWHOIS).param(target.nick()).trailing_param(lines::END_OF_WHOIS);
        Ok(())
    }
}
