//! Human-readable parts of the replies sent to clients.

//
// Network messages
//

pub const CLIENT_QUIT: &str = "Client Quit";

pub const CONNECTION_RESET: &str = "Connection reset by peer";

#[macro_export]
macro_rules! lines_closing_link {
    ( $host:expr, $reason:expr ) => {
        format_args!("Closing Link: {} ({})", $host, $reason)
    };
}

//
// IRC replies
//

pub const ALREADY_REGISTERED: &str = "Unauthorized command (already registered)";

pub const CANNOT_SEND_TO_CHAN: &str = "Cannot send to channel";

pub const CHAN_O_PRIVS_NEEDED: &str = "You're not channel operator";

pub const END_OF_LIST: &str = "End of LIST";

pub const END_OF_MOTD: &str = "End of MOTD command";

pub const END_OF_NAMES: &str = "End of NAMES list";

pub const END_OF_WHOIS: &str = "End of WHOIS list";

pub const ERRONEOUS_NICKNAME: &str = "Erroneous nickname";

pub const NEED_MORE_PARAMS: &str = "Not enough parameters";

pub const NICKNAME_IN_USE: &str = "Nickname is already in use";

pub const NO_MOTD: &str = "MOTD File is missing";

pub const NO_NICKNAME_GIVEN: &str = "No nickname given";

pub const NO_TEXT_TO_SEND: &str = "No text to send";

pub const NO_TOPIC: &str = "No topic is set";

pub const NO_SUCH_NICK: &str = "No such nick/channel";

pub const NO_SUCH_CHANNEL: &str = "No such channel";

pub const NOT_ON_CHANNEL: &str = "You're not on that channel";

pub const NOT_REGISTERED: &str = "You have not registered";

pub const NOW_AWAY: &str = "You have been marked as being away";

pub const PASSWORD_MISMATCH: &str = "Password incorrect";

pub const UN_AWAY: &str = "You are no longer marked as being away";

pub const UNKNOWN_COMMAND: &str = "Unknown command";

pub const USER_NOT_IN_CHANNEL: &str = "They aren't on that channel";

pub const WHOIS_OPERATOR: &str = "is an IRC operator";

pub const WHOIS_SERVER_INFO: &str = "parlance IRC server";

pub const YOURE_OPER: &str = "You are now an IRC operator";

#[macro_export]
macro_rules! lines_no_recipient {
    ( $command:expr ) => {
        format_args!("No recipient given ({})", $command)
    };
}

#[macro_export]
macro_rules! lines_unknown_mode {
    ( $channel:expr ) => {
        format_args!("is unknown mode char to me for {}", $channel)
    };
}

//
// Welcome messages
//

#[macro_export]
macro_rules! lines_welcome {
    ( $name:expr ) => {
        format_args!("Welcome to the Internet Relay Network {}", $name)
    };
}

#[macro_export]
macro_rules! lines_your_host {
    ( $host:expr, $version:expr ) => {
        format_args!("Your host is {}, running version {}", $host, $version)
    };
}

#[macro_export]
macro_rules! lines_created {
    ( $since:expr ) => {
        format_args!("This server was created {}", $since)
    };
}

#[macro_export]
macro_rules! lines_luser_client {
    ( $num_users:expr ) => {
        format_args!("There are {} users and 0 services on 1 servers", $num_users)
    };
}

pub const LUSER_OP: &str = "operator(s) online";

pub const LUSER_UNKNOWN: &str = "unknown connection(s)";

pub const LUSER_CHANNELS: &str = "channels formed";

#[macro_export]
macro_rules! lines_luser_me {
    ( $num_clients:expr ) => {
        format_args!("I have {} clients and 1 servers", $num_clients)
    };
}

#[macro_export]
macro_rules! lines_motd_start {
    ( $domain:expr ) => {
        format_args!("- {} Message of the day - ", $domain)
    };
}
