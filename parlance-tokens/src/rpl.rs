//! The list of IRC replies.
//!
//! Each reply must have the client's nick as first parameter.
//!
//! Sources:
//!
//! - <https://tools.ietf.org/html/rfc2812.html#section-5>
//! - <https://modern.ircdocs.horse/#numerics>

pub const WELCOME: &str   = "001";  // :Welcome to the Internet Relay Network <nick>!<user>@<host>
pub const YOURHOST: &str  = "002";  // :Your host is <servername>, running version <ver>
pub const CREATED: &str   = "003";  // :This server was created <date>
pub const MYINFO: &str    = "004";  // <servername> <version> <umodes> <chan modes>

pub const LUSERCLIENT: &str   = "251";  // :There are <int> users and <int> services on <int> servers
pub const LUSEROP: &str       = "252";  // <int> :operator(s) online
pub const LUSERUNKNOWN: &str  = "253";  // <int> :unknown connection(s)
pub const LUSERCHANNELS: &str = "254";  // <int> :channels formed
pub const LUSERME: &str       = "255";  // :I have <int> clients and <int> servers

pub const AWAY: &str          = "301";  // <nick> :<away message>
pub const UNAWAY: &str        = "305";  // :You are no longer marked as being away
pub const NOWAWAY: &str       = "306";  // :You have been marked as being away
pub const WHOISUSER: &str     = "311";  // <nick> <user> <host> * :<realname>
pub const WHOISSERVER: &str   = "312";  // <nick> <server> :<server info>
pub const WHOISOPERATOR: &str = "313";  // <nick> :is an IRC operator
pub const ENDOFWHOIS: &str    = "318";  // <nick> :End of WHOIS list
pub const WHOISCHANNELS: &str = "319";  // <nick> :*( (@) <channel> " " )
pub const LIST: &str          = "322";  // <channel> <# of visible members> :<topic>
pub const LISTEND: &str       = "323";  // :End of LIST
pub const NOTOPIC: &str       = "331";  // <channel> :No topic is set
pub const TOPIC: &str         = "332";  // <channel> :<topic>
pub const NAMREPLY: &str      = "353";  // = <channel> :1*(@/ /+user)
pub const ENDOFNAMES: &str    = "366";  // <channel> :End of NAMES list
pub const MOTD: &str          = "372";  // :- <text>
pub const MOTDSTART: &str     = "375";  // :- <servername> Message of the day -
pub const ENDOFMOTD: &str     = "376";  // :End of MOTD command
pub const YOUREOPER: &str     = "381";  // :You are now an IRC operator

pub const ERR_NOSUCHNICK: &str       = "401";  // <nick> :No such nick/channel
pub const ERR_NOSUCHCHANNEL: &str    = "403";  // <channel> :No such channel
pub const ERR_CANNOTSENDTOCHAN: &str = "404";  // <channel> :Cannot send to channel
pub const ERR_NORECIPIENT: &str      = "411";  // :No recipient given (<command>)
pub const ERR_NOTEXTTOSEND: &str     = "412";  // :No text to send
pub const ERR_UNKNOWNCOMMAND: &str   = "421";  // <command> :Unknown command
pub const ERR_NOMOTD: &str           = "422";  // :MOTD File is missing
pub const ERR_NONICKNAMEGIVEN: &str  = "431";  // :No nickname given
pub const ERR_ERRONEUSNICKNAME: &str = "432";  // <nick> :Erroneous nickname
pub const ERR_NICKNAMEINUSE: &str    = "433";  // <nick> :Nickname is already in use
pub const ERR_USERNOTINCHANNEL: &str = "441";  // <nick> <channel> :They aren't on that channel
pub const ERR_NOTONCHANNEL: &str     = "442";  // <channel> :You're not on that channel
pub const ERR_NOTREGISTERED: &str    = "451";  // :You have not registered
pub const ERR_NEEDMOREPARAMS: &str   = "461";  // <command> :Not enough parameters
pub const ERR_ALREADYREGISTRED: &str = "462";  // :Unauthorized command (already registered)
pub const ERR_PASSWDMISMATCH: &str   = "464";  // :Password incorrect
pub const ERR_UNKNOWNMODE: &str      = "472";  // <char> :is unknown mode char to me for <channel>
pub const ERR_CHANOPRIVSNEEDED: &str = "482";  // <channel> :You're not channel operator
