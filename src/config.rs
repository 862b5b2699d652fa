//! Configuration parsing and structures.
//!
//! Settings come from an optional scfg file (see `doc/parlance.conf` for an example), then from
//! the command line, which takes precedence.

use std::{ffi, fmt, fs, io, net, path};
use std::str::FromStr;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Format(String),
    MissingValue(&'static str),
    BadValue(&'static str, String),
    MissingPassword,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(val: io::Error) -> Self { Self::Io(val) }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => err.fmt(f),
            Self::Format(msg) => write!(f, "syntax error: {}", msg),
            Self::MissingValue(name) => write!(f, "'{}' needs a value", name),
            Self::BadValue(name, value) => write!(f, "'{}' cannot be set to {:?}", name, value),
            Self::MissingPassword => write!(f, "an operator password is required (-o)"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Settings for `State`.
#[derive(Clone, Debug)]
pub struct State {
    pub domain: String,
    pub password: String,
    pub motd_file: Option<String>,
    pub channellen: usize,
    pub nicklen: usize,
}

/// The whole configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen: net::SocketAddr,
    pub workers: usize,
    pub state: State,
}

impl State {
    pub fn sample() -> Self {
        Self {
            domain: "parlance.localdomain".to_owned(),
            password: "hunter2".to_owned(),
            motd_file: None,
            channellen: 50,
            nicklen: 9,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: net::SocketAddr::from(([0, 0, 0, 0], 6667)),
            workers: 0,
            state: State {
                domain: gethostname::gethostname().to_string_lossy().into_owned(),
                password: String::new(),
                ..State::sample()
            },
        }
    }
}

/// Reads the value of the directive `name`, if present.
fn setting<T>(doc: &scfg::Scfg, name: &'static str) -> Result<Option<T>>
    where T: FromStr
{
    let directive = match doc.get(name) {
        Some(directive) => directive,
        None => return Ok(None),
    };
    let value = directive.params().first().ok_or(Error::MissingValue(name))?;
    value.parse().map(Some).map_err(|_| Error::BadValue(name, value.clone()))
}

impl Config {
    /// Reads the configuration file at the given path.
    pub fn from_file<P>(path: P) -> Result<Self>
        where P: AsRef<path::Path>
    {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }

    /// Overrides the file settings with the ones given on the command line.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(port) = args.port {
            self.listen.set_port(port);
        }
        if let Some(ref password) = args.password {
            self.state.password = password.clone();
        }
        if let Some(ref domain) = args.domain {
            self.state.domain = domain.clone();
        }
    }

    /// Checks the settings that have no sensible default.
    pub fn validate(&self) -> Result<()> {
        if self.state.password.is_empty() {
            return Err(Error::MissingPassword);
        }
        if self.state.domain.is_empty() || self.state.domain.contains(' ') {
            return Err(Error::BadValue("domain", self.state.domain.clone()));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(contents: &str) -> Result<Self> {
        let doc = contents.parse::<scfg::Scfg>()
            .map_err(|err| Error::Format(err.to_string()))?;
        let mut res = Self::default();

        if let Some(listen) = setting(&doc, "listen")? { res.listen = listen; }
        if let Some(workers) = setting(&doc, "workers")? { res.workers = workers; }
        if let Some(domain) = setting(&doc, "domain")? { res.state.domain = domain; }
        if let Some(password) = setting(&doc, "password")? { res.state.password = password; }
        if let Some(motd_file) = setting(&doc, "motd_file")? { res.state.motd_file = Some(motd_file); }
        if let Some(channellen) = setting(&doc, "channellen")? { res.state.channellen = channellen; }
        if let Some(nicklen) = setting(&doc, "nicklen")? { res.state.nicklen = nicklen; }

        if res.state.channellen == 0 || res.state.nicklen == 0 {
            return Err(Error::BadValue("nicklen/channellen", "0".to_owned()));
        }
        Ok(res)
    }
}

/// How much the server logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    /// The default `env_logger` filter for this verbosity.
    pub fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "parlance=error",
            Self::Normal => "parlance=info",
            Self::Verbose => "parlance=debug",
            Self::Trace => "parlance=trace",
        }
    }
}

/// Command-line arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
    pub config_file: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub verbosity: Verbosity,
}

fn app() -> clap::App<'static, 'static> {
    clap::App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(clap::Arg::with_name("OPER_PASSWD")
            .short("o")
            .long("oper-password")
            .value_name("OPER_PASSWD")
            .help("Password of the OPER command")
            .takes_value(true))
        .arg(clap::Arg::with_name("CONFIG_FILE")
            .short("c")
            .long("config")
            .value_name("CONFIG_FILE")
            .help("parlance's configuration file")
            .takes_value(true))
        .arg(clap::Arg::with_name("PORT")
            .short("p")
            .long("port")
            .value_name("PORT")
            .help("Port to listen on")
            .takes_value(true)
            .validator(|s| {
                s.parse::<u16>().map(|_| ()).map_err(|_| format!("invalid port {:?}", s))
            }))
        .arg(clap::Arg::with_name("SERVERNAME")
            .short("s")
            .long("server-name")
            .value_name("SERVERNAME")
            .help("Name of the server, used as prefix of its replies")
            .takes_value(true))
        .arg(clap::Arg::with_name("QUIET")
            .short("q")
            .long("quiet")
            .help("Only log errors")
            .conflicts_with("VERBOSE"))
        .arg(clap::Arg::with_name("VERBOSE")
            .short("v")
            .multiple(true)
            .help("Log more, -vv to log every line"))
}

impl Args {
    /// Parses the command line, program name included.
    ///
    /// On `-h`, `-V` or bad arguments, returns the `clap::Error` to print.
    pub fn parse<I, T>(args: I) -> std::result::Result<Self, clap::Error>
        where I: IntoIterator<Item = T>,
              T: Into<ffi::OsString> + Clone
    {
        let matches = app().get_matches_from_safe(args)?;
        let verbosity = if matches.is_present("QUIET") {
            Verbosity::Quiet
        } else {
            match matches.occurrences_of("VERBOSE") {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        };
        let value = |name: &str| matches.value_of(name).map(str::to_owned);

        Ok(Args {
            config_file: value("CONFIG_FILE"),
            port: matches.value_of("PORT").and_then(|port| port.parse().ok()),
            password: value("OPER_PASSWD"),
            domain: value("SERVERNAME"),
            verbosity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> std::result::Result<Args, clap::Error> {
        Args::parse(std::iter::once("parlance").chain(s.split_whitespace()))
    }

    #[test]
    fn test_parse_args() {
        let a = args("-o secret -p 7000 -s irc.example.org -vv").unwrap();
        assert_eq!(a.password.as_deref(), Some("secret"));
        assert_eq!(a.port, Some(7000));
        assert_eq!(a.domain.as_deref(), Some("irc.example.org"));
        assert_eq!(a.verbosity, Verbosity::Trace);
        assert_eq!(args("-v -c parlance.conf").unwrap().verbosity, Verbosity::Verbose);
        assert_eq!(args("--config parlance.conf").unwrap().config_file.as_deref(),
                   Some("parlance.conf"));
        assert_eq!(args("-q").unwrap().verbosity, Verbosity::Quiet);
        assert_eq!(args("").unwrap().verbosity, Verbosity::Normal);

        assert_eq!(args("-h").unwrap_err().kind, clap::ErrorKind::HelpDisplayed);
        assert!(args("-p").is_err());
        assert_eq!(args("-p notaport").unwrap_err().kind, clap::ErrorKind::ValueValidation);
        assert!(args("-n network.txt").is_err());
        assert!(args("-q -v").is_err());
    }

    #[test]
    fn test_from_str() {
        let config: Config = "listen 127.0.0.1:7667\n\
                              domain irc.example.org\n\
                              password hunter2\n\
                              nicklen 16\n"
            .parse()
            .unwrap();
        assert_eq!(config.listen, net::SocketAddr::from(([127, 0, 0, 1], 7667)));
        assert_eq!(config.state.domain, "irc.example.org");
        assert_eq!(config.state.password, "hunter2");
        assert_eq!(config.state.nicklen, 16);
        assert_eq!(config.state.channellen, 50);
        assert!(config.validate().is_ok());

        match "listen nowhere\n".parse::<Config>() {
            Err(Error::BadValue("listen", _)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_args_override_file() {
        let mut config: Config = "password fromfile\n".parse().unwrap();
        let a = args("-o fromargs -p 6697").unwrap();
        config.apply_args(&a);
        assert_eq!(config.state.password, "fromargs");
        assert_eq!(config.listen.port(), 6697);

        let mut config = Config::default();
        config.apply_args(&args("").unwrap());
        match config.validate() {
            Err(Error::MissingPassword) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
