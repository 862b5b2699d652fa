//! Mode parsing and validation

use std::{fmt, str};

/// User modes supported by parlance.  Advertised in welcome messages.
pub const USER_MODES: &str = "o";

/// Channel modes supported by parlance.  Advertised in welcome messages.
pub const CHAN_MODES: &str = "o";

/// Iterator over the modes of a string.
///
/// # Example
///
/// ```rust
/// # use parlance_tokens::mode::SimpleQuery;
/// let mut query = SimpleQuery::new("+o-oo");
///
/// assert_eq!(query.next(), Some((true, 'o')));
/// assert_eq!(query.next(), Some((false, 'o')));
/// assert_eq!(query.next(), Some((false, 'o')));
/// assert_eq!(query.next(), None);
/// ```
pub struct SimpleQuery<'a> {
    modes: str::Chars<'a>,
    value: bool,
}

impl<'a> SimpleQuery<'a> {
    pub fn new(modes: &'a str) -> Self {
        Self {
            modes: modes.chars(),
            value: true,
        }
    }
}

impl Iterator for SimpleQuery<'_> {
    type Item = (bool, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.modes.next()? {
                '+' => {
                    self.value = true;
                }
                '-' => {
                    self.value = false;
                }
                c => {
                    return Some((self.value, c));
                }
            }
        }
    }
}

/// *_query related errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// One of the modes in the query is unknown.
    Unknown(char, bool),

    /// A mode is missing its required parameter.
    MissingParam(char, bool),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unknown(c, _) => write!(f, "unknown mode {:?}", c),
            Error::MissingParam(c, _) => write!(f, "mode {:?} needs a parameter", c),
        }
    }
}

/// Alias to std's Result using this module's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Item of a channel mode query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelChange<'a> {
    ChangeOperator(bool, &'a str),
}

impl ChannelChange<'_> {
    /// Whether this change is enabling or disabling a mode.
    pub fn value(&self) -> bool {
        match self {
            ChannelChange::ChangeOperator(v, _) => *v,
        }
    }

    /// The letter of this mode change.
    pub fn symbol(&self) -> char {
        match self {
            ChannelChange::ChangeOperator(_, _) => 'o',
        }
    }

    /// The parameter of this mode change.
    pub fn param(&self) -> &str {
        match self {
            ChannelChange::ChangeOperator(_, p) => p,
        }
    }

    /// The mode string of this change, e.g. `+o`.
    pub fn mode_string(&self) -> String {
        let sign = if self.value() { '+' } else { '-' };
        format!("{}{}", sign, self.symbol())
    }
}

/// An iterator over the changes of a MODE query.
///
/// # Example
///
/// ```rust
/// # use parlance_tokens::mode::{self, Error, ChannelChange};
/// let mut query = mode::channel_query("-oX+o", &["admin", "bob"]);
///
/// assert_eq!(query.next(), Some(Ok(ChannelChange::ChangeOperator(false, "admin"))));
/// assert_eq!(query.next(), Some(Err(Error::Unknown('X', false))));
/// assert_eq!(query.next(), Some(Ok(ChannelChange::ChangeOperator(true, "bob"))));
/// assert_eq!(query.next(), None);
/// ```
pub fn channel_query<'a, I, S>(
    modes: &'a str,
    params: I,
) -> impl Iterator<Item = Result<ChannelChange<'a>>>
where
    I: IntoIterator<Item = &'a S> + 'a,
    S: AsRef<str> + ?Sized + 'a,
{
    let mut params = params
        .into_iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty());
    SimpleQuery::new(modes).map(move |(value, mode)| match mode {
        'o' => {
            if let Some(param) = params.next() {
                Ok(ChannelChange::ChangeOperator(value, param))
            } else {
                Err(Error::MissingParam('o', value))
            }
        }
        other => Err(Error::Unknown(other, value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_query() {
        let params = vec!["alice".to_owned()];
        let changes: Vec<_> = channel_query("+o", &params).collect();
        assert_eq!(changes, vec![Ok(ChannelChange::ChangeOperator(true, "alice"))]);

        let changes: Vec<_> = channel_query("-o", &["bob"]).collect();
        assert_eq!(changes[0].unwrap().mode_string(), "-o");

        let changes: Vec<_> = channel_query("+v", &["bob"]).collect();
        assert_eq!(changes, vec![Err(Error::Unknown('v', true))]);

        let empty: [&str; 0] = [];
        let changes: Vec<_> = channel_query("+o", &empty).collect();
        assert_eq!(changes, vec![Err(Error::MissingParam('o', true))]);
    }
}
