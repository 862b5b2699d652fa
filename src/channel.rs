use tokio::sync::Mutex;

/// A channel member, and its channel modes.
///
/// https://tools.ietf.org/html/rfc2811.html#section-4.1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub nick: String,
    pub operator: bool,
}

impl Member {
    /// The prefix of the member in NAMES replies.
    pub fn symbol(&self) -> Option<char> {
        if self.operator {
            Some('@')
        } else {
            None
        }
    }
}

/// The result of `Channel::join`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,

    /// The channel has been removed from the directory, and must not be joined anymore.
    Closed,
}

/// The result of `Channel::leave`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    NotMember,

    /// The member has left and the channel is now empty.  The caller must remove the channel
    /// from the directory.
    EmptyAfter,
}

#[derive(Default)]
struct ChannelInner {
    /// Members, in the order they joined.
    members: Vec<Member>,

    topic: Option<String>,

    /// Set when the channel is removed from the directory.
    closed: bool,
}

impl ChannelInner {
    fn position(&self, nick: &str) -> Option<usize> {
        self.members.iter().position(|m| m.nick.eq_ignore_ascii_case(nick))
    }
}

/// Channel data.
///
/// Every operation is serialized by the channel's own lock, so that two clients joining or
/// leaving the same channel do not race.
pub struct Channel {
    /// The name of the channel, as given by its creator.
    name: String,

    inner: Mutex<ChannelInner>,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            inner: Mutex::new(ChannelInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `nick` to the members.  The creator of the channel is given the operator flag.
    pub async fn join(&self, nick: &str, is_creator: bool) -> JoinOutcome {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return JoinOutcome::Closed;
        }
        if inner.position(nick).is_some() {
            return JoinOutcome::AlreadyMember;
        }
        inner.members.push(Member {
            nick: nick.to_owned(),
            operator: is_creator,
        });
        JoinOutcome::Joined
    }

    pub async fn leave(&self, nick: &str) -> LeaveOutcome {
        let mut inner = self.inner.lock().await;
        match inner.position(nick) {
            Some(i) => {
                inner.members.remove(i);
                if inner.members.is_empty() {
                    LeaveOutcome::EmptyAfter
                } else {
                    LeaveOutcome::Left
                }
            }
            None => LeaveOutcome::NotMember,
        }
    }

    /// Changes the nickname of a member, keeping its position and modes.
    ///
    /// Returns false if `old` is not a member.
    pub async fn rename_member(&self, old: &str, new: &str) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.position(old) {
            Some(i) => {
                inner.members[i].nick = new.to_owned();
                true
            }
            None => false,
        }
    }

    /// Gives or takes the operator flag of a member.
    ///
    /// Returns false if `nick` is not a member.
    pub async fn set_operator(&self, nick: &str, operator: bool) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.position(nick) {
            Some(i) => {
                inner.members[i].operator = operator;
                true
            }
            None => false,
        }
    }

    pub async fn member_count(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    /// The nicknames of the members, in the order they joined.
    pub async fn member_nicks(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.members.iter().map(|m| m.nick.clone()).collect()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.inner.lock().await.members.clone()
    }

    pub async fn is_member(&self, nick: &str) -> bool {
        self.inner.lock().await.position(nick).is_some()
    }

    pub async fn is_operator(&self, nick: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.position(nick).map_or(false, |i| inner.members[i].operator)
    }

    pub async fn topic(&self) -> Option<String> {
        self.inner.lock().await.topic.clone()
    }

    /// Sets the topic, or clears it when `topic` is empty.
    pub async fn set_topic(&self, topic: &str) {
        let mut inner = self.inner.lock().await;
        inner.topic = if topic.is_empty() { None } else { Some(topic.to_owned()) };
    }

    /// Marks the channel as removed if it has no members.
    ///
    /// Returns whether the channel is closed.  Called with the channel directory locked.
    pub(crate) async fn close_if_empty(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.members.is_empty() {
            inner.closed = true;
        }
        inner.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let channel = Channel::new("#test");
        assert_eq!(channel.join("alice", true).await, JoinOutcome::Joined);
        assert_eq!(channel.join("Alice", false).await, JoinOutcome::AlreadyMember);
        assert_eq!(channel.member_count().await, 1);
        assert!(channel.is_operator("alice").await);

        assert_eq!(channel.join("bob", false).await, JoinOutcome::Joined);
        assert!(!channel.is_operator("bob").await);
        assert_eq!(channel.member_nicks().await, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_leave() {
        let channel = Channel::new("#test");
        channel.join("alice", true).await;
        channel.join("bob", false).await;

        assert_eq!(channel.leave("carol").await, LeaveOutcome::NotMember);
        assert_eq!(channel.leave("BOB").await, LeaveOutcome::Left);
        assert_eq!(channel.leave("alice").await, LeaveOutcome::EmptyAfter);
        assert_eq!(channel.member_count().await, 0);
    }

    #[tokio::test]
    async fn test_closed_channel_cannot_be_joined() {
        let channel = Channel::new("#test");
        channel.join("alice", true).await;
        assert!(!channel.close_if_empty().await);

        channel.leave("alice").await;
        assert!(channel.close_if_empty().await);
        assert_eq!(channel.join("bob", true).await, JoinOutcome::Closed);
    }

    #[tokio::test]
    async fn test_rename_keeps_position_and_modes() {
        let channel = Channel::new("#test");
        channel.join("alice", true).await;
        channel.join("bob", false).await;

        assert!(channel.rename_member("alice", "alicia").await);
        assert!(!channel.rename_member("carol", "caroline").await);
        assert_eq!(channel.member_nicks().await, vec!["alicia", "bob"]);
        assert!(channel.is_operator("alicia").await);
        assert!(!channel.is_member("alice").await);
    }

    #[tokio::test]
    async fn test_operator_and_topic() {
        let channel = Channel::new("#test");
        channel.join("alice", true).await;
        channel.join("bob", false).await;

        assert!(channel.set_operator("bob", true).await);
        assert!(channel.set_operator("alice", false).await);
        assert!(!channel.set_operator("carol", true).await);
        let symbols: Vec<_> = channel.members().await.iter().map(Member::symbol).collect();
        assert_eq!(symbols, vec![None, Some('@')]);

        assert_eq!(channel.topic().await, None);
        channel.set_topic("hello").await;
        assert_eq!(channel.topic().await.as_deref(), Some("hello"));
        channel.set_topic("").await;
        assert_eq!(channel.topic().await, None);
    }
}
