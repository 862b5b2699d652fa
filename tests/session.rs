use parlance::{config, net, State};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self { reader: BufReader::new(reader), writer }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
    }

    async fn line(&mut self) -> String {
        let mut buf = String::new();
        timeout(Duration::from_secs(5), self.reader.read_line(&mut buf))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        buf.trim_end().to_owned()
    }

    /// Reads lines until one contains `needle`, and returns it.
    async fn expect(&mut self, needle: &str) -> String {
        loop {
            let line = self.line().await;
            assert!(!line.is_empty(), "connection closed before {:?}", needle);
            if line.contains(needle) {
                return line;
            }
        }
    }
}

async fn start_server() -> std::net::SocketAddr {
    let ln = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = ln.local_addr().unwrap();
    tokio::spawn(net::serve(ln, State::new(config::State::sample())));
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chat_session() {
    let addr = start_server().await;
    let mut alice = Client::connect(addr).await;
    let mut bob = Client::connect(addr).await;

    alice.send("NICK alice").await;
    alice.send("USER a 0 * :Alice A").await;
    assert_eq!(alice.line().await,
               ":parlance.localdomain 001 alice :Welcome to the Internet Relay Network \
                alice!a@127.0.0.1");
    alice.expect(" 422 alice ").await;

    bob.send("NICK alice").await;
    assert_eq!(bob.line().await,
               ":parlance.localdomain 433 * alice :Nickname is already in use");
    bob.send("NICK bob\nUSER b 0 * :Bob B").await;
    bob.expect(" 422 bob ").await;

    alice.send("JOIN #test").await;
    assert_eq!(alice.line().await, ":alice!a@127.0.0.1 JOIN #test");
    assert_eq!(alice.line().await, ":parlance.localdomain 353 alice = #test :@alice");
    alice.expect(" 366 alice #test ").await;

    bob.send("JOIN #test").await;
    assert_eq!(bob.line().await, ":bob!b@127.0.0.1 JOIN #test");
    assert_eq!(alice.line().await, ":bob!b@127.0.0.1 JOIN #test");
    bob.expect(" 366 bob #test ").await;

    alice.send("PRIVMSG #test :hi").await;
    assert_eq!(bob.line().await, ":alice!a@127.0.0.1 PRIVMSG #test :hi");

    alice.send("OPER wrongpass").await;
    assert_eq!(alice.line().await, ":parlance.localdomain 464 alice :Password incorrect");

    bob.send("QUIT :bye").await;
    assert_eq!(bob.line().await, "ERROR :Closing Link: 127.0.0.1 (bye)");
    assert_eq!(bob.line().await, "");
    assert_eq!(alice.line().await, ":bob!b@127.0.0.1 QUIT :bye");

    alice.send("PART #test").await;
    assert_eq!(alice.line().await, ":alice!a@127.0.0.1 PART #test");
    alice.send("LIST").await;
    assert_eq!(alice.line().await, ":parlance.localdomain 323 alice :End of LIST");
}

#[tokio::test]
async fn test_unregistered_connection() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send("JOIN #test").await;
    assert_eq!(client.line().await, ":parlance.localdomain 451 * :You have not registered");
    client.send("PING :are you there").await;
    assert_eq!(client.line().await,
               ":parlance.localdomain PONG parlance.localdomain :are you there");
    client.send("QUIT").await;
    assert_eq!(client.line().await, "ERROR :Closing Link: 127.0.0.1 (Client Quit)");
    assert_eq!(client.line().await, "");
}
