use crate::client::MessageQueueItem;
use crate::reader::IrcReader;
use crate::state::State;
use parlance_tokens::{Message, MESSAGE_LENGTH};
use std::net::SocketAddr;
use std::process;
use tokio::io::{self, AsyncWriteExt};
use tokio::net::{tcp, TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Returns a future that listens, accepts and handles incoming connections.
///
/// Exits the process if `addr` cannot be bound.
pub async fn listen(addr: SocketAddr, shared: State) {
    let ln = TcpListener::bind(&addr).await.unwrap_or_else(|err| {
        log::error!("Failed to listen to {}: {}", addr, err);
        process::exit(1);
    });

    log::info!("Listening on {} for plain-text connections...", addr);
    serve(ln, shared).await;
}

/// Accepts connections from `ln` and spawns a task for each of them.
pub async fn serve(ln: TcpListener, shared: State) {
    loop {
        match ln.accept().await {
            Ok((conn, peer_addr)) => {
                tokio::spawn(handle(conn, peer_addr, shared.clone()));
            }
            Err(err) => log::warn!("Failed to accept connection: {}", err),
        }
    }
}

/// Returns a future that handles an IRC connection.
///
/// Messages are read and handled in this task, while the messages sent to the client are written
/// by another task, which drains the client message queue.
async fn handle(conn: TcpStream, peer_addr: SocketAddr, shared: State) {
    let (reader, writer) = conn.into_split();
    let (msg_queue, outgoing_msgs) = mpsc::unbounded_channel();
    let mut user = shared.peer_joined(peer_addr.ip().to_string(), msg_queue).await;
    let id = user.id;
    let outgoing = tokio::spawn(write_messages(id, writer, outgoing_msgs));

    let mut reader = IrcReader::new(reader, MESSAGE_LENGTH);
    let mut buf = String::new();
    let err = loop {
        buf.clear();
        match reader.read_message(&mut buf).await {
            Ok(0) => break None,
            Ok(_) => {}
            Err(err) => break Some(err),
        }
        log::trace!("{} >> {}", id, buf);
        if let Some(msg) = Message::parse(&buf) {
            if shared.handle_message(&mut user, msg).await.is_err() {
                break None;
            }
        }
    };

    if let Some(ref err) = err {
        log::debug!("{}: Read error: {}", id, err);
    }
    shared.peer_quit(&user, err).await;

    // The writer task stops once every handle on the message queue is dropped.
    drop(user);
    let _ = outgoing.await;
}

async fn write_messages(id: usize, mut writer: tcp::OwnedWriteHalf,
                        mut outgoing_msgs: mpsc::UnboundedReceiver<MessageQueueItem>)
{
    while let Some(msg) = outgoing_msgs.recv().await {
        if log::log_enabled!(log::Level::Trace) {
            let s: &str = msg.as_ref();
            log::trace!("{} << {}", id, s.trim_end());
        }
        if let Err(err) = writer.write_all(msg.as_ref()).await {
            log::debug!("{}: Write error: {}", id, err);
            return;
        }
    }
    let _ = shutdown(&mut writer).await;
}

async fn shutdown(writer: &mut tcp::OwnedWriteHalf) -> io::Result<()> {
    writer.flush().await?;
    writer.shutdown().await
}
