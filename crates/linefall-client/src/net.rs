use std::time::Duration;

use futures_util::{SinkExt as _, StreamExt as _};
use linefall_protocol::{ClientMessage, ServerMessage};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
    time::sleep,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};
use tracing::{debug, info, warn};

/// Connection attempts made before giving up, per (re)connect.
pub const RECONNECT_ATTEMPTS: usize = 5;

/// Pause between consecutive connection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// Transport-level event delivered alongside decoded server messages.
#[derive(Debug)]
pub enum NetEvent {
    /// The websocket is (re)established; room intent has been re-sent.
    Connected,
    Message(ServerMessage),
    /// The connection dropped; a reconnect cycle is starting.
    Disconnected,
    /// All connection attempts failed. Terminal: the transport task
    /// has exited and no further events follow.
    GaveUp { attempts: usize },
}

/// Handle to the background websocket transport.
///
/// Queues outgoing messages over an unbounded channel; the transport
/// task serializes and ships them. Room intent messages (join, create,
/// spectate) are remembered and replayed after every reconnect so the
/// relay reseats the client.
#[derive(Debug)]
pub struct NetClient {
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
    task: JoinHandle<()>,
}

impl NetClient {
    /// Spawns the transport task for the given relay URL and returns
    /// the handle plus the event receiver.
    #[must_use]
    pub fn connect(url: String) -> (Self, mpsc::UnboundedReceiver<NetEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(transport_loop(url, cmd_rx, event_tx));
        (Self { cmd_tx, task }, event_rx)
    }

    /// Queues a message for the relay.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] once the transport task has
    /// exited.
    pub fn send(&self, msg: ClientMessage) -> Result<(), crate::ClientError> {
        self.cmd_tx.send(msg).map_err(|_| crate::ClientError::Closed)
    }
}

impl Drop for NetClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// True for messages that place the connection in a room; these are
/// replayed after a reconnect.
fn is_room_intent(msg: &ClientMessage) -> bool {
    matches!(
        msg,
        ClientMessage::CreateRoom { .. }
            | ClientMessage::JoinRoom { .. }
            | ClientMessage::Spectate { .. }
    )
}

async fn transport_loop(
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    event_tx: mpsc::UnboundedSender<NetEvent>,
) {
    let mut intent: Option<ClientMessage> = None;
    loop {
        let stream = match connect_with_retry(&url).await {
            Ok(stream) => stream,
            Err(attempts) => {
                let _ = event_tx.send(NetEvent::GaveUp { attempts });
                return;
            }
        };
        info!(%url, "connected to relay");
        if event_tx.send(NetEvent::Connected).is_err() {
            return;
        }
        let (mut sink, mut source) = stream.split();

        // The relay forgot about us; re-state where we want to be.
        if let Some(msg) = intent.clone() {
            if send_json(&mut sink, &msg).await.is_err() {
                let _ = event_tx.send(NetEvent::Disconnected);
                continue;
            }
        }

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(msg) => {
                        if is_room_intent(&msg) {
                            intent = Some(msg.clone());
                        }
                        if send_json(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    // Handle dropped: close and stop for good.
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return;
                    }
                },
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                if event_tx.send(NetEvent::Message(msg)).is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                warn!(%err, "undecodable server message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Pings are answered by the protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "websocket read failed");
                        break;
                    }
                },
            }
        }

        if event_tx.send(NetEvent::Disconnected).is_err() {
            return;
        }
    }
}

async fn send_json(sink: &mut WsSink, msg: &ClientMessage) -> Result<(), ()> {
    let Ok(text) = serde_json::to_string(msg) else {
        // Wire types serialize infallibly; nothing sensible to ship.
        return Ok(());
    };
    sink.send(Message::Text(text.into())).await.map_err(|err| {
        warn!(%err, "websocket send failed");
    })
}

/// Dials until a connection sticks or the attempt budget runs out.
/// On exhaustion returns the number of attempts made.
async fn connect_with_retry(url: &str) -> Result<WsStream, usize> {
    for attempt in 1..=RECONNECT_ATTEMPTS {
        match connect_async(url).await {
            Ok((stream, _response)) => return Ok(stream),
            Err(err) => {
                warn!(attempt, %err, "connection attempt failed");
                if attempt < RECONNECT_ATTEMPTS {
                    sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
    debug!(attempts = RECONNECT_ATTEMPTS, "giving up on relay");
    Err(RECONNECT_ATTEMPTS)
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt as _, StreamExt as _};
    use linefall_protocol::RoomId;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unreachable_relay_gives_up_after_the_attempt_budget() {
        // Nothing listens on port 1; every dial is refused immediately
        // and the retry delays auto-advance under paused time.
        let (client, mut events) = NetClient::connect("ws://127.0.0.1:1".to_owned());
        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            NetEvent::GaveUp {
                attempts: RECONNECT_ATTEMPTS
            }
        ));
        assert!(events.recv().await.is_none());
        assert!(client.send(ClientMessage::GetRooms).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_replays_the_room_intent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept twice; each time read one frame and hang up, so the
        // client has to reconnect in between.
        let server = tokio::spawn(async move {
            let mut intents = Vec::new();
            for _ in 0..2 {
                let (tcp, _) = listener.accept().await.unwrap();
                let mut ws = accept_async(tcp).await.unwrap();
                let Some(Ok(Message::Text(text))) = ws.next().await else {
                    panic!("expected a text frame");
                };
                intents.push(serde_json::from_str::<ClientMessage>(&text).unwrap());
                ws.close(None).await.unwrap();
            }
            intents
        });

        let (client, mut events) = NetClient::connect(format!("ws://{addr}"));
        client
            .send(ClientMessage::JoinRoom { room_id: RoomId(4) })
            .unwrap();

        assert!(matches!(events.recv().await, Some(NetEvent::Connected)));
        assert!(matches!(events.recv().await, Some(NetEvent::Disconnected)));
        assert!(matches!(events.recv().await, Some(NetEvent::Connected)));

        let intents = server.await.unwrap();
        assert_eq!(
            intents,
            vec![
                ClientMessage::JoinRoom { room_id: RoomId(4) },
                ClientMessage::JoinRoom { room_id: RoomId(4) },
            ]
        );
    }

    #[tokio::test]
    async fn intent_is_sent_on_connect_and_replies_come_back_decoded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("expected a text frame");
            };
            let msg: ClientMessage = serde_json::from_str(&text).unwrap();
            assert_eq!(
                msg,
                ClientMessage::CreateRoom {
                    name: "alpha".to_owned()
                }
            );
            let reply = ServerMessage::RoomCreated {
                room_id: RoomId(1),
                name: "alpha".to_owned(),
            };
            let json = serde_json::to_string(&reply).unwrap();
            ws.send(Message::Text(json.into())).await.unwrap();
        });

        let (client, mut events) = NetClient::connect(format!("ws://{addr}"));
        client
            .send(ClientMessage::CreateRoom {
                name: "alpha".to_owned(),
            })
            .unwrap();

        assert!(matches!(events.recv().await, Some(NetEvent::Connected)));
        let Some(NetEvent::Message(reply)) = events.recv().await else {
            panic!("expected a decoded server message");
        };
        assert_eq!(
            reply,
            ServerMessage::RoomCreated {
                room_id: RoomId(1),
                name: "alpha".to_owned(),
            }
        );

        server.await.unwrap();
    }
}
