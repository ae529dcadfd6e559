//! WebSocket front end: accepts connections, splits each into a reader
//! loop and a writer task, and forwards parsed frames into the
//! coordinator that owns the [`Lobby`].

use std::net::SocketAddr;

use futures_util::{SinkExt as _, StreamExt as _};
use linefall_protocol::{ClientMessage, RoomId, ServerMessage};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::{
    config::RelayConfig,
    error::RelayError,
    lobby::{ConnId, FollowUp, Lobby, RESET_COOLDOWN},
};

#[derive(Debug)]
enum Command {
    Register {
        conn: ConnId,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    },
    Request {
        conn: ConnId,
        msg: ClientMessage,
    },
    Malformed {
        conn: ConnId,
    },
    Disconnect {
        conn: ConnId,
    },
    CooldownElapsed {
        room_id: RoomId,
        generation: u64,
    },
}

/// Binds the listener and serves connections until the process exits.
pub async fn run(config: &RelayConfig) -> Result<(), RelayError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;
    info!(%addr, "relay listening");

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(coordinate(cmd_rx, cmd_tx.clone()));

    let mut next_conn = 0;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!(%err, "accept failed");
                continue;
            }
        };
        let conn = ConnId(next_conn);
        next_conn += 1;
        tokio::spawn(handle_connection(stream, peer, conn, cmd_tx.clone()));
    }
}

/// The single task that owns all lobby state. Handlers run to
/// completion here; deferred work is re-entered as commands so the
/// state is never touched from another task.
async fn coordinate(
    mut commands: mpsc::UnboundedReceiver<Command>,
    scheduler: mpsc::UnboundedSender<Command>,
) {
    let mut lobby = Lobby::default();
    while let Some(command) = commands.recv().await {
        let follow_ups = match command {
            Command::Register { conn, outbox } => {
                lobby.register(conn, outbox);
                Vec::new()
            }
            Command::Request { conn, msg } => lobby.handle(conn, msg),
            Command::Malformed { conn } => {
                lobby.malformed(conn);
                Vec::new()
            }
            Command::Disconnect { conn } => {
                lobby.disconnect(conn);
                Vec::new()
            }
            Command::CooldownElapsed {
                room_id,
                generation,
            } => {
                lobby.room_cooldown_elapsed(room_id, generation);
                Vec::new()
            }
        };
        for follow_up in follow_ups {
            match follow_up {
                FollowUp::ResetRoom {
                    room_id,
                    generation,
                } => {
                    let scheduler = scheduler.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(RESET_COOLDOWN).await;
                        let _ = scheduler.send(Command::CooldownElapsed {
                            room_id,
                            generation,
                        });
                    });
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn: ConnId,
    commands: mpsc::UnboundedSender<Command>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, %err, "websocket handshake failed");
            return;
        }
    };
    debug!(%peer, %conn, "connection established");

    let (mut sink, mut frames) = ws.split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerMessage>();
    if commands.send(Command::Register { conn, outbox: outbox_tx }).is_err() {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    error!(%err, "failed to serialize message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if commands.send(Command::Request { conn, msg }).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(%conn, %err, "malformed frame");
                    if commands.send(Command::Malformed { conn }).is_err() {
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => break,
            // Pings are answered by the protocol layer; other frame
            // kinds carry nothing for us.
            Ok(_) => {}
            Err(err) => {
                debug!(%conn, %err, "connection error");
                break;
            }
        }
    }

    let _ = commands.send(Command::Disconnect { conn });
    writer.abort();
    debug!(%conn, "connection closed");
}
