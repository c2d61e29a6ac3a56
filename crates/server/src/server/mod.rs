//! Game server implementation.
//!
//! Transport glue around the core: accepts WebSocket connections, decodes
//! the JSON message contract, and relays per-tick snapshots. A connection
//! task only ever records input intents or triggers join/leave; all world
//! mutation happens in the tick loop.

use crate::config::Config;
use crate::input::InputRegistry;
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientMessage, ConnectionId, ProtocolError, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod game;

pub use game::{GameState, SnapshotBroadcast, run_game_loop};

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    // Snapshot fan-out channel; every connection subscribes.
    let (snapshot_tx, _snapshot_rx) = broadcast::channel::<SnapshotBroadcast>(8);

    let inputs = Arc::new(InputRegistry::new());
    let max_connections = config.server.max_connections;
    let tick_interval = config.server.tick_interval_ms;
    let state = Arc::new(RwLock::new(GameState::new(config)));

    // Start the tick loop.
    {
        let state = Arc::clone(&state);
        let inputs = Arc::clone(&inputs);
        let snapshot_tx = snapshot_tx.clone();
        tokio::spawn(async move {
            run_game_loop(state, inputs, snapshot_tx, tick_interval).await;
        });
    }

    let connections = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, addr) = listener.accept().await?;

        if connections.load(Ordering::Acquire) >= max_connections {
            warn!("Connection rejected (limit reached): {}", addr);
            continue;
        }
        connections.fetch_add(1, Ordering::AcqRel);

        let state = Arc::clone(&state);
        let inputs = Arc::clone(&inputs);
        let snapshot_rx = snapshot_tx.subscribe();
        let connections = Arc::clone(&connections);

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, state, inputs, snapshot_rx).await;
            connections.fetch_sub(1, Ordering::AcqRel);
            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection until it closes.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<GameState>>,
    inputs: Arc<InputRegistry>,
    mut snapshot_rx: broadcast::Receiver<SnapshotBroadcast>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    let conn_id: ConnectionId = {
        let mut game = state.write().await;
        game.allocate_connection_id()
    };

    // Message loop - handle both incoming messages and snapshot broadcasts
    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientMessage::parse(&text) {
                            Ok(ClientMessage::Join { name }) => {
                                let joined = {
                                    let mut game = state.write().await;
                                    game.join(conn_id, &name)
                                        .map(|()| (game.config.world.width, game.config.world.height))
                                };
                                let reply = match joined {
                                    Ok((world_width, world_height)) => ServerMessage::Joined {
                                        id: conn_id,
                                        world_width,
                                        world_height,
                                    },
                                    Err(err) => {
                                        warn!(connection = conn_id, %err, "join rejected");
                                        ServerMessage::Error {
                                            message: err.to_string(),
                                        }
                                    }
                                };
                                if let Ok(json) = reply.encode() {
                                    if write.send(Message::text(json)).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Ok(ClientMessage::Input { angle, magnitude }) => {
                                // Very frequent; never takes the state lock.
                                inputs.record(conn_id, angle, magnitude);
                            }
                            Ok(ClientMessage::Donate) => {
                                inputs.request_donate(conn_id);
                            }
                            Err(err) => {
                                // Malformed messages are dropped, never fatal.
                                debug!("Bad message from {}: {}", addr, err);
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // The contract is text frames only.
                        debug!("Bad message from {}: {}", addr, ProtocolError::NotText);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            snapshot = snapshot_rx.recv() => {
                match snapshot {
                    Ok(snapshot) => {
                        if let Err(e) = write.send(Message::Text(snapshot.json.clone())).await {
                            warn!("Failed to send snapshot to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Client {} lagged, skipped {} snapshots", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    // Clean up: input slot first, then the player. Safe even when the
    // client never joined.
    inputs.remove(conn_id);
    {
        let mut game = state.write().await;
        game.leave(conn_id);
    }

    Ok(())
}
