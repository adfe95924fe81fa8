//! Per-connection handler: decode requests, dispatch to rooms, and pump
//! subscription events back down the socket.
//!
//! The WebSocket is split: the read half drives this handler's loop, the
//! write half is owned by a writer task fed through an mpsc channel, so
//! replies and pushed events share one ordered outbound stream without a
//! lock around the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use lixi_protocol::{
    ClientRequest, Codec, JsonCodec, ProtocolError, Reply, RoomEvent,
    ServerMessage,
};
use lixi_room::{
    DEFAULT_HOST_NAME, RoomConfig, RoomError, RoomHandle, SubscriberId,
    default_prizes,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::ServerError;
use crate::server::ServerState;

type WsStream = WebSocketStream<TcpStream>;

/// One live room subscription held by a connection. A connection observes
/// at most one room at a time; re-subscribing replaces the previous one.
struct Subscription {
    handle: RoomHandle,
    id: SubscriberId,
    pump: JoinHandle<()>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    tracing::debug!(%peer, "accepted WebSocket connection");

    let (sink, mut reader) = ws.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(sink, out_rx));

    let mut subscription: Option<Subscription> = None;

    while let Some(msg) = reader.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%peer, error = %e, "recv error");
                break;
            }
        };
        let data = match msg {
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Binary(data) => data.into(),
            Message::Close(_) => break,
            _ => continue, // ping/pong/frame
        };

        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(%peer, error = %e, "undecodable request");
                send(&out_tx, &state.codec, &ServerMessage::Error {
                    code: "BAD_REQUEST".to_string(),
                    message: e.to_string(),
                })?;
                continue;
            }
        };

        let reply =
            dispatch(request, &state, &out_tx, &mut subscription).await;
        match reply {
            Ok(Some(reply)) => {
                send(&out_tx, &state.codec, &ServerMessage::Reply(reply))?;
            }
            Ok(None) => {}
            Err(e) => {
                send(&out_tx, &state.codec, &ServerMessage::Error {
                    code: e.code().to_string(),
                    message: e.to_string(),
                })?;
            }
        }
    }

    // Detach from the room; safe even if the actor already pruned us.
    if let Some(sub) = subscription {
        sub.handle.unsubscribe(sub.id).await;
        sub.pump.abort();
    }
    drop(out_tx); // writer drains and exits
    let _ = writer.await;

    tracing::debug!(%peer, "connection closed");
    Ok(())
}

/// Executes one request against the registry/room layer.
///
/// Returns `Ok(None)` for subscribe, whose acknowledgement is the pushed
/// `room_status` event itself.
async fn dispatch(
    request: ClientRequest,
    state: &Arc<ServerState>,
    out_tx: &mpsc::UnboundedSender<Message>,
    subscription: &mut Option<Subscription>,
) -> Result<Option<Reply>, RoomError> {
    match request {
        ClientRequest::CreateRoom {
            host_name,
            mode,
            draws_per_player,
            prizes,
        } => {
            let config = RoomConfig {
                host_name: host_name
                    .unwrap_or_else(|| DEFAULT_HOST_NAME.to_string()),
                mode: mode.unwrap_or_default(),
                draws_per_player: draws_per_player.unwrap_or(1),
                prizes: prizes.unwrap_or_else(default_prizes),
            };
            let (handle, room) =
                state.registry.lock().await.create_room(config)?;
            Ok(Some(Reply::RoomCreated {
                code: handle.code().clone(),
                room,
            }))
        }

        ClientRequest::GetStatus { code } => {
            let handle = state.registry.lock().await.get(&code)?;
            Ok(Some(Reply::Status(handle.status().await?)))
        }

        ClientRequest::Join { code, name } => {
            let handle = state.registry.lock().await.get(&code)?;
            let joined = handle.join(name).await?;
            Ok(Some(Reply::Joined {
                player_id: joined.player_id,
                player_name: joined.player_name,
                room: joined.room,
            }))
        }

        ClientRequest::Start { code } => {
            let handle = state.registry.lock().await.get(&code)?;
            handle.start().await?;
            Ok(Some(Reply::Ok))
        }

        ClientRequest::End { code } => {
            let handle = state.registry.lock().await.get(&code)?;
            handle.end().await?;
            Ok(Some(Reply::Ok))
        }

        ClientRequest::AddCashPrize { code, label, amount, qty } => {
            let handle = state.registry.lock().await.get(&code)?;
            let status = handle.add_cash_prize(label, amount, qty).await?;
            Ok(Some(Reply::Status(status)))
        }

        ClientRequest::AddTrollPrize { code, label, qty } => {
            let handle = state.registry.lock().await.get(&code)?;
            let status = handle.add_troll_prize(label, qty).await?;
            Ok(Some(Reply::Status(status)))
        }

        ClientRequest::SetPrizeQty { code, prize_id, qty } => {
            let handle = state.registry.lock().await.get(&code)?;
            let status = handle.set_prize_qty(prize_id, qty).await?;
            Ok(Some(Reply::Status(status)))
        }

        ClientRequest::RemovePrize { code, prize_id } => {
            let handle = state.registry.lock().await.get(&code)?;
            let status = handle.remove_prize(prize_id).await?;
            Ok(Some(Reply::Status(status)))
        }

        ClientRequest::Draw { code, player_id, effort } => {
            let handle = state.registry.lock().await.get(&code)?;
            let drawn = handle.draw(player_id, effort).await?;
            Ok(Some(Reply::DrawResult {
                prize: drawn.prize,
                prize_text: drawn.prize_text,
                receipts: drawn.receipts,
            }))
        }

        ClientRequest::Subscribe { code } => {
            let handle = state.registry.lock().await.get(&code)?;

            // Re-subscribing moves this connection to the new room.
            if let Some(old) = subscription.take() {
                old.handle.unsubscribe(old.id).await;
                old.pump.abort();
            }

            let (ev_tx, ev_rx) = mpsc::unbounded_channel();
            let id = handle.subscribe(ev_tx).await?;
            let pump =
                tokio::spawn(pump_events(ev_rx, out_tx.clone(), state.codec));
            *subscription = Some(Subscription { handle, id, pump });
            Ok(None)
        }
    }
}

/// Forwards room events into the connection's outbound queue until either
/// side goes away.
async fn pump_events(
    mut ev_rx: mpsc::UnboundedReceiver<RoomEvent>,
    out_tx: mpsc::UnboundedSender<Message>,
    codec: JsonCodec,
) {
    while let Some(event) = ev_rx.recv().await {
        let msg = ServerMessage::Event(event);
        let frame = match encode_text(&codec, &msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event");
                continue;
            }
        };
        if out_tx.send(frame).is_err() {
            break;
        }
    }
}

/// Owns the write half: everything outbound funnels through here.
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut out_rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = out_rx.recv().await {
        if sink.send(msg).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

/// Encodes a server message into a text frame. Browser clients get
/// strings, not Blobs; JSON output is always valid UTF-8.
fn encode_text(
    codec: &JsonCodec,
    msg: &ServerMessage,
) -> Result<Message, ProtocolError> {
    let bytes = codec.encode(msg)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
    Ok(Message::text(text))
}

/// Encodes a server message and queues it on the outbound channel.
fn send(
    out_tx: &mpsc::UnboundedSender<Message>,
    codec: &JsonCodec,
    msg: &ServerMessage,
) -> Result<(), ServerError> {
    let frame = encode_text(codec, msg)?;
    out_tx.send(frame).map_err(|_| ServerError::ConnectionClosed)
}
