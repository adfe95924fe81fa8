//! End-to-end tests: real server, real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lixi_protocol::{
    ClientRequest, PrizeSpec, Reply, RoomEvent, ServerMessage,
};
use lixi_server::LixiServerBuilder;
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start() -> String {
    let server = LixiServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(ws: &mut Ws, req: &ClientRequest) {
    let bytes = serde_json::to_vec(req).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for server message")
        .expect("stream ended")
        .expect("websocket error");
    serde_json::from_slice(&msg.into_data()).unwrap()
}

fn reply(msg: ServerMessage) -> Reply {
    match msg {
        ServerMessage::Reply(reply) => reply,
        other => panic!("expected reply, got {other:?}"),
    }
}

fn event(msg: ServerMessage) -> RoomEvent {
    match msg {
        ServerMessage::Event(event) => event,
        other => panic!("expected event, got {other:?}"),
    }
}

/// Creates a room with one 100k cash prize and one draw per player,
/// returning its code.
async fn create_test_room(ws: &mut Ws) -> String {
    send(
        ws,
        &ClientRequest::CreateRoom {
            host_name: Some("Anh Hai".to_string()),
            mode: None,
            draws_per_player: Some(1),
            prizes: Some(vec![PrizeSpec::Cash {
                amount: 100_000,
                qty: 1,
                label: None,
            }]),
        },
    )
    .await;
    match reply(recv(ws).await) {
        Reply::RoomCreated { code, room } => {
            assert_eq!(room.host_name, "Anh Hai");
            assert_eq!(room.total_prizes, 1);
            code.as_str().to_string()
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

// ---------------------------------------------------------------
// Create / status
// ---------------------------------------------------------------

#[tokio::test]
async fn test_create_room_with_defaults() {
    let addr = start().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &ClientRequest::CreateRoom {
            host_name: None,
            mode: None,
            draws_per_player: None,
            prizes: None,
        },
    )
    .await;

    match reply(recv(&mut ws).await) {
        Reply::RoomCreated { code, room } => {
            assert_eq!(code.as_str().len(), 6);
            assert_eq!(room.host_name, "Chủ Xị");
            assert_eq!(room.draws_per_player, 1);
            // Default chips: 500k + 200k + 2×100k + 5×50k.
            assert_eq!(room.total_prizes, 9);
            assert_eq!(room.total_budget, 1_150_000);
            assert!(!room.started);
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_status_round_trips_create() {
    let addr = start().await;
    let mut ws = connect(&addr).await;
    let code = create_test_room(&mut ws).await;

    send(&mut ws, &ClientRequest::GetStatus { code: code.clone() }).await;
    match reply(recv(&mut ws).await) {
        Reply::Status(status) => {
            assert_eq!(status.code.as_str(), code);
            assert_eq!(status.host_name, "Anh Hai");
            assert_eq!(status.draws_per_player, 1);
            assert_eq!(status.total_budget, 100_000);
        }
        other => panic!("expected status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_sends_text_frames() {
    let addr = start().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &ClientRequest::CreateRoom {
            host_name: None,
            mode: None,
            draws_per_player: None,
            prizes: None,
        },
    )
    .await;

    // Browser clients expect strings, not Blobs.
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for server message")
        .expect("stream ended")
        .expect("websocket error");
    assert!(msg.is_text(), "expected a text frame, got {msg:?}");
    let decoded: ServerMessage = serde_json::from_slice(&msg.into_data()).unwrap();
    assert!(matches!(decoded, ServerMessage::Reply(_)));
}

#[tokio::test]
async fn test_unknown_room_yields_error_code() {
    let addr = start().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientRequest::GetStatus { code: "000000".to_string() })
        .await;
    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => {
            assert_eq!(code, "ROOM_NOT_FOUND")
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_request_yields_bad_request() {
    let addr = start().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json at all".into())).await.unwrap();
    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "BAD_REQUEST"),
        other => panic!("expected error, got {other:?}"),
    }

    // The connection survives a bad request.
    send(&mut ws, &ClientRequest::GetStatus { code: "000000".to_string() })
        .await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));
}

// ---------------------------------------------------------------
// Full game flow with a separate spectator connection
// ---------------------------------------------------------------

#[tokio::test]
async fn test_full_game_flow_with_subscriber() {
    let addr = start().await;
    let mut host = connect(&addr).await;
    let code = create_test_room(&mut host).await;

    // Spectator subscribes on its own connection and receives the
    // initial snapshot immediately.
    let mut spectator = connect(&addr).await;
    send(&mut spectator, &ClientRequest::Subscribe { code: code.clone() })
        .await;
    match event(recv(&mut spectator).await) {
        RoomEvent::RoomStatus(status) => assert_eq!(status.total_players, 0),
        other => panic!("expected room_status, got {other:?}"),
    }

    // Player joins.
    send(
        &mut host,
        &ClientRequest::Join { code: code.clone(), name: "An".to_string() },
    )
    .await;
    let player_id = match reply(recv(&mut host).await) {
        Reply::Joined { player_id, player_name, room } => {
            assert_eq!(player_name, "An");
            assert_eq!(room.total_players, 1);
            player_id
        }
        other => panic!("expected joined, got {other:?}"),
    };
    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::PlayerJoined { .. }
    ));
    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::RoomStatus(_)
    ));

    // Host starts the game.
    send(&mut host, &ClientRequest::Start { code: code.clone() }).await;
    assert!(matches!(reply(recv(&mut host).await), Reply::Ok));
    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::GameStarted
    ));
    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::RoomStatus(_)
    ));

    // A weak draw is rejected and pushes nothing.
    send(
        &mut host,
        &ClientRequest::Draw {
            code: code.clone(),
            player_id: player_id.clone(),
            effort: 5.0,
        },
    )
    .await;
    match recv(&mut host).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "DRAW_TOO_WEAK"),
        other => panic!("expected error, got {other:?}"),
    }

    // A real draw wins the only prize.
    send(
        &mut host,
        &ClientRequest::Draw {
            code: code.clone(),
            player_id: player_id.clone(),
            effort: 42.0,
        },
    )
    .await;
    match reply(recv(&mut host).await) {
        Reply::DrawResult { prize, prize_text, receipts } => {
            assert_eq!(prize_text, "100.000đ");
            assert_eq!(prize.remaining, 0);
            assert_eq!(receipts.len(), 1);
        }
        other => panic!("expected draw_result, got {other:?}"),
    }
    match event(recv(&mut spectator).await) {
        RoomEvent::PrizeWon { player_name, prize_text, .. } => {
            assert_eq!(player_name, "An");
            assert_eq!(prize_text, "100.000đ");
        }
        other => panic!("expected prize_won, got {other:?}"),
    }
    match event(recv(&mut spectator).await) {
        RoomEvent::WinnerAdded(winner) => {
            assert_eq!(winner.prize_text, "Lì xì 100k")
        }
        other => panic!("expected winner_added, got {other:?}"),
    }
    match event(recv(&mut spectator).await) {
        RoomEvent::RoomStatus(status) => {
            assert_eq!(status.total_prizes, 0);
            assert_eq!(status.players[0].draws_used, 1);
        }
        other => panic!("expected room_status, got {other:?}"),
    }

    // The player is out of draws now.
    send(
        &mut host,
        &ClientRequest::Draw { code, player_id, effort: 42.0 },
    )
    .await;
    match recv(&mut host).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "OUT_OF_DRAWS"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pool_edit_broadcasts_to_subscriber() {
    let addr = start().await;
    let mut host = connect(&addr).await;
    let code = create_test_room(&mut host).await;

    let mut spectator = connect(&addr).await;
    send(&mut spectator, &ClientRequest::Subscribe { code: code.clone() })
        .await;
    let _ = recv(&mut spectator).await; // initial room_status

    send(
        &mut host,
        &ClientRequest::AddTrollPrize {
            code,
            label: "Hát một bài".to_string(),
            qty: 2,
        },
    )
    .await;
    match reply(recv(&mut host).await) {
        Reply::Status(status) => assert_eq!(status.prizes.len(), 2),
        other => panic!("expected status, got {other:?}"),
    }
    match event(recv(&mut spectator).await) {
        RoomEvent::PrizePoolUpdated(prizes) => assert_eq!(prizes.len(), 2),
        other => panic!("expected prize_pool_updated, got {other:?}"),
    }
    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::RoomStatus(_)
    ));
}

#[tokio::test]
async fn test_resubscribe_replaces_previous_subscription() {
    let addr = start().await;
    let mut host = connect(&addr).await;
    let code_a = create_test_room(&mut host).await;
    let code_b = create_test_room(&mut host).await;

    let mut spectator = connect(&addr).await;
    send(&mut spectator, &ClientRequest::Subscribe { code: code_a.clone() })
        .await;
    match event(recv(&mut spectator).await) {
        RoomEvent::RoomStatus(status) => {
            assert_eq!(status.code.as_str(), code_a)
        }
        other => panic!("expected room_status, got {other:?}"),
    }

    // Subscribing again moves the connection to the new room.
    send(&mut spectator, &ClientRequest::Subscribe { code: code_b.clone() })
        .await;
    match event(recv(&mut spectator).await) {
        RoomEvent::RoomStatus(status) => {
            assert_eq!(status.code.as_str(), code_b)
        }
        other => panic!("expected room_status, got {other:?}"),
    }

    // A mutation in the old room never reaches this connection; the next
    // frames it sees come from the new room only.
    send(&mut host, &ClientRequest::Start { code: code_a }).await;
    assert!(matches!(reply(recv(&mut host).await), Reply::Ok));
    send(&mut host, &ClientRequest::Start { code: code_b.clone() }).await;
    assert!(matches!(reply(recv(&mut host).await), Reply::Ok));

    assert!(matches!(
        event(recv(&mut spectator).await),
        RoomEvent::GameStarted
    ));
    match event(recv(&mut spectator).await) {
        RoomEvent::RoomStatus(status) => {
            assert_eq!(status.code.as_str(), code_b);
            assert!(status.started);
        }
        other => panic!("expected room_status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subscriber_disconnect_does_not_break_room() {
    let addr = start().await;
    let mut host = connect(&addr).await;
    let code = create_test_room(&mut host).await;

    let mut spectator = connect(&addr).await;
    send(&mut spectator, &ClientRequest::Subscribe { code: code.clone() })
        .await;
    let _ = recv(&mut spectator).await;
    drop(spectator);

    // Room operations keep working after the subscriber vanished.
    send(&mut host, &ClientRequest::Start { code: code.clone() }).await;
    assert!(matches!(reply(recv(&mut host).await), Reply::Ok));
    send(&mut host, &ClientRequest::GetStatus { code }).await;
    match reply(recv(&mut host).await) {
        Reply::Status(status) => assert!(status.started),
        other => panic!("expected status, got {other:?}"),
    }
}
