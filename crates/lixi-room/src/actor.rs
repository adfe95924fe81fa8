//! Room actor: an isolated Tokio task that owns one `Room`.
//!
//! Every mutation of a room flows through its actor's command channel, so
//! concurrent callers are serialized in arrival order without locks — two
//! draws against the same room can never interleave, and a status query
//! queued after a draw observes its effects. The actor also owns the
//! room's subscriber set and fans events out best-effort.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lixi_protocol::{
    PlayerId, PrizeId, Receipt, PrizeEntry, RoomCode, RoomEvent,
    StatusSnapshot,
};
use tokio::sync::{mpsc, oneshot};

use crate::{DrawOutcome, Room, RoomError, id::now_ms};

/// How often the actor pushes a `ping` keep-alive to subscribers.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Counter for subscriber handles across all rooms.
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Channel end a subscriber receives room events on.
pub type Subscriber = mpsc::UnboundedSender<RoomEvent>;

/// Handle identifying one live subscriber, for unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a successful join returns to the caller.
#[derive(Debug, Clone)]
pub struct JoinReply {
    pub player_id: PlayerId,
    pub player_name: String,
    pub room: StatusSnapshot,
}

/// What a successful draw returns to the caller.
#[derive(Debug, Clone)]
pub struct DrawReply {
    pub prize: PrizeEntry,
    pub prize_text: String,
    pub receipts: Vec<Receipt>,
}

/// Commands sent to a room actor through its channel. Variants carrying a
/// `oneshot::Sender` are request/reply; the rest are fire-and-forget.
pub(crate) enum RoomCommand {
    Join {
        name: String,
        reply: oneshot::Sender<Result<JoinReply, RoomError>>,
    },
    Start {
        reply: oneshot::Sender<()>,
    },
    End {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<StatusSnapshot>,
    },
    AddCash {
        label: Option<String>,
        amount: u64,
        qty: u32,
        reply: oneshot::Sender<Result<StatusSnapshot, RoomError>>,
    },
    AddTroll {
        label: String,
        qty: u32,
        reply: oneshot::Sender<Result<StatusSnapshot, RoomError>>,
    },
    SetPrizeQty {
        prize_id: PrizeId,
        qty: u32,
        reply: oneshot::Sender<Result<StatusSnapshot, RoomError>>,
    },
    RemovePrize {
        prize_id: PrizeId,
        reply: oneshot::Sender<StatusSnapshot>,
    },
    Draw {
        player_id: PlayerId,
        effort: f64,
        reply: oneshot::Sender<Result<DrawReply, RoomError>>,
    },
    Subscribe {
        sender: Subscriber,
        reply: oneshot::Sender<SubscriberId>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
}

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper plus the room code for error reporting.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    pub async fn join(&self, name: String) -> Result<JoinReply, RoomError> {
        self.request(|reply| RoomCommand::Join { name, reply }).await?
    }

    pub async fn start(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await
    }

    pub async fn end(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::End { reply }).await
    }

    pub async fn status(&self) -> Result<StatusSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Status { reply }).await
    }

    pub async fn add_cash_prize(
        &self,
        label: Option<String>,
        amount: u64,
        qty: u32,
    ) -> Result<StatusSnapshot, RoomError> {
        self.request(|reply| RoomCommand::AddCash { label, amount, qty, reply })
            .await?
    }

    pub async fn add_troll_prize(
        &self,
        label: String,
        qty: u32,
    ) -> Result<StatusSnapshot, RoomError> {
        self.request(|reply| RoomCommand::AddTroll { label, qty, reply })
            .await?
    }

    pub async fn set_prize_qty(
        &self,
        prize_id: PrizeId,
        qty: u32,
    ) -> Result<StatusSnapshot, RoomError> {
        self.request(|reply| RoomCommand::SetPrizeQty { prize_id, qty, reply })
            .await?
    }

    pub async fn remove_prize(
        &self,
        prize_id: PrizeId,
    ) -> Result<StatusSnapshot, RoomError> {
        self.request(|reply| RoomCommand::RemovePrize { prize_id, reply })
            .await
    }

    pub async fn draw(
        &self,
        player_id: PlayerId,
        effort: f64,
    ) -> Result<DrawReply, RoomError> {
        self.request(|reply| RoomCommand::Draw { player_id, effort, reply })
            .await?
    }

    /// Registers a live subscriber. The actor immediately pushes a
    /// `room_status` snapshot to the new channel, before any later event.
    pub async fn subscribe(&self, sender: Subscriber) -> Result<SubscriberId, RoomError> {
        self.request(|reply| RoomCommand::Subscribe { sender, reply }).await
    }

    /// Deregisters a subscriber. Safe to call after the actor is gone or
    /// with an id that was already pruned.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        let _ = self.sender.send(RoomCommand::Unsubscribe { id }).await;
    }
}

/// The internal actor state. Runs inside a Tokio task for the lifetime of
/// the process (rooms are never destroyed; this is a live-event tool).
struct RoomActor {
    room: Room,
    subscribers: HashMap<SubscriberId, Subscriber>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.room.code(), "room actor started");
        let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
        keepalive.set_missed_tick_behavior(
            tokio::time::MissedTickBehavior::Delay,
        );
        // The first tick fires immediately; swallow it.
        keepalive.tick().await;

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = keepalive.tick() => {
                    self.publish(RoomEvent::Ping { t: now_ms() });
                }
            }
        }

        tracing::info!(room = %self.room.code(), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { name, reply } => {
                let result = self.room.join(&name).map(|p| {
                    (p.id.clone(), p.name.clone())
                });
                match result {
                    Ok((id, name)) => {
                        tracing::info!(
                            room = %self.room.code(),
                            player = %id,
                            "player joined"
                        );
                        self.publish(RoomEvent::PlayerJoined {
                            id: id.clone(),
                            name: name.clone(),
                        });
                        self.publish_status();
                        let _ = reply.send(Ok(JoinReply {
                            player_id: id,
                            player_name: name,
                            room: self.room.status(),
                        }));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            RoomCommand::Start { reply } => {
                self.room.start();
                tracing::info!(room = %self.room.code(), "game started");
                self.publish(RoomEvent::GameStarted);
                self.publish_status();
                let _ = reply.send(());
            }

            RoomCommand::End { reply } => {
                self.room.end();
                tracing::info!(room = %self.room.code(), "game ended");
                self.publish(RoomEvent::GameEnded);
                self.publish_status();
                let _ = reply.send(());
            }

            RoomCommand::Status { reply } => {
                let _ = reply.send(self.room.status());
            }

            RoomCommand::AddCash { label, amount, qty, reply } => {
                let result = self
                    .room
                    .pool_mut()
                    .add_cash(label, amount, qty)
                    .map(|_| ());
                let _ = reply.send(self.after_pool_edit(result));
            }

            RoomCommand::AddTroll { label, qty, reply } => {
                let result =
                    self.room.pool_mut().add_troll(&label, qty).map(|_| ());
                let _ = reply.send(self.after_pool_edit(result));
            }

            RoomCommand::SetPrizeQty { prize_id, qty, reply } => {
                let result = self.room.pool_mut().set_remaining(&prize_id, qty);
                let _ = reply.send(self.after_pool_edit(result));
            }

            RoomCommand::RemovePrize { prize_id, reply } => {
                self.room.pool_mut().remove(&prize_id);
                self.publish(RoomEvent::PrizePoolUpdated(
                    self.room.pool().entries().to_vec(),
                ));
                self.publish_status();
                let _ = reply.send(self.room.status());
            }

            RoomCommand::Draw { player_id, effort, reply } => {
                let result =
                    self.room.draw(&player_id, effort, &mut rand::rng());
                match result {
                    Ok(outcome) => {
                        self.publish_draw(&outcome);
                        let _ = reply.send(Ok(DrawReply {
                            prize: outcome.prize,
                            prize_text: outcome.prize_text,
                            receipts: outcome.receipts,
                        }));
                    }
                    Err(e) => {
                        tracing::debug!(
                            room = %self.room.code(),
                            player = %player_id,
                            code = e.code(),
                            "draw rejected"
                        );
                        let _ = reply.send(Err(e));
                    }
                }
            }

            RoomCommand::Subscribe { sender, reply } => {
                let id = SubscriberId::next();
                // Initial snapshot goes only to the new subscriber and is
                // guaranteed to precede any event it will ever see.
                let _ = sender.send(RoomEvent::RoomStatus(self.room.status()));
                self.subscribers.insert(id, sender);
                tracing::debug!(
                    room = %self.room.code(),
                    subscriber = %id,
                    total = self.subscribers.len(),
                    "subscriber attached"
                );
                let _ = reply.send(id);
            }

            RoomCommand::Unsubscribe { id } => {
                if self.subscribers.remove(&id).is_some() {
                    tracing::debug!(
                        room = %self.room.code(),
                        subscriber = %id,
                        total = self.subscribers.len(),
                        "subscriber detached"
                    );
                }
            }
        }
    }

    /// On success, publishes the pool event plus a status push and builds
    /// the reply snapshot; on failure, passes the error straight through.
    fn after_pool_edit(
        &mut self,
        result: Result<(), RoomError>,
    ) -> Result<StatusSnapshot, RoomError> {
        result?;
        self.publish(RoomEvent::PrizePoolUpdated(
            self.room.pool().entries().to_vec(),
        ));
        self.publish_status();
        Ok(self.room.status())
    }

    fn publish_draw(&mut self, outcome: &DrawOutcome) {
        self.publish(RoomEvent::PrizeWon {
            player_id: outcome.winner.player_id.clone(),
            player_name: outcome.player_name.clone(),
            prize: outcome.prize.clone(),
            prize_text: outcome.prize_text.clone(),
        });
        self.publish(RoomEvent::WinnerAdded(outcome.winner.clone()));
        self.publish_status();
    }

    fn publish_status(&mut self) {
        self.publish(RoomEvent::RoomStatus(self.room.status()));
    }

    /// Best-effort fan-out: a closed subscriber is pruned and never
    /// affects delivery to the others or the triggering mutation.
    fn publish(&mut self, event: RoomEvent) {
        self.subscribers
            .retain(|id, sub| match sub.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(subscriber = %id, "dropping dead subscriber");
                    false
                }
            });
    }
}

/// Spawns the actor task for a room and returns its handle.
///
/// `channel_size` bounds the command queue; senders wait when it fills,
/// which backpressures a flood of requests against one room.
pub(crate) fn spawn_room(room: Room, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code().clone();

    let actor = RoomActor {
        room,
        subscribers: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
