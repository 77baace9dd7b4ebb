//! The registry actor: one Tokio task that owns the [`RoomRegistry`].
//!
//! Connection handlers never touch rooms directly. They send commands
//! through a [`RegistryHandle`]; the actor applies them one at a time, in
//! arrival order, and pushes the resulting events into each player's
//! outbound channel. Two connections racing on the same room are simply
//! two commands in the queue.

use std::collections::HashMap;

use hush_protocol::{Action, Event, PlayerId, RoomSummary};
use tokio::sync::{mpsc, oneshot};

use crate::{Delivery, GameError, RoomRegistry};

/// Default depth of the command queue.
pub const DEFAULT_CHANNEL_SIZE: usize = 256;

/// Channel sender for delivering events to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<Event>;

/// Commands sent to the registry actor.
pub(crate) enum RegistryCommand {
    /// Register the outbound channel for a newly handshaken player.
    Connect {
        player_id: PlayerId,
        sender: PlayerSender,
    },

    /// Apply a game action on the player's behalf.
    Action { player_id: PlayerId, action: Action },

    /// The connection is gone: leave any room and forget the channel.
    Disconnect { player_id: PlayerId },

    ListRooms {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },

    Shutdown,
}

/// Handle to the running registry actor. Cheap to clone.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Registers where events for `player_id` should go.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        self.send(RegistryCommand::Connect { player_id, sender }).await
    }

    /// Queues an action. Outcomes (including rejections) arrive on the
    /// player's event channel.
    pub async fn submit(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<(), GameError> {
        self.send(RegistryCommand::Action { player_id, action }).await
    }

    /// Removes the player from their room, if any, and drops their channel.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), GameError> {
        self.send(RegistryCommand::Disconnect { player_id }).await
    }

    /// Summaries of every live room, in no particular order.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::ListRooms { reply }).await?;
        rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Stops the actor once the commands already queued are processed.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(RegistryCommand::Shutdown).await
    }

    async fn send(&self, cmd: RegistryCommand) -> Result<(), GameError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| GameError::Unavailable)
    }
}

struct RegistryActor {
    registry: RoomRegistry,
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RegistryActor {
    async fn run(mut self) {
        tracing::info!("registry actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RegistryCommand::Connect { player_id, sender } => {
                    self.senders.insert(player_id, sender);
                }
                RegistryCommand::Action { player_id, action } => {
                    self.handle_action(player_id, action);
                }
                RegistryCommand::Disconnect { player_id } => {
                    self.handle_disconnect(player_id);
                }
                RegistryCommand::ListRooms { reply } => {
                    let _ = reply.send(self.registry.list_summaries().collect());
                }
                RegistryCommand::Shutdown => {
                    tracing::info!(rooms = self.registry.room_count(), "registry shutting down");
                    break;
                }
            }
        }

        tracing::info!("registry actor stopped");
    }

    fn handle_action(&mut self, player_id: PlayerId, action: Action) {
        let name = action.name();
        match self.registry.apply(player_id, action) {
            Ok(deliveries) => self.dispatch(deliveries),
            Err(err) => {
                tracing::debug!(%player_id, action = name, error = %err, "action rejected");
                if let Some(reason) = err.reason() {
                    self.send_to(player_id, Event::Rejected { reason });
                }
            }
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        self.senders.remove(&player_id);
        if let Some((room_id, deliveries)) = self.registry.leave(player_id) {
            tracing::debug!(%player_id, %room_id, "disconnected player removed from room");
            self.dispatch(deliveries);
        }
    }

    fn dispatch(&self, deliveries: Vec<Delivery>) {
        for Delivery { to, event } in deliveries {
            self.send_to(to, event);
        }
    }

    /// Drops the event if the player's connection is already gone.
    fn send_to(&self, player_id: PlayerId, event: Event) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns the registry actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it's full.
pub fn spawn_registry(registry: RoomRegistry, channel_size: usize) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RegistryActor {
        registry,
        senders: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RegistryHandle { sender: tx }
}
