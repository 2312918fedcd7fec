//! Per-room subscriber hub.
//!
//! Events are serialized once per broadcast and shared across subscribers
//! as cheaply cloneable UTF-8 frames. Each subscriber gets a bounded
//! outbound buffer; one that falls behind is dropped from the hub and the
//! caller is told how many were evicted so it can announce fresh presence.

use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use smallvec::SmallVec;
use tokio::sync::mpsc;

use crate::protocol::events::RoomEvent;

/// Identifies one push stream within a room.
pub type SubscriberId = u64;

/// A serialized event ready to write to a socket.
pub type EventFrame = Utf8Bytes;

/// Receiving side of a subscription, handed to the WebSocket task.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<EventFrame>,
}

/// The set of live push channels for one room. Owned by the room actor;
/// no lock, no sharing.
pub struct SubscriberHub {
    next_id: SubscriberId,
    buffer: usize,
    senders: HashMap<SubscriberId, mpsc::Sender<EventFrame>>,
}

impl SubscriberHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            next_id: 0,
            // Room for the connected + snapshot greeting at minimum.
            buffer: buffer.max(2),
            senders: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Register a new push stream.
    pub fn subscribe(&mut self) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = mpsc::channel(self.buffer);
        self.senders.insert(id, tx);
        Subscription { id, receiver: rx }
    }

    /// Drop a subscription. Returns whether it was present.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        self.senders.remove(&id).is_some()
    }

    /// Send an event to a single subscriber. Returns false (and evicts the
    /// subscriber) if its buffer is full or its channel is closed.
    pub fn send_to(&mut self, id: SubscriberId, event: &RoomEvent) -> bool {
        let Some(frame) = encode(event) else {
            return true;
        };
        let Some(sender) = self.senders.get(&id) else {
            return false;
        };
        if sender.try_send(frame).is_err() {
            self.senders.remove(&id);
            return false;
        }
        true
    }

    /// Fan an event out to every subscriber. Returns the number of slow or
    /// closed subscribers that were evicted.
    pub fn broadcast(&mut self, event: &RoomEvent) -> usize {
        if self.senders.is_empty() {
            return 0;
        }
        let Some(frame) = encode(event) else {
            return 0;
        };

        let mut stale: SmallVec<[SubscriberId; 8]> = SmallVec::new();
        for (id, sender) in &self.senders {
            if sender.try_send(frame.clone()).is_err() {
                stale.push(*id);
            }
        }
        for id in &stale {
            self.senders.remove(id);
            tracing::warn!(subscriber_id = *id, "dropped slow subscriber");
        }
        stale.len()
    }
}

fn encode(event: &RoomEvent) -> Option<EventFrame> {
    match serde_json::to_string(event) {
        Ok(json) => Some(EventFrame::from(json)),
        Err(err) => {
            tracing::error!(kind = event.kind(), error = %err, "failed to serialize event");
            None
        }
    }
}
