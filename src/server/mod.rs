// Server module: room actors, subscriber fan-out, and the registry.

pub mod actor;
pub mod hub;
pub mod registry;
pub mod room_log;

pub use actor::{JoinAccepted, RoomHandle, RoomInspection};
pub use hub::{EventFrame, SubscriberHub, SubscriberId, Subscription};
pub use registry::{RoomCreated, RoomRegistry};
pub use room_log::{RoomLog, RoomLogEntry};
