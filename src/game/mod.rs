// Game module: the authoritative per-room state machine.
//
// `state` holds the owned value, `transitions` the pure command rules,
// `scoring` the two scoring modes, and `projector` the wire view.

pub mod projector;
pub mod scoring;
pub mod state;
pub mod transitions;

pub use projector::project;
pub use state::{ActiveRound, Game, RoomState, COUNTDOWN_SECONDS};
pub use transitions::{EventKind, Outcome, TransitionResult};
