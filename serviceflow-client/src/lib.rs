//! ServiceFLOW board reconciliation client.
//!
//! Ties together the three halves of the workflow board: the in-memory
//! board session (authoritative local state), the live update channel
//! with reconnect and fallback polling, and the optimistic move
//! coordinator that keeps drags responsive while the backend confirms.

pub mod api_client;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod notifications;
pub mod realtime;
pub mod session;

pub use controller::BoardController;
pub use coordinator::{CardDrop, DropTarget, MoveCoordinator, MoveOutcome};
pub use error::ClientError;
pub use session::{BoardSession, ConnectionState, FollowUp, SessionPhase, UpdateGate};
