//! Push-channel event types.
//!
//! Every inbound message on the live update channel decodes into one
//! `BoardEvent`, consumed by a single dispatch function in the client.
//! Unknown message types decode to `Unknown` and are dropped with a
//! warning rather than failing the channel.

use crate::types::{NumericId, RawBoardSnapshot};
use serde::{Deserialize, Serialize};

/// Inbound message union for one board namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// Full-board replacement pushed after any server-side mutation.
    WorkflowUpdate { data: RawBoardSnapshot },

    /// Lightweight acknowledgment of a single card move.
    ///
    /// `success: false` is a move rejection; `message` carries the reason.
    CardMoved {
        success: bool,
        #[serde(default)]
        card_id: Option<NumericId>,
        #[serde(default)]
        new_column: Option<String>,
        #[serde(default)]
        position: Option<NumericId>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Heartbeat reply; carries nothing.
    Pong,

    /// Any message type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl BoardEvent {
    /// Get the event type as a string for logging/debugging.
    pub fn event_type(&self) -> &'static str {
        match self {
            BoardEvent::WorkflowUpdate { .. } => "workflow_update",
            BoardEvent::CardMoved { .. } => "card_moved",
            BoardEvent::Pong => "pong",
            BoardEvent::Unknown => "unknown",
        }
    }

    /// Whether applying this event can change the board.
    pub fn mutates_board(&self) -> bool {
        matches!(
            self,
            BoardEvent::WorkflowUpdate { .. } | BoardEvent::CardMoved { .. }
        )
    }
}
