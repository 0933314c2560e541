//! Error types for board operations.

use crate::card::CardId;
use thiserror::Error;

/// Board structure errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Card {id} is already on the board")]
    DuplicateCard { id: CardId },

    #[error("Unknown workflow stage: {name}")]
    UnknownStage { name: String },

    #[error("Card {id} is listed in a lane but missing from the card table")]
    DanglingCardRef { id: CardId },

    #[error("Card {id} is in the card table but not listed in any lane")]
    UnlistedCard { id: CardId },

    #[error("Card {id} is listed in more than one lane")]
    MultiplePlacement { id: CardId },

    #[error("Column order mismatch: {reason}")]
    ColumnOrderMismatch { reason: String },
}
