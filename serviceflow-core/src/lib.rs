//! ServiceFLOW Core - Board Data Types
//!
//! Pure data structures for the workflow board: cards, stages, and the
//! board arena with its move semantics. No I/O and no async - the wire
//! contract and the reconciliation client live in the other crates.

pub mod board;
pub mod card;
pub mod error;
pub mod stage;

pub use board::Board;
pub use card::{Card, CardId, Comment, CommentAuthor, Customer, Label, ServiceItem, Vehicle};
pub use error::BoardError;
pub use stage::WorkflowStage;
