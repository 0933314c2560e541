//! ServiceFLOW API - Wire Contract
//!
//! Raw payload shapes for the board REST endpoints, the inbound push-event
//! union, and the normalization layer that turns loosely-typed payloads
//! into `serviceflow-core` values.

pub mod events;
pub mod transform;
pub mod types;

pub use events::BoardEvent;
pub use transform::{normalize_card, normalize_snapshot, snapshot_from_board, TransformError};
pub use types::{
    ApiErrorBody, MoveCardRequest, NumericId, RawBoardSnapshot, RawCard, RawCustomer, RawUser,
    RawVehicle,
};
