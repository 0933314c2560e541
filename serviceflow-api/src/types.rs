//! Raw REST payload shapes.
//!
//! These mirror what the backend actually sends, including its quirks:
//! ids and positions arrive as JSON numbers in some payloads and as
//! strings in others, and nested objects may be missing entirely on
//! malformed rows. Everything here is loosely typed on purpose; the
//! strict types live in `serviceflow-core` and are produced by
//! [`crate::transform`].

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A backend identifier that may arrive as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericId {
    Int(i64),
    Str(String),
}

impl NumericId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumericId::Int(n) => Some(*n),
            NumericId::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|n| usize::try_from(n).ok())
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericId::Int(n) => write!(f, "{}", n),
            NumericId::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCustomer {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub preferred_contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVehicle {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<NumericId>,
    #[serde(default)]
    pub vin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawService {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// One service request as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<NumericId>,
    #[serde(default)]
    pub customer: Option<RawCustomer>,
    #[serde(default)]
    pub vehicle: Option<RawVehicle>,
    #[serde(default)]
    pub services: Vec<RawService>,
    #[serde(default)]
    pub comments: Vec<RawComment>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub workflow_column: Option<String>,
    #[serde(default)]
    pub workflow_position: Option<NumericId>,
    #[serde(default)]
    pub workflow_history: Option<JsonValue>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub after_hours_dropoff: Option<bool>,
}

/// Full board snapshot as returned by the board-state endpoint and carried
/// inside `workflow_update` push events.
///
/// Column entries stay as raw JSON values so a single structurally invalid
/// row can be dropped during normalization without rejecting the rest of
/// the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBoardSnapshot {
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order: Option<Vec<String>>,
}

/// Body of the move-card request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCardRequest {
    pub to_column: serviceflow_core::WorkflowStage,
    pub position: usize,
}

/// Error body the backend attaches to rejected requests. Field naming is
/// inconsistent across endpoints, so both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The human-readable text to surface, if the body carried one.
    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}
