//! Card identity and display payload types.
//!
//! A card is one service request. The reconciliation logic only cares about
//! its identity; the rest of the payload (customer, vehicle, services,
//! labels, comments) is carried through unchanged for rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable card identifier, assigned by the backend.
///
/// The wire sometimes carries it as a JSON number and sometimes as a
/// string; it is normalized to its string form on ingest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for CardId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Customer contact details with the nested user object already flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub preferred_contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Option<i64>,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub vin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: Option<i64>,
    pub service_type: String,
    pub description: Option<String>,
    pub urgency: Option<String>,
    /// Decimal price as serialized by the backend; never computed on.
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub author: CommentAuthor,
    pub text: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
}

/// One service request as displayed on the board.
///
/// Note the absence of `column`/`position` fields: a card's placement is
/// derived from lane membership on the [`Board`](crate::Board), never
/// stored on the card itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub customer: Customer,
    pub vehicle: Vehicle,
    #[serde(default)]
    pub services: Vec<ServiceItem>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub after_hours_dropoff: Option<bool>,
    /// Opaque history blob, passed through for the detail view.
    pub workflow_history: Option<serde_json::Value>,
}
