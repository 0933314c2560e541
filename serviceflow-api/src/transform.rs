//! Payload normalization.
//!
//! The backend's board payloads are loosely typed; this module converts
//! them into `serviceflow-core` values, flattening the nested
//! `customer.user` object into the card's top-level customer fields so
//! rendering code sees one stable shape. Conversion is per-entry: a
//! structurally invalid row is dropped with a logged warning and the rest
//! of the snapshot survives.

use crate::types::{
    RawBoardSnapshot, RawCard, RawComment, RawCustomer, RawLabel, RawService, RawUser, RawVehicle,
};
use serde_json::Value as JsonValue;
use serviceflow_core::{
    Board, Card, CardId, Comment, CommentAuthor, Customer, Label, ServiceItem, Vehicle,
    WorkflowStage,
};
use thiserror::Error;
use tracing::warn;

/// Why one board entry could not be normalized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: &'static str },

    #[error("Entry failed to deserialize: {reason}")]
    Malformed { reason: String },
}

/// A snapshot after normalization, with the count of rows that had to be
/// dropped on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSnapshot {
    pub board: Board,
    pub dropped: usize,
}

/// Convert one raw card into its normalized form.
///
/// The card id, the customer (with its nested user), and the vehicle are
/// required; everything else degrades to empty defaults.
pub fn normalize_card(raw: RawCard) -> Result<Card, TransformError> {
    let id = raw
        .id
        .ok_or(TransformError::RequiredFieldMissing { field: "id" })?;
    let customer = raw
        .customer
        .ok_or(TransformError::RequiredFieldMissing { field: "customer" })?;
    let user = customer
        .user
        .ok_or(TransformError::RequiredFieldMissing {
            field: "customer.user",
        })?;
    let vehicle = raw
        .vehicle
        .ok_or(TransformError::RequiredFieldMissing { field: "vehicle" })?;

    Ok(Card {
        id: CardId::new(id.to_string()),
        customer: Customer {
            id: customer.id.and_then(|id| id.as_i64()),
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            phone: customer.phone_number,
            preferred_contact: customer.preferred_contact,
        },
        vehicle: Vehicle {
            id: vehicle.id.and_then(|id| id.as_i64()),
            make: vehicle.make.unwrap_or_default(),
            model: vehicle.model.unwrap_or_default(),
            year: vehicle.year.and_then(|year| year.as_i64()),
            vin: vehicle.vin,
        },
        services: raw
            .services
            .into_iter()
            .map(|service| ServiceItem {
                id: service.id.and_then(|id| id.as_i64()),
                service_type: service.service_type.unwrap_or_default(),
                description: service.description,
                urgency: service.urgency,
                price: service.price,
            })
            .collect(),
        labels: raw
            .labels
            .into_iter()
            .map(|label| Label {
                id: label.id.and_then(|id| id.as_i64()),
                name: label.name.unwrap_or_default(),
                color: label.color,
            })
            .collect(),
        comments: raw
            .comments
            .into_iter()
            .map(|comment| {
                let author = comment.user.unwrap_or_default();
                Comment {
                    id: comment.id.and_then(|id| id.as_i64()),
                    author: CommentAuthor {
                        first_name: author.first_name.unwrap_or_default(),
                        last_name: author.last_name.unwrap_or_default(),
                    },
                    text: comment.text.unwrap_or_default(),
                    created_at: comment.created_at,
                }
            })
            .collect(),
        status: raw.status,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        appointment_date: raw.appointment_date,
        appointment_time: raw.appointment_time,
        after_hours_dropoff: raw.after_hours_dropoff,
        workflow_history: raw.workflow_history,
    })
}

/// Build a [`Board`] from a raw snapshot.
///
/// Invalid rows, rows under unknown column names, and rows whose id
/// duplicates an earlier row are dropped with one warning each; the rest
/// of the snapshot is kept. `column_order` falls back to the column
/// mapping's own key order when the payload omits it.
pub fn normalize_snapshot(raw: &RawBoardSnapshot) -> NormalizedSnapshot {
    let order: Vec<WorkflowStage> = match &raw.column_order {
        Some(names) => names
            .iter()
            .filter_map(|name| match name.parse::<WorkflowStage>() {
                Ok(stage) => Some(stage),
                Err(_) => {
                    warn!(column = %name, "ignoring unknown column in column_order");
                    None
                }
            })
            .collect(),
        None => raw
            .columns
            .keys()
            .filter_map(|name| name.parse::<WorkflowStage>().ok())
            .collect(),
    };

    let mut board = Board::new(order);
    let mut dropped = 0usize;

    for (name, entries) in &raw.columns {
        let stage = match name.parse::<WorkflowStage>() {
            Ok(stage) => stage,
            Err(_) => {
                warn!(
                    column = %name,
                    entries = entries.len(),
                    "dropping entries under unknown column"
                );
                dropped += entries.len();
                continue;
            }
        };
        for entry in entries {
            match normalize_entry(entry) {
                Ok(card) => {
                    let id = card.id.clone();
                    if let Err(err) = board.insert_card(stage, card) {
                        warn!(card = %id, error = %err, "dropping duplicated board entry");
                        dropped += 1;
                    }
                }
                Err(err) => {
                    warn!(column = %name, error = %err, "dropping invalid board entry");
                    dropped += 1;
                }
            }
        }
    }

    NormalizedSnapshot { board, dropped }
}

fn normalize_entry(entry: &JsonValue) -> Result<Card, TransformError> {
    let raw: RawCard =
        serde_json::from_value(entry.clone()).map_err(|err| TransformError::Malformed {
            reason: err.to_string(),
        })?;
    normalize_card(raw)
}

/// Re-emit the wire shape of a board.
///
/// `workflow_column` and `workflow_position` are stamped from lane
/// membership here, at serialization time - they exist nowhere else.
pub fn snapshot_from_board(board: &Board) -> RawBoardSnapshot {
    let mut snapshot = RawBoardSnapshot {
        columns: Default::default(),
        column_order: Some(
            board
                .column_order()
                .iter()
                .map(|stage| stage.as_str().to_string())
                .collect(),
        ),
    };
    for stage in board.column_order() {
        let entries = board
            .positioned_cards(*stage)
            .map(|(position, card)| {
                serde_json::to_value(raw_from_card(card, *stage, position))
                    .unwrap_or(JsonValue::Null)
            })
            .collect();
        snapshot
            .columns
            .insert(stage.as_str().to_string(), entries);
    }
    snapshot
}

fn raw_from_card(card: &Card, stage: WorkflowStage, position: usize) -> RawCard {
    use crate::types::NumericId;

    RawCard {
        id: Some(NumericId::Str(card.id.as_str().to_string())),
        customer: Some(RawCustomer {
            id: card.customer.id.map(NumericId::Int),
            user: Some(RawUser {
                first_name: Some(card.customer.first_name.clone()),
                last_name: Some(card.customer.last_name.clone()),
                email: Some(card.customer.email.clone()),
            }),
            phone_number: card.customer.phone.clone(),
            preferred_contact: card.customer.preferred_contact.clone(),
        }),
        vehicle: Some(RawVehicle {
            id: card.vehicle.id.map(NumericId::Int),
            make: Some(card.vehicle.make.clone()),
            model: Some(card.vehicle.model.clone()),
            year: card.vehicle.year.map(NumericId::Int),
            vin: card.vehicle.vin.clone(),
        }),
        services: card
            .services
            .iter()
            .map(|service| RawService {
                id: service.id.map(NumericId::Int),
                service_type: Some(service.service_type.clone()),
                description: service.description.clone(),
                urgency: service.urgency.clone(),
                price: service.price.clone(),
            })
            .collect(),
        comments: card
            .comments
            .iter()
            .map(|comment| RawComment {
                id: comment.id.map(NumericId::Int),
                user: Some(RawUser {
                    first_name: Some(comment.author.first_name.clone()),
                    last_name: Some(comment.author.last_name.clone()),
                    email: None,
                }),
                text: Some(comment.text.clone()),
                created_at: comment.created_at.clone(),
            })
            .collect(),
        labels: card
            .labels
            .iter()
            .map(|label| RawLabel {
                id: label.id.map(NumericId::Int),
                name: Some(label.name.clone()),
                color: label.color.clone(),
            })
            .collect(),
        status: card.status.clone(),
        workflow_column: Some(stage.as_str().to_string()),
        workflow_position: Some(NumericId::Int(position as i64)),
        workflow_history: card.workflow_history.clone(),
        created_at: card.created_at.clone(),
        updated_at: card.updated_at.clone(),
        appointment_date: card.appointment_date.clone(),
        appointment_time: card.appointment_time.clone(),
        after_hours_dropoff: card.after_hours_dropoff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str) -> JsonValue {
        json!({
            "id": id,
            "customer": {
                "id": 3,
                "user": { "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" },
                "phone_number": "555-0100"
            },
            "vehicle": { "id": 9, "make": "Subaru", "model": "Outback", "year": 2019 },
            "services": [
                { "id": "5", "service_type": "Oil Change", "price": "49.99" }
            ],
            "status": "approved",
            "workflow_column": "estimates",
            "workflow_position": "0"
        })
    }

    #[test]
    fn test_normalize_flattens_nested_user() {
        let raw: RawCard = serde_json::from_value(entry("12")).unwrap();
        let card = normalize_card(raw).unwrap();
        assert_eq!(card.id, CardId::new("12"));
        assert_eq!(card.customer.first_name, "Ada");
        assert_eq!(card.customer.last_name, "Lovelace");
        assert_eq!(card.customer.email, "ada@example.com");
        assert_eq!(card.customer.phone.as_deref(), Some("555-0100"));
        assert_eq!(card.vehicle.make, "Subaru");
        assert_eq!(card.services[0].service_type, "Oil Change");
    }

    #[test]
    fn test_missing_vehicle_drops_exactly_that_entry() {
        let mut bad = entry("13");
        bad.as_object_mut().unwrap().remove("vehicle");
        let raw = RawBoardSnapshot {
            columns: [
                ("estimates".to_string(), vec![entry("12"), bad, entry("14")]),
            ]
            .into_iter()
            .collect(),
            column_order: None,
        };
        let normalized = normalize_snapshot(&raw);
        assert_eq!(normalized.dropped, 1);
        let kept: Vec<&str> = normalized
            .board
            .lane(WorkflowStage::Estimates)
            .iter()
            .map(CardId::as_str)
            .collect();
        assert_eq!(kept, vec!["12", "14"]);
    }

    #[test]
    fn test_missing_customer_user_drops_entry() {
        let mut bad = entry("13");
        bad["customer"].as_object_mut().unwrap().remove("user");
        let raw: RawCard = serde_json::from_value(bad).unwrap();
        assert_eq!(
            normalize_card(raw).unwrap_err(),
            TransformError::RequiredFieldMissing {
                field: "customer.user"
            }
        );
    }

    #[test]
    fn test_non_object_entry_is_dropped_not_fatal() {
        let raw = RawBoardSnapshot {
            columns: [("estimates".to_string(), vec![json!("garbage"), entry("12")])]
                .into_iter()
                .collect(),
            column_order: None,
        };
        let normalized = normalize_snapshot(&raw);
        assert_eq!(normalized.dropped, 1);
        assert_eq!(normalized.board.card_count(), 1);
    }

    #[test]
    fn test_unknown_column_entries_are_dropped() {
        let raw = RawBoardSnapshot {
            columns: [
                ("estimates".to_string(), vec![entry("12")]),
                ("archived".to_string(), vec![entry("13"), entry("14")]),
            ]
            .into_iter()
            .collect(),
            column_order: None,
        };
        let normalized = normalize_snapshot(&raw);
        assert_eq!(normalized.dropped, 2);
        assert_eq!(normalized.board.card_count(), 1);
    }

    #[test]
    fn test_duplicate_id_across_columns_keeps_first() {
        let raw = RawBoardSnapshot {
            columns: [
                ("estimates".to_string(), vec![entry("12")]),
                ("in_progress".to_string(), vec![entry("12")]),
            ]
            .into_iter()
            .collect(),
            column_order: None,
        };
        let normalized = normalize_snapshot(&raw);
        assert_eq!(normalized.dropped, 1);
        assert_eq!(
            normalized.board.stage_of(&CardId::new("12")),
            Some(WorkflowStage::Estimates)
        );
        normalized.board.check_invariants().unwrap();
    }

    #[test]
    fn test_column_order_preserved_from_payload() {
        let raw = RawBoardSnapshot {
            columns: [("estimates".to_string(), vec![])].into_iter().collect(),
            column_order: Some(vec![
                "completed".to_string(),
                "estimates".to_string(),
                "bogus".to_string(),
            ]),
        };
        let normalized = normalize_snapshot(&raw);
        assert_eq!(normalized.board.column_order()[0], WorkflowStage::Completed);
        assert_eq!(normalized.board.column_order()[1], WorkflowStage::Estimates);
        // Unknown name skipped, remaining stages appended canonically.
        assert_eq!(normalized.board.column_order().len(), 4);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let raw = RawBoardSnapshot {
            columns: [
                ("estimates".to_string(), vec![entry("12"), entry("14")]),
                ("in_progress".to_string(), vec![entry("9")]),
            ]
            .into_iter()
            .collect(),
            column_order: None,
        };
        let first = normalize_snapshot(&raw);
        assert_eq!(first.dropped, 0);
        let reserialized = snapshot_from_board(&first.board);
        let second = normalize_snapshot(&reserialized);
        assert_eq!(second.dropped, 0);
        assert_eq!(second.board, first.board);
    }
}
