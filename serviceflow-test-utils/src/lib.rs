//! ServiceFLOW Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - Proptest generators for stages, cards, and whole boards
//! - Raw-payload fixtures shaped like the backend's JSON

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use serviceflow_core::{
    Board, Card, CardId, Comment, CommentAuthor, Customer, Label, ServiceItem, Vehicle,
    WorkflowStage,
};

/// A deterministic, fully-populated card for fixture-style tests.
pub fn sample_card(id: &str) -> Card {
    Card {
        id: CardId::new(id),
        customer: Customer {
            id: Some(3),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: Some("555-0199".to_string()),
            preferred_contact: Some("email".to_string()),
        },
        vehicle: Vehicle {
            id: Some(7),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: Some(2021),
            vin: Some("2HGFC2F59MH000000".to_string()),
        },
        services: vec![ServiceItem {
            id: Some(11),
            service_type: "Brake Inspection".to_string(),
            description: Some("squealing on braking".to_string()),
            urgency: Some("high".to_string()),
            price: Some("89.00".to_string()),
        }],
        labels: vec![Label {
            id: Some(1),
            name: "warranty".to_string(),
            color: Some("green".to_string()),
        }],
        comments: vec![Comment {
            id: Some(21),
            author: CommentAuthor {
                first_name: "Pat".to_string(),
                last_name: "Wrench".to_string(),
            },
            text: "parts ordered".to_string(),
            created_at: Some("2024-06-01T10:00:00Z".to_string()),
        }],
        status: Some("approved".to_string()),
        created_at: Some("2024-05-30T09:00:00Z".to_string()),
        updated_at: Some("2024-06-01T10:00:00Z".to_string()),
        appointment_date: Some("2024-06-03".to_string()),
        appointment_time: Some("08:30".to_string()),
        after_hours_dropoff: Some(false),
        workflow_history: None,
    }
}

/// The backend's JSON shape for one card, nested `customer.user` included.
pub fn raw_entry(id: &str) -> JsonValue {
    json!({
        "id": id,
        "customer": {
            "id": 3,
            "user": {
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com"
            },
            "phone_number": "555-0199",
            "preferred_contact": "email"
        },
        "vehicle": {
            "id": 7,
            "make": "Honda",
            "model": "Civic",
            "year": 2021,
            "vin": "2HGFC2F59MH000000"
        },
        "services": [],
        "comments": [],
        "labels": [],
        "status": "approved",
        "workflow_column": "estimates",
        "workflow_position": 0
    })
}

/// Raw snapshot JSON with the given ids per column name.
pub fn raw_snapshot(columns: &[(&str, &[&str])]) -> JsonValue {
    let mut map = serde_json::Map::new();
    for (name, ids) in columns {
        let entries: Vec<JsonValue> = ids.iter().map(|id| raw_entry(id)).collect();
        map.insert((*name).to_string(), JsonValue::Array(entries));
    }
    json!({ "columns": map })
}

pub fn stage_strategy() -> impl Strategy<Value = WorkflowStage> {
    prop_oneof![
        Just(WorkflowStage::Estimates),
        Just(WorkflowStage::InProgress),
        Just(WorkflowStage::WaitingParts),
        Just(WorkflowStage::Completed),
    ]
}

/// A card with the given id and lightly varied payload.
pub fn card_strategy(id: String) -> impl Strategy<Value = Card> {
    (
        "[A-Z][a-z]{2,8}",
        "[A-Z][a-z]{2,8}",
        proptest::option::of("[0-9]{3}-[0-9]{4}"),
        proptest::option::of(1990i64..2026),
    )
        .prop_map(move |(first_name, make, phone, year)| {
            let mut card = sample_card(&id);
            card.customer.first_name = first_name;
            card.customer.phone = phone;
            card.vehicle.make = make;
            card.vehicle.year = year;
            card
        })
}

/// A structurally valid board: up to `max_cards` cards with unique ids,
/// distributed over all stages.
pub fn board_strategy(max_cards: usize) -> impl Strategy<Value = Board> {
    let row = (
        stage_strategy(),
        "[A-Z][a-z]{2,8}",
        proptest::option::of("[0-9]{3}-[0-9]{4}"),
        proptest::option::of(1990i64..2026),
    );
    proptest::collection::vec(row, 0..=max_cards).prop_map(|rows| {
        let mut board = Board::new(WorkflowStage::ALL);
        for (index, (stage, first_name, phone, year)) in rows.into_iter().enumerate() {
            let mut card = sample_card(&format!("card-{}", index));
            card.customer.first_name = first_name;
            card.customer.phone = phone;
            card.vehicle.year = year;
            board
                .insert_card(stage, card)
                .expect("generated ids are unique");
        }
        board
    })
}
