//! Optimistic move coordination.
//!
//! One drop gesture becomes: local board mutation (synchronous, so the
//! user sees the move immediately), then a remote move request, then
//! confirm or refetch. Moves are single-flight: while one remote call is
//! outstanding, further drops are refused with [`MoveOutcome::Busy`] so
//! the UI can disable dragging instead of racing two moves.

use serviceflow_api::types::{MoveCardRequest, NumericId};
use serviceflow_core::{Board, CardId, WorkflowStage};

/// What the drop gesture landed on inside the target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Dropped onto an existing card; the moved card takes its index.
    Card(CardId),
    /// Dropped onto the column itself (its placeholder or trailing space).
    ColumnEnd,
}

/// A completed drag gesture, already resolved to typed stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDrop {
    pub card_id: CardId,
    pub from: WorkflowStage,
    pub to: WorkflowStage,
    pub target: DropTarget,
}

/// Result of offering a drop to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Optimistic state applied; the caller must now issue `request` and
    /// report back via `confirm`/`fail`.
    Applied {
        board: Board,
        card_id: CardId,
        request: MoveCardRequest,
    },
    /// Nothing to do (same position, or the card is already gone).
    NoOp,
    /// A previous move is still in flight.
    Busy,
    /// The move violates a workflow rule; nothing was applied.
    Rejected { reason: String },
}

/// The move the coordinator is waiting on the backend to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightMove {
    pub card_id: CardId,
    pub to: WorkflowStage,
    pub position: usize,
}

/// Per-session move state machine: idle -> in flight -> idle.
#[derive(Debug, Default)]
pub struct MoveCoordinator {
    in_flight: Option<InFlightMove>,
}

impl MoveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    pub fn in_flight(&self) -> Option<&InFlightMove> {
        self.in_flight.as_ref()
    }

    /// Resolve a drop against the current board and, if it is a real
    /// move, apply it optimistically.
    pub fn begin(&mut self, board: &Board, drop: CardDrop) -> MoveOutcome {
        if self.in_flight.is_some() {
            return MoveOutcome::Busy;
        }
        if drop.from.is_terminal() && drop.to != drop.from {
            return MoveOutcome::Rejected {
                reason: "Cards cannot be moved out of the completed column".to_string(),
            };
        }

        let source = board.lane(drop.from);
        let Some(current_index) = source.iter().position(|id| *id == drop.card_id) else {
            // A newer snapshot already relocated the card; stale gesture.
            return MoveOutcome::NoOp;
        };

        let destination = board.lane(drop.to);
        let requested = match &drop.target {
            DropTarget::Card(over) => destination
                .iter()
                .position(|id| id == over)
                .unwrap_or(destination.len()),
            DropTarget::ColumnEnd => destination.len(),
        };

        // Final index after removal/clamping, also what the backend is told.
        let position = if drop.from == drop.to {
            requested.min(source.len().saturating_sub(1))
        } else {
            requested.min(destination.len())
        };

        if drop.from == drop.to && position == current_index {
            return MoveOutcome::NoOp;
        }

        let next = board.move_card(&drop.card_id, drop.from, drop.to, position);
        self.in_flight = Some(InFlightMove {
            card_id: drop.card_id.clone(),
            to: drop.to,
            position,
        });
        MoveOutcome::Applied {
            board: next,
            card_id: drop.card_id,
            request: MoveCardRequest {
                to_column: drop.to,
                position,
            },
        }
    }

    /// The backend accepted the move; the optimistic state was right.
    pub fn confirm(&mut self) -> Option<InFlightMove> {
        self.in_flight.take()
    }

    /// The backend rejected the move; the caller refetches the snapshot.
    pub fn fail(&mut self) -> Option<InFlightMove> {
        self.in_flight.take()
    }

    /// Whether a `card_moved` acknowledgment matches the in-flight move
    /// (i.e. is the echo of our own request rather than a foreign move).
    pub fn matches_ack(
        &self,
        card_id: Option<&NumericId>,
        new_column: Option<&str>,
        position: Option<usize>,
    ) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return false;
        };
        let Some(card_id) = card_id else {
            return false;
        };
        if card_id.to_string() != in_flight.card_id.as_str() {
            return false;
        }
        if let Some(column) = new_column {
            if column != in_flight.to.as_str() {
                return false;
            }
        }
        if let Some(position) = position {
            if position != in_flight.position {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serviceflow_test_utils::sample_card;

    fn board_with(lanes: &[(WorkflowStage, &[&str])]) -> Board {
        let mut board = Board::new(WorkflowStage::ALL);
        for (stage, ids) in lanes {
            for id in *ids {
                board.insert_card(*stage, sample_card(id)).unwrap();
            }
        }
        board
    }

    fn drop_on_card(card: &str, from: WorkflowStage, to: WorkflowStage, over: &str) -> CardDrop {
        CardDrop {
            card_id: CardId::new(card),
            from,
            to,
            target: DropTarget::Card(CardId::new(over)),
        }
    }

    #[test]
    fn test_cross_column_drop_applies_and_requests() {
        let board = board_with(&[
            (WorkflowStage::Estimates, &["c7", "c3"]),
            (WorkflowStage::InProgress, &["c9"]),
        ]);
        let mut coordinator = MoveCoordinator::new();
        let drop = CardDrop {
            card_id: CardId::new("c7"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::InProgress,
            target: DropTarget::ColumnEnd,
        };
        match coordinator.begin(&board, drop) {
            MoveOutcome::Applied {
                board: next,
                card_id,
                request,
            } => {
                assert_eq!(card_id, CardId::new("c7"));
                assert_eq!(request.to_column, WorkflowStage::InProgress);
                assert_eq!(request.position, 1);
                assert_eq!(
                    next.lane(WorkflowStage::InProgress),
                    &[CardId::new("c9"), CardId::new("c7")]
                );
            }
            other => panic!("expected Applied, got {:?}", other),
        }
        assert!(!coordinator.is_idle());
    }

    #[test]
    fn test_drop_on_own_position_is_noop() {
        let board = board_with(&[(WorkflowStage::Estimates, &["c1", "c2"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = drop_on_card("c1", WorkflowStage::Estimates, WorkflowStage::Estimates, "c1");
        assert_eq!(coordinator.begin(&board, drop), MoveOutcome::NoOp);
        assert!(coordinator.is_idle());
    }

    #[test]
    fn test_drop_past_end_of_own_column_is_noop_when_already_last() {
        let board = board_with(&[(WorkflowStage::Estimates, &["c1", "c2"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = CardDrop {
            card_id: CardId::new("c2"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::Estimates,
            target: DropTarget::ColumnEnd,
        };
        assert_eq!(coordinator.begin(&board, drop), MoveOutcome::NoOp);
    }

    #[test]
    fn test_same_column_reorder_applies() {
        let board = board_with(&[(WorkflowStage::Estimates, &["c1", "c2", "c3"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = drop_on_card("c3", WorkflowStage::Estimates, WorkflowStage::Estimates, "c1");
        match coordinator.begin(&board, drop) {
            MoveOutcome::Applied { board: next, request, .. } => {
                assert_eq!(request.position, 0);
                let ids: Vec<&str> = next
                    .lane(WorkflowStage::Estimates)
                    .iter()
                    .map(CardId::as_str)
                    .collect();
                assert_eq!(ids, vec!["c3", "c1", "c2"]);
            }
            other => panic!("expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_column_drop_inserts_at_zero() {
        let board = board_with(&[(WorkflowStage::Estimates, &["c1"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = CardDrop {
            card_id: CardId::new("c1"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::WaitingParts,
            target: DropTarget::ColumnEnd,
        };
        match coordinator.begin(&board, drop) {
            MoveOutcome::Applied { board: next, request, .. } => {
                assert_eq!(request.position, 0);
                assert_eq!(
                    next.lane(WorkflowStage::WaitingParts),
                    &[CardId::new("c1")]
                );
            }
            other => panic!("expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_completed_column_is_terminal() {
        let board = board_with(&[(WorkflowStage::Completed, &["c1"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = CardDrop {
            card_id: CardId::new("c1"),
            from: WorkflowStage::Completed,
            to: WorkflowStage::Estimates,
            target: DropTarget::ColumnEnd,
        };
        match coordinator.begin(&board, drop) {
            MoveOutcome::Rejected { reason } => {
                assert!(reason.contains("completed"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        // Reordering within completed is still allowed.
        let board = board_with(&[(WorkflowStage::Completed, &["c1", "c2"])]);
        let drop = drop_on_card("c2", WorkflowStage::Completed, WorkflowStage::Completed, "c1");
        assert!(matches!(
            coordinator.begin(&board, drop),
            MoveOutcome::Applied { .. }
        ));
    }

    #[test]
    fn test_single_flight_refuses_overlapping_drops() {
        let board = board_with(&[(WorkflowStage::Estimates, &["c1", "c2"])]);
        let mut coordinator = MoveCoordinator::new();
        let first = CardDrop {
            card_id: CardId::new("c1"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::InProgress,
            target: DropTarget::ColumnEnd,
        };
        assert!(matches!(
            coordinator.begin(&board, first),
            MoveOutcome::Applied { .. }
        ));
        let second = CardDrop {
            card_id: CardId::new("c2"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::InProgress,
            target: DropTarget::ColumnEnd,
        };
        assert_eq!(coordinator.begin(&board, second), MoveOutcome::Busy);

        coordinator.confirm();
        let third = CardDrop {
            card_id: CardId::new("c2"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::InProgress,
            target: DropTarget::ColumnEnd,
        };
        assert!(matches!(
            coordinator.begin(&board, third),
            MoveOutcome::Applied { .. }
        ));
    }

    #[test]
    fn test_stale_drop_for_missing_card_is_noop() {
        let board = board_with(&[(WorkflowStage::InProgress, &["c1"])]);
        let mut coordinator = MoveCoordinator::new();
        // The gesture started before a snapshot moved the card away.
        let drop = CardDrop {
            card_id: CardId::new("c1"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::WaitingParts,
            target: DropTarget::ColumnEnd,
        };
        assert_eq!(coordinator.begin(&board, drop), MoveOutcome::NoOp);
        assert!(coordinator.is_idle());
    }

    #[test]
    fn test_ack_matching() {
        let board = board_with(&[(WorkflowStage::Estimates, &["17"])]);
        let mut coordinator = MoveCoordinator::new();
        let drop = CardDrop {
            card_id: CardId::new("17"),
            from: WorkflowStage::Estimates,
            to: WorkflowStage::InProgress,
            target: DropTarget::ColumnEnd,
        };
        assert!(matches!(
            coordinator.begin(&board, drop),
            MoveOutcome::Applied { .. }
        ));

        assert!(coordinator.matches_ack(
            Some(&NumericId::Int(17)),
            Some("in_progress"),
            Some(0)
        ));
        assert!(coordinator.matches_ack(
            Some(&NumericId::Str("17".to_string())),
            None,
            None
        ));
        assert!(!coordinator.matches_ack(Some(&NumericId::Int(18)), None, None));
        assert!(!coordinator.matches_ack(
            Some(&NumericId::Int(17)),
            Some("completed"),
            None
        ));

        coordinator.confirm();
        assert!(!coordinator.matches_ack(Some(&NumericId::Int(17)), None, None));
    }
}
