//! Board session state and inbound event dispatch.
//!
//! The session owns the latest board, the load phase, the connection
//! state, and the notification list. Every inbound channel event funnels
//! through [`BoardSession::apply_event`]; every board replacement funnels
//! through [`BoardSession::install_snapshot`]. The session does no I/O -
//! the controller performs fetches and tells the session what arrived,
//! which keeps all of this testable without a network.

use crate::coordinator::MoveCoordinator;
use crate::notifications::{Notification, NotificationLevel};
use crate::realtime::ChannelStatus;
use serviceflow_api::transform::normalize_snapshot;
use serviceflow_api::types::RawBoardSnapshot;
use serviceflow_api::BoardEvent;
use serviceflow_core::{Board, WorkflowStage};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Lifecycle of the session's board data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Initial snapshot not yet loaded.
    Loading,
    /// A snapshot has been installed; the board is renderable.
    Ready,
    /// Initial load failed; blocked on an explicit user retry.
    Failed { message: String },
}

/// Connection state of the live update channel, for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Degraded,
    Polling,
    Failed,
}

/// What the controller must do after the session absorbed a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    None,
    Refetch,
}

/// Echo-suppression gate over inbound board mutations.
///
/// An event passes only if more than the quiescence interval elapsed
/// since the last admitted mutation; otherwise it is dropped. Optimistic
/// local moves also stamp the gate, which is what suppresses the
/// server's immediate echo of the user's own move. A heuristic, not an
/// ordering guarantee; the window is tunable via config.
#[derive(Debug, Clone)]
pub struct UpdateGate {
    quiescence: Duration,
    last_applied: Option<Instant>,
}

impl UpdateGate {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            quiescence,
            last_applied: None,
        }
    }

    /// Record a mutation without asking for admission (optimistic moves).
    pub fn touch(&mut self) {
        self.last_applied = Some(Instant::now());
    }

    /// Admit or drop one inbound mutation, stamping on admit.
    pub fn admit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_applied {
            Some(last) if now.duration_since(last) <= self.quiescence => false,
            _ => {
                self.last_applied = Some(now);
                true
            }
        }
    }

    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }
}

pub struct BoardSession {
    board: Board,
    phase: SessionPhase,
    connection: ConnectionState,
    notifications: Vec<Notification>,
    gate: UpdateGate,
    disconnected_at: Option<Instant>,
}

impl BoardSession {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            board: Board::new(WorkflowStage::ALL),
            phase: SessionPhase::Loading,
            connection: ConnectionState::Connecting,
            notifications: Vec::new(),
            gate: UpdateGate::new(quiescence),
            disconnected_at: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn push(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    /// Replace the board from an optimistic local move. Stamps the gate so
    /// the server's echo of this move is suppressed.
    pub fn apply_optimistic(&mut self, board: Board) {
        self.gate.touch();
        self.board = board;
    }

    /// Replace the board wholesale from an authoritative snapshot.
    pub fn install_snapshot(&mut self, raw: &RawBoardSnapshot) {
        let normalized = normalize_snapshot(raw);
        if normalized.dropped > 0 {
            debug!(
                dropped = normalized.dropped,
                "snapshot installed with invalid entries removed"
            );
        }
        self.board = normalized.board;
        self.phase = SessionPhase::Ready;
    }

    /// The initial snapshot fetch failed entirely: block on user retry.
    pub fn initial_load_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.phase = SessionPhase::Failed {
            message: message.clone(),
        };
        self.push(Notification::load_failed(message));
    }

    /// Single dispatch point for the inbound event union.
    #[must_use]
    pub fn apply_event(&mut self, event: BoardEvent, coordinator: &MoveCoordinator) -> FollowUp {
        match event {
            BoardEvent::Pong => FollowUp::None,
            BoardEvent::Unknown => {
                warn!("ignoring channel event of unknown type");
                FollowUp::None
            }
            BoardEvent::WorkflowUpdate { data } => {
                if self.gate.admit() {
                    self.install_snapshot(&data);
                } else {
                    debug!("dropping board update inside quiescence window");
                }
                FollowUp::None
            }
            BoardEvent::CardMoved {
                success: false,
                message,
                ..
            } => {
                let message =
                    message.unwrap_or_else(|| "Failed to move card".to_string());
                self.push(Notification::move_rejected(message));
                FollowUp::Refetch
            }
            BoardEvent::CardMoved {
                success: true,
                card_id,
                new_column,
                position,
                ..
            } => {
                let position = position.as_ref().and_then(|p| p.as_usize());
                if coordinator.matches_ack(
                    card_id.as_ref(),
                    new_column.as_deref(),
                    position,
                ) {
                    // Echo of our own optimistic move; already applied.
                    FollowUp::None
                } else if self.gate.admit() {
                    // Another client moved a card; the ack carries no
                    // authoritative ordering, so pull a fresh snapshot.
                    FollowUp::Refetch
                } else {
                    debug!("dropping foreign move ack inside quiescence window");
                    FollowUp::None
                }
            }
        }
    }

    /// Absorb a connection status change from the channel manager.
    #[must_use]
    pub fn note_channel_status(&mut self, status: ChannelStatus) -> FollowUp {
        match status {
            ChannelStatus::Connected => {
                let was_down = self.disconnected_at.take();
                self.connection = ConnectionState::Connected;
                match was_down {
                    // A gap longer than the quiescence window may have
                    // swallowed pushes; bound the staleness with a refetch.
                    Some(since) if since.elapsed() > self.gate.quiescence() => FollowUp::Refetch,
                    _ => FollowUp::None,
                }
            }
            ChannelStatus::Reconnecting { .. } => {
                self.mark_degraded(ConnectionState::Degraded, "Live updates interrupted, reconnecting");
                FollowUp::None
            }
            ChannelStatus::Polling => {
                self.mark_degraded(
                    ConnectionState::Polling,
                    "Live updates unavailable, falling back to polling",
                );
                FollowUp::None
            }
            ChannelStatus::Failed { message } => {
                self.connection = ConnectionState::Failed;
                self.push(Notification::new(
                    NotificationLevel::Error,
                    format!("Live updates unavailable: {}", message),
                ));
                FollowUp::None
            }
        }
    }

    fn mark_degraded(&mut self, state: ConnectionState, message: &str) {
        let was_connected = self.connection == ConnectionState::Connected;
        if was_connected {
            self.disconnected_at = Some(Instant::now());
            self.push(Notification::channel_degraded(message));
        }
        if self.connection != ConnectionState::Failed {
            self.connection = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serviceflow_core::CardId;

    fn update_event(ids: &[&str]) -> BoardEvent {
        let raw = serviceflow_test_utils::raw_snapshot(&[("estimates", ids)]);
        let data: RawBoardSnapshot = serde_json::from_value(raw).unwrap();
        BoardEvent::WorkflowUpdate { data }
    }

    fn session() -> BoardSession {
        BoardSession::new(Duration::from_millis(1_000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiescence_gate_drops_rapid_updates() {
        let mut session = session();
        let coordinator = MoveCoordinator::new();

        assert_eq!(
            session.apply_event(update_event(&["1"]), &coordinator),
            FollowUp::None
        );
        assert_eq!(session.board().card_count(), 1);

        // 200ms later: inside the window, dropped.
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(
            session.apply_event(update_event(&["1", "2"]), &coordinator),
            FollowUp::None
        );
        assert_eq!(session.board().card_count(), 1);

        // 1100ms after the first: outside the window, applied.
        tokio::time::advance(Duration::from_millis(900)).await;
        assert_eq!(
            session.apply_event(update_event(&["1", "2", "3"]), &coordinator),
            FollowUp::None
        );
        assert_eq!(session.board().card_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_optimistic_apply_suppresses_echo() {
        let mut session = session();
        let coordinator = MoveCoordinator::new();

        tokio::time::advance(Duration::from_millis(5_000)).await;
        let board = session.board().clone();
        session.apply_optimistic(board);

        // The echo lands 100ms after the local move and is swallowed.
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            session.apply_event(update_event(&["1"]), &coordinator),
            FollowUp::None
        );
        assert_eq!(session.board().card_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_rejection_surfaces_and_refetches() {
        let mut session = session();
        let coordinator = MoveCoordinator::new();
        let event = BoardEvent::CardMoved {
            success: false,
            card_id: None,
            new_column: None,
            position: None,
            message: Some("card no longer exists".to_string()),
        };
        assert_eq!(
            session.apply_event(event, &coordinator),
            FollowUp::Refetch
        );
        let last = session.notifications().last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(last.message, "card no longer exists");
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_move_ack_triggers_refetch() {
        let mut session = session();
        let coordinator = MoveCoordinator::new();
        tokio::time::advance(Duration::from_millis(5_000)).await;
        let event = BoardEvent::CardMoved {
            success: true,
            card_id: Some(serviceflow_api::types::NumericId::Int(9)),
            new_column: Some("in_progress".to_string()),
            position: Some(serviceflow_api::types::NumericId::Int(0)),
            message: None,
        };
        assert_eq!(
            session.apply_event(event, &coordinator),
            FollowUp::Refetch
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_gap_longer_than_window_refetches() {
        let mut session = session();
        assert_eq!(
            session.note_channel_status(ChannelStatus::Connected),
            FollowUp::None
        );
        assert_eq!(
            session.note_channel_status(ChannelStatus::Reconnecting { attempt: 1 }),
            FollowUp::None
        );
        assert_eq!(session.connection(), ConnectionState::Degraded);

        tokio::time::advance(Duration::from_millis(4_000)).await;
        assert_eq!(
            session.note_channel_status(ChannelStatus::Connected),
            FollowUp::Refetch
        );
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_reconnect_gap_does_not_refetch() {
        let mut session = session();
        let _ = session.note_channel_status(ChannelStatus::Connected);
        let _ = session.note_channel_status(ChannelStatus::Reconnecting { attempt: 1 });
        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(
            session.note_channel_status(ChannelStatus::Connected),
            FollowUp::None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_channel_failure_is_sticky() {
        let mut session = session();
        let _ = session.note_channel_status(ChannelStatus::Failed {
            message: "HTTP 403".to_string(),
        });
        assert_eq!(session.connection(), ConnectionState::Failed);
        let last = session.notifications().last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_failure_blocks_on_retry() {
        let mut session = session();
        session.initial_load_failed("Failed to load workflow board");
        assert_eq!(
            *session.phase(),
            SessionPhase::Failed {
                message: "Failed to load workflow board".to_string()
            }
        );
        let last = session.notifications().last().unwrap();
        assert_eq!(
            last.action,
            Some(crate::notifications::NotificationAction::Retry)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_rows_filtered_from_pushed_snapshot() {
        let mut session = session();
        let coordinator = MoveCoordinator::new();
        let _ = session.apply_event(update_event(&["1", "2"]), &coordinator);
        assert_eq!(session.board().card_count(), 2);

        // Rows, not whole payloads, are the unit of damage: an update
        // whose rows all fail validation installs an empty board rather
        // than erroring. (Undecodable payloads never reach the session;
        // the channel manager drops those and the board is retained.)
        tokio::time::advance(Duration::from_millis(2_000)).await;
        let data: RawBoardSnapshot = serde_json::from_value(json!({
            "columns": { "estimates": [ { "id": "3" } ], "in_progress": [] }
        }))
        .unwrap();
        let _ = session.apply_event(BoardEvent::WorkflowUpdate { data }, &coordinator);
        // The only row lacked customer/vehicle and was dropped.
        assert_eq!(session.board().card_count(), 0);
        assert!(session.board().lane(WorkflowStage::Estimates).is_empty());
        assert!(session.board().card(&CardId::new("1")).is_none());
    }
}
