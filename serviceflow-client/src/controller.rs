//! The single-threaded controller that owns the board session.
//!
//! Every suspension point re-enters through `&mut self`, so each async
//! step reads the session's current board rather than a stale capture.
//! The channel manager task only talks to the controller through the
//! signal channel; it never mutates the board.

use crate::api_client::{ApiClient, ApiClientError};
use crate::config::ClientConfig;
use crate::coordinator::{CardDrop, MoveCoordinator, MoveOutcome};
use crate::error::ClientError;
use crate::notifications::{Notification, NotificationLevel};
use crate::realtime::{spawn_channel_manager, ChannelSignal};
use crate::session::{BoardSession, FollowUp, SessionPhase};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct BoardController {
    api: ApiClient,
    session: BoardSession,
    coordinator: MoveCoordinator,
}

impl BoardController {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(config)?;
        let session = BoardSession::new(Duration::from_millis(config.quiescence_ms));
        Ok(Self {
            api,
            session,
            coordinator: MoveCoordinator::new(),
        })
    }

    pub fn session(&self) -> &BoardSession {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Start the live channel; returns the handle so callers control the
    /// subscription's lifecycle explicitly.
    pub fn open_channel(
        &self,
        buffer: usize,
    ) -> (mpsc::Receiver<ChannelSignal>, tokio::task::JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(buffer);
        let handle = spawn_channel_manager(self.api.ws().clone(), sender);
        (receiver, handle)
    }

    /// Load the initial snapshot. On failure the session enters the
    /// blocking failed phase; no automatic retry loop.
    pub async fn start(&mut self) {
        match self.api.rest().fetch_board().await {
            Ok(raw) => self.session.install_snapshot(&raw),
            Err(err) => {
                warn!(error = %err, "initial board load failed");
                self.session
                    .initial_load_failed("Failed to load workflow board");
            }
        }
    }

    /// User-triggered retry from the blocking failed phase.
    pub async fn retry_initial_load(&mut self) {
        if matches!(self.session.phase(), SessionPhase::Failed { .. }) {
            self.start().await;
        }
    }

    /// Pull a fresh snapshot, replacing any optimistic state. A failed
    /// refetch keeps the last known-good board.
    pub async fn refetch(&mut self) {
        match self.api.rest().fetch_board().await {
            Ok(raw) => self.session.install_snapshot(&raw),
            Err(err) => {
                warn!(error = %err, "board refetch failed, keeping last known state");
                self.session.push(Notification::new(
                    NotificationLevel::Warning,
                    "Could not refresh the board",
                ));
            }
        }
    }

    /// Handle a completed drag gesture.
    pub async fn handle_drop(&mut self, drop: CardDrop) {
        match self.coordinator.begin(self.session.board(), drop) {
            MoveOutcome::Applied {
                board,
                card_id,
                request,
            } => {
                // Local state first: the user sees their move immediately.
                self.session.apply_optimistic(board);
                match self.api.rest().move_card(&card_id, &request).await {
                    Ok(()) => {
                        self.coordinator.confirm();
                        debug!(card = %card_id, column = %request.to_column, "move confirmed");
                    }
                    Err(err) => {
                        self.coordinator.fail();
                        let message = match &err {
                            ApiClientError::Rejected {
                                message: Some(message),
                                ..
                            } => message.clone(),
                            _ => "Failed to move card".to_string(),
                        };
                        warn!(card = %card_id, error = %err, "move rejected, refetching");
                        self.session.push(Notification::move_rejected(message));
                        // No reverse diff: the snapshot is the recovery.
                        self.refetch().await;
                    }
                }
            }
            MoveOutcome::Busy => {
                self.session.notify(
                    NotificationLevel::Warning,
                    "Another move is still in progress",
                );
            }
            MoveOutcome::Rejected { reason } => {
                self.session.push(Notification::move_rejected(reason));
            }
            MoveOutcome::NoOp => {}
        }
    }

    /// Absorb one signal from the channel manager.
    pub async fn handle_signal(&mut self, signal: ChannelSignal) {
        let follow_up = match signal {
            ChannelSignal::Event(event) => self.session.apply_event(event, &self.coordinator),
            ChannelSignal::Status(status) => self.session.note_channel_status(status),
            ChannelSignal::RefetchRequested => FollowUp::Refetch,
        };
        if follow_up == FollowUp::Refetch {
            self.refetch().await;
        }
    }

    /// Drive the session until the channel manager goes away.
    pub async fn run(&mut self, mut receiver: mpsc::Receiver<ChannelSignal>) {
        while let Some(signal) = receiver.recv().await {
            self.handle_signal(signal).await;
        }
    }
}
