//! Workflow stage enumeration.

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named stage on the workflow board.
///
/// The set is fixed: service requests move from estimates through the shop
/// floor stages to completed. `Ord` follows the canonical workflow order,
/// so an ordered map keyed by stage iterates in board order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Estimates,
    InProgress,
    WaitingParts,
    Completed,
}

impl WorkflowStage {
    /// All stages in canonical workflow order.
    pub const ALL: [WorkflowStage; 4] = [
        WorkflowStage::Estimates,
        WorkflowStage::InProgress,
        WorkflowStage::WaitingParts,
        WorkflowStage::Completed,
    ];

    /// The wire name of the stage (snake_case, matches the backend).
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Estimates => "estimates",
            WorkflowStage::InProgress => "in_progress",
            WorkflowStage::WaitingParts => "waiting_parts",
            WorkflowStage::Completed => "completed",
        }
    }

    /// Human-readable column title ("in_progress" renders as "In Progress").
    pub fn title(&self) -> &'static str {
        match self {
            WorkflowStage::Estimates => "Estimates",
            WorkflowStage::InProgress => "In Progress",
            WorkflowStage::WaitingParts => "Waiting Parts",
            WorkflowStage::Completed => "Completed",
        }
    }

    /// Completed is a terminal stage: cards may not be moved back out of it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Completed)
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "estimates" => Ok(WorkflowStage::Estimates),
            "in_progress" => Ok(WorkflowStage::InProgress),
            "waiting_parts" => Ok(WorkflowStage::WaitingParts),
            "completed" => Ok(WorkflowStage::Completed),
            other => Err(BoardError::UnknownStage {
                name: other.to_string(),
            }),
        }
    }
}
