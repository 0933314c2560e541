//! The board arena.
//!
//! Cards live in one flat table keyed by id; each stage owns an ordered
//! list of card ids. A card's stage and position are derived from lane
//! membership, so the two can never disagree. All mutations return a new
//! `Board` value - callers rely on value semantics for optimistic
//! rollback and change detection.

use crate::card::{Card, CardId};
use crate::error::BoardError;
use crate::stage::WorkflowStage;
use std::collections::{BTreeMap, HashMap, HashSet};

/// The full set of lanes and their ordered cards for one workflow view.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    cards: HashMap<CardId, Card>,
    lanes: BTreeMap<WorkflowStage, Vec<CardId>>,
    column_order: Vec<WorkflowStage>,
}

impl Board {
    /// An empty board with every stage present, columns in the given order.
    ///
    /// Duplicate entries in `column_order` are dropped; stages it omits are
    /// appended in canonical order so the lane set and the column order
    /// always cover exactly the same stages.
    pub fn new(column_order: impl IntoIterator<Item = WorkflowStage>) -> Self {
        let mut order: Vec<WorkflowStage> = Vec::with_capacity(WorkflowStage::ALL.len());
        for stage in column_order {
            if !order.contains(&stage) {
                order.push(stage);
            }
        }
        for stage in WorkflowStage::ALL {
            if !order.contains(&stage) {
                order.push(stage);
            }
        }
        let lanes = WorkflowStage::ALL
            .into_iter()
            .map(|stage| (stage, Vec::new()))
            .collect();
        Self {
            cards: HashMap::new(),
            lanes,
            column_order: order,
        }
    }

    /// Append a card to the end of a stage's lane.
    pub fn insert_card(&mut self, stage: WorkflowStage, card: Card) -> Result<(), BoardError> {
        if self.cards.contains_key(&card.id) {
            return Err(BoardError::DuplicateCard {
                id: card.id.clone(),
            });
        }
        let id = card.id.clone();
        self.cards.insert(id.clone(), card);
        self.lane_mut(stage).push(id);
        Ok(())
    }

    /// Relocate a card.
    ///
    /// Pure: the receiver is untouched and a new board is returned. When
    /// `card_id` is not in `from`'s lane the move is a no-op (the caller
    /// lost a race against a newer snapshot) and the returned board equals
    /// the input. `to_index` is clamped to the destination lane length.
    /// `from == to` degenerates to an in-lane reorder.
    #[must_use]
    pub fn move_card(
        &self,
        card_id: &CardId,
        from: WorkflowStage,
        to: WorkflowStage,
        to_index: usize,
    ) -> Board {
        let mut next = self.clone();
        let source = next.lane_mut(from);
        let Some(at) = source.iter().position(|id| id == card_id) else {
            return next;
        };
        let id = source.remove(at);
        let dest = next.lane_mut(to);
        let at = to_index.min(dest.len());
        dest.insert(at, id);
        next
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// The stage whose lane currently lists the card.
    pub fn stage_of(&self, id: &CardId) -> Option<WorkflowStage> {
        self.lanes
            .iter()
            .find(|(_, lane)| lane.iter().any(|c| c == id))
            .map(|(stage, _)| *stage)
    }

    /// Zero-based rank of the card within its lane.
    pub fn position_of(&self, id: &CardId) -> Option<usize> {
        self.lanes
            .values()
            .find_map(|lane| lane.iter().position(|c| c == id))
    }

    pub fn lane(&self, stage: WorkflowStage) -> &[CardId] {
        self.lanes.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cards of one lane paired with their derived positions, in order.
    pub fn positioned_cards(
        &self,
        stage: WorkflowStage,
    ) -> impl Iterator<Item = (usize, &Card)> + '_ {
        self.lane(stage)
            .iter()
            .filter_map(|id| self.cards.get(id))
            .enumerate()
    }

    /// Rendering order of the columns, preserved across transport.
    pub fn column_order(&self) -> &[WorkflowStage] {
        &self.column_order
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Validate the board's structural invariants.
    ///
    /// Exercised by the property suite; production code only produces
    /// boards through constructors that keep these true.
    pub fn check_invariants(&self) -> Result<(), BoardError> {
        let mut seen: HashSet<&CardId> = HashSet::new();
        for lane in self.lanes.values() {
            for id in lane {
                if !seen.insert(id) {
                    return Err(BoardError::MultiplePlacement { id: id.clone() });
                }
                if !self.cards.contains_key(id) {
                    return Err(BoardError::DanglingCardRef { id: id.clone() });
                }
            }
        }
        for id in self.cards.keys() {
            if !seen.contains(id) {
                return Err(BoardError::UnlistedCard { id: id.clone() });
            }
        }
        let ordered: HashSet<WorkflowStage> = self.column_order.iter().copied().collect();
        if ordered.len() != self.column_order.len() {
            return Err(BoardError::ColumnOrderMismatch {
                reason: "column_order contains duplicates".to_string(),
            });
        }
        let present: HashSet<WorkflowStage> = self.lanes.keys().copied().collect();
        if ordered != present {
            return Err(BoardError::ColumnOrderMismatch {
                reason: "column_order does not match the lane set".to_string(),
            });
        }
        Ok(())
    }

    fn lane_mut(&mut self, stage: WorkflowStage) -> &mut Vec<CardId> {
        self.lanes.entry(stage).or_default()
    }
}
