//! Card and list move pipelines.
//!
//! # Responsibility
//! - Run fetch -> allocate -> persist for one move request.
//! - Apply the cross-board assignee policy to moved cards.
//! - Keep a list's cards on the list's board after a list move.
//!
//! # Invariants
//! - Steps run strictly in sequence; nothing is written before the new order
//!   key has been allocated.
//! - A card's `board_uuid` matches its list's `board_uuid` after every move.
//! - A card that lands on another board loses all assignees.

use crate::model::board::{BoardId, BoardList, Card, CardId, ListId};
use crate::order::{allocate, AllocationError};
use crate::repo::board_repo::BoardRepository;
use crate::repo::RepoError;
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Inbound "move-card" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub card_id: CardId,
    /// Destination list.
    pub list_id: ListId,
    /// Destination board. Must own `list_id`.
    pub board_id: BoardId,
    /// 1-based target slot in the destination list.
    pub position: i64,
}

/// Inbound "move-list" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveListRequest {
    pub list_id: ListId,
    /// Destination board.
    pub board_id: BoardId,
    /// 1-based target slot in the destination board.
    pub position: i64,
}

/// Card snapshots before and after a move.
#[derive(Debug, Clone, PartialEq)]
pub struct CardMove {
    pub original: Card,
    pub updated: Card,
}

impl CardMove {
    /// Returns whether the card left its original board.
    pub fn crossed_board(&self) -> bool {
        self.original.board_uuid != self.updated.board_uuid
    }
}

/// List snapshots before and after a move.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMove {
    pub original: BoardList,
    pub updated: BoardList,
    /// Cards whose board reference followed the list.
    pub cascaded_cards: usize,
}

impl ListMove {
    /// Returns whether the list left its original board.
    pub fn crossed_board(&self) -> bool {
        self.original.board_uuid != self.updated.board_uuid
    }
}

/// What happens to a card's assignees when it moves.
///
/// Assignees are board members, so they do not follow a card to another board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneePolicy {
    Keep,
    Clear,
}

impl AssigneePolicy {
    pub fn for_move(origin_board: BoardId, destination_board: BoardId) -> Self {
        if origin_board == destination_board {
            Self::Keep
        } else {
            Self::Clear
        }
    }
}

/// Errors from the move pipelines.
#[derive(Debug)]
pub enum MoveError {
    /// The card to move does not exist. Nothing was written.
    CardNotFound(CardId),
    /// The list to move, the destination list, or a card's origin list is missing.
    ListNotFound(ListId),
    /// The destination board does not exist.
    BoardNotFound(BoardId),
    /// The destination list belongs to a different board than requested.
    ContainerMismatch {
        list_uuid: ListId,
        list_board: BoardId,
        requested_board: BoardId,
    },
    /// Sibling keys do not admit a key for the requested slot.
    InvalidOrderingState(AllocationError),
    /// The list moved but some of its cards still point at another board.
    PartialCascadeFailure {
        list_uuid: ListId,
        board_uuid: BoardId,
        stray_cards: usize,
    },
    /// A store call failed or timed out.
    StoreUnavailable(RepoError),
}

impl MoveError {
    /// Stable machine-readable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CardNotFound(_) | Self::ListNotFound(_) | Self::BoardNotFound(_) => "not_found",
            Self::ContainerMismatch { .. } => "container_mismatch",
            Self::InvalidOrderingState(_) => "invalid_ordering_state",
            Self::PartialCascadeFailure { .. } => "partial_cascade_failure",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl Display for MoveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ContainerMismatch {
                list_uuid,
                list_board,
                requested_board,
            } => write!(
                f,
                "list {list_uuid} belongs to board {list_board}, not {requested_board}"
            ),
            Self::InvalidOrderingState(err) => write!(f, "invalid ordering state: {err}"),
            Self::PartialCascadeFailure {
                list_uuid,
                board_uuid,
                stray_cards,
            } => write!(
                f,
                "list {list_uuid} moved to board {board_uuid} but {stray_cards} card(s) did not follow"
            ),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for MoveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidOrderingState(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocationError> for MoveError {
    fn from(value: AllocationError) -> Self {
        Self::InvalidOrderingState(value)
    }
}

impl From<RepoError> for MoveError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CardNotFound(id) => Self::CardNotFound(id),
            RepoError::ListNotFound(id) => Self::ListNotFound(id),
            RepoError::BoardNotFound(id) => Self::BoardNotFound(id),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Move pipeline facade over a board repository.
pub struct MoveService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> MoveService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrows the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Moves one card to a slot in a (possibly different) list.
    ///
    /// # Errors
    /// - `CardNotFound` / `ListNotFound` before anything is written.
    /// - `ContainerMismatch` when `list_id` is not on `board_id`.
    /// - `InvalidOrderingState` when no key fits the slot.
    /// - `StoreUnavailable` on store failure.
    pub fn move_card(&self, request: &MoveCardRequest) -> Result<CardMove, MoveError> {
        let started_at = Instant::now();
        info!(
            "event=move_card module=service status=start card={} list={} board={} position={}",
            request.card_id, request.list_id, request.board_id, request.position
        );

        match self.run_move_card(request) {
            Ok(outcome) => {
                info!(
                    "event=move_card module=service status=ok card={} order={} crossed_board={} duration_ms={}",
                    request.card_id,
                    outcome.updated.order,
                    outcome.crossed_board(),
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=move_card module=service status=error card={} error_code={} duration_ms={} error={}",
                    request.card_id,
                    err.code(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Moves one list to a slot in a (possibly different) board, carrying its cards.
    ///
    /// # Errors
    /// - `ListNotFound` / `BoardNotFound` before anything is written.
    /// - `InvalidOrderingState` when no key fits the slot.
    /// - `PartialCascadeFailure` when cards are left on another board.
    /// - `StoreUnavailable` on store failure.
    pub fn move_list(&self, request: &MoveListRequest) -> Result<ListMove, MoveError> {
        let started_at = Instant::now();
        info!(
            "event=move_list module=service status=start list={} board={} position={}",
            request.list_id, request.board_id, request.position
        );

        match self.run_move_list(request) {
            Ok(outcome) => {
                info!(
                    "event=move_list module=service status=ok list={} order={} crossed_board={} cascaded_cards={} duration_ms={}",
                    request.list_id,
                    outcome.updated.order,
                    outcome.crossed_board(),
                    outcome.cascaded_cards,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=move_list module=service status=error list={} error_code={} duration_ms={} error={}",
                    request.list_id,
                    err.code(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_move_card(&self, request: &MoveCardRequest) -> Result<CardMove, MoveError> {
        let original = self
            .repo
            .get_card(request.card_id)?
            .ok_or(MoveError::CardNotFound(request.card_id))?;

        let destination = self
            .repo
            .get_list(request.list_id)?
            .ok_or(MoveError::ListNotFound(request.list_id))?;
        if destination.board_uuid != request.board_id {
            return Err(MoveError::ContainerMismatch {
                list_uuid: destination.list_uuid,
                list_board: destination.board_uuid,
                requested_board: request.board_id,
            });
        }
        let siblings = self.repo.card_orders_in_list(request.list_id)?;

        let origin_list = self
            .repo
            .get_list(original.list_uuid)?
            .ok_or(MoveError::ListNotFound(original.list_uuid))?;
        let same_list = origin_list.list_uuid == request.list_id;

        let order = allocate(request.position, original.order, same_list, &siblings)?;

        let placed = self.repo.update_card_placement(
            request.card_id,
            request.list_id,
            request.board_id,
            order,
        )?;

        let updated = match AssigneePolicy::for_move(original.board_uuid, placed.board_uuid) {
            AssigneePolicy::Keep => placed,
            AssigneePolicy::Clear => self.repo.clear_card_assignees(request.card_id)?,
        };

        Ok(CardMove { original, updated })
    }

    fn run_move_list(&self, request: &MoveListRequest) -> Result<ListMove, MoveError> {
        let original = self
            .repo
            .get_list(request.list_id)?
            .ok_or(MoveError::ListNotFound(request.list_id))?;

        self.repo
            .get_board(request.board_id)?
            .ok_or(MoveError::BoardNotFound(request.board_id))?;
        let siblings = self.repo.list_orders_in_board(request.board_id)?;

        let same_board = original.board_uuid == request.board_id;
        let order = allocate(request.position, original.order, same_board, &siblings)?;

        let relocation =
            self.repo
                .move_list_with_cards(request.list_id, request.board_id, order)?;

        let stray_cards = self
            .repo
            .count_cards_off_board(request.list_id, request.board_id)?;
        if stray_cards > 0 {
            return Err(MoveError::PartialCascadeFailure {
                list_uuid: request.list_id,
                board_uuid: request.board_id,
                stray_cards,
            });
        }

        Ok(ListMove {
            original,
            updated: relocation.list,
            cascaded_cards: relocation.cascaded_cards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AssigneePolicy, MoveCardRequest, MoveError};
    use crate::order::AllocationError;
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn assignees_are_kept_within_one_board() {
        let board = Uuid::new_v4();
        assert_eq!(AssigneePolicy::for_move(board, board), AssigneePolicy::Keep);
    }

    #[test]
    fn assignees_are_cleared_across_boards() {
        assert_eq!(
            AssigneePolicy::for_move(Uuid::new_v4(), Uuid::new_v4()),
            AssigneePolicy::Clear
        );
    }

    #[test]
    fn repo_not_found_maps_to_move_not_found() {
        let id = Uuid::new_v4();
        let err = MoveError::from(RepoError::CardNotFound(id));
        assert!(matches!(err, MoveError::CardNotFound(found) if found == id));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn other_repo_errors_map_to_store_unavailable() {
        let err = MoveError::from(RepoError::InvalidData("bad row".to_string()));
        assert!(matches!(err, MoveError::StoreUnavailable(_)));
        assert_eq!(err.code(), "store_unavailable");
    }

    #[test]
    fn allocation_errors_map_to_invalid_ordering_state() {
        let err = MoveError::from(AllocationError::NoRoom {
            lower: 1.0,
            upper: 1.0,
        });
        assert_eq!(err.code(), "invalid_ordering_state");
        assert!(err.to_string().contains("invalid ordering state"));
    }

    #[test]
    fn move_card_request_parses_wire_payload() {
        let card = Uuid::new_v4();
        let list = Uuid::new_v4();
        let board = Uuid::new_v4();
        let payload = serde_json::json!({
            "cardId": card.to_string(),
            "listId": list.to_string(),
            "boardId": board.to_string(),
            "position": 3,
        });

        let request: MoveCardRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(request.card_id, card);
        assert_eq!(request.list_id, list);
        assert_eq!(request.board_id, board);
        assert_eq!(request.position, 3);
    }
}
