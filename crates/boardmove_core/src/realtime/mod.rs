//! Realtime events emitted after successful moves.
//!
//! # Responsibility
//! - Turn move outcomes into board-room events.
//! - Define the publish seam and the badge lookup seam.
//!
//! # Invariants
//! - Planning is pure: events are built before anything is published.
//! - Rooms are keyed `board:<board id>`.
//! - A move within one board yields one update event; a move across boards
//!   yields a move event for the destination and a delete event for the origin.

use crate::model::board::{BoardId, CardId};
use crate::repo::RepoResult;
use crate::service::move_service::{CardMove, ListMove};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

pub const CARD_MOVE_EVENT: &str = "/card:move";
pub const LIST_MOVE_EVENT: &str = "/list:move";

/// Room name for one board.
pub fn board_room(board_uuid: BoardId) -> String {
    format!("board:{board_uuid}")
}

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// Every session in `room`, the requester included.
    Room,
    /// Every session in `room` except the requester.
    BroadcastToRoom,
}

/// One outbound realtime event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub scope: EventScope,
    pub room: String,
    pub name: String,
    pub payload: Value,
}

/// Per-card counters shown on card faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBadges {
    pub comments: u32,
    pub votes_yes: u32,
    pub votes_no: u32,
    pub assignees: u32,
}

/// Lookup for card badge counters.
pub trait BadgeSource {
    fn card_badges(&self, card_uuid: CardId) -> RepoResult<CardBadges>;
}

/// Sink for realtime events.
pub trait Notifier {
    fn publish(&self, event: &MoveEvent);
}

/// Notifier that keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MoveEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events published so far.
    pub fn events(&self) -> Vec<MoveEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drains the events published so far.
    pub fn take(&self) -> Vec<MoveEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, event: &MoveEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Builds the events for a finished card move.
///
/// The card payload carries a `badges` field.
pub fn plan_card_events(
    moved: &CardMove,
    badges: &CardBadges,
) -> Result<Vec<MoveEvent>, serde_json::Error> {
    let mut payload = serde_json::to_value(&moved.updated)?;
    if let Value::Object(fields) = &mut payload {
        fields.insert("badges".to_string(), serde_json::to_value(badges)?);
    }

    let card_uuid = moved.updated.card_uuid;
    let origin_room = board_room(moved.original.board_uuid);
    if !moved.crossed_board() {
        return Ok(vec![MoveEvent {
            scope: EventScope::Room,
            room: origin_room,
            name: format!("/card/{card_uuid}:update"),
            payload,
        }]);
    }

    Ok(vec![
        MoveEvent {
            scope: EventScope::BroadcastToRoom,
            room: board_room(moved.updated.board_uuid),
            name: CARD_MOVE_EVENT.to_string(),
            payload: payload.clone(),
        },
        MoveEvent {
            scope: EventScope::Room,
            room: origin_room,
            name: format!("/card/{card_uuid}:delete"),
            payload,
        },
    ])
}

/// Builds the events for a finished list move.
pub fn plan_list_events(moved: &ListMove) -> Result<Vec<MoveEvent>, serde_json::Error> {
    let payload = serde_json::to_value(&moved.updated)?;
    let list_uuid = moved.updated.list_uuid;
    let origin_room = board_room(moved.original.board_uuid);
    if !moved.crossed_board() {
        return Ok(vec![MoveEvent {
            scope: EventScope::Room,
            room: origin_room,
            name: format!("/list/{list_uuid}:update"),
            payload,
        }]);
    }

    Ok(vec![
        MoveEvent {
            scope: EventScope::BroadcastToRoom,
            room: board_room(moved.updated.board_uuid),
            name: LIST_MOVE_EVENT.to_string(),
            payload: payload.clone(),
        },
        MoveEvent {
            scope: EventScope::Room,
            room: origin_room,
            name: format!("/list/{list_uuid}:delete"),
            payload,
        },
    ])
}
