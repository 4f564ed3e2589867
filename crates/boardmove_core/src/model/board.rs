//! Board, list and card records.
//!
//! Cards are ordered within their list and lists within their board by a
//! real-valued `order` key. Keys are never renumbered in bulk; a move only
//! rewrites the moved item's key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable board identifier.
pub type BoardId = Uuid;
/// Stable list identifier.
pub type ListId = Uuid;
/// Stable card identifier.
pub type CardId = Uuid;
/// Reference to a user managed outside this crate.
pub type UserId = Uuid;

/// Board read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(rename = "id")]
    pub board_uuid: BoardId,
    pub title: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// List read model. Named `BoardList` to stay clear of `std` collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    #[serde(rename = "id")]
    pub list_uuid: ListId,
    /// Owning board.
    #[serde(rename = "boardId")]
    pub board_uuid: BoardId,
    pub title: String,
    /// Rank within the owning board.
    pub order: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Card read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "id")]
    pub card_uuid: CardId,
    /// Owning list.
    #[serde(rename = "listId")]
    pub list_uuid: ListId,
    /// Owning board, kept in sync with the list's board.
    #[serde(rename = "boardId")]
    pub board_uuid: BoardId,
    pub title: String,
    /// Rank within the owning list.
    pub order: f64,
    /// Assigned users, sorted by id.
    pub assignees: Vec<UserId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    /// Returns whether the card currently sits in `list_uuid`.
    pub fn is_in_list(&self, list_uuid: ListId) -> bool {
        self.list_uuid == list_uuid
    }
}
