//! Card vote record.

use crate::model::board::{CardId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable vote identifier.
pub type VoteId = Uuid;

/// One yes/no vote cast on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(rename = "id")]
    pub vote_uuid: VoteId,
    #[serde(rename = "cardId")]
    pub card_uuid: CardId,
    #[serde(rename = "authorId")]
    pub author_uuid: UserId,
    /// `true` for an approving vote. New votes default to `true`.
    pub yes_or_no: bool,
    pub created_on: i64,
    pub updated_on: i64,
}
