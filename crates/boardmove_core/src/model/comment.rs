//! Card comment record.

use crate::model::board::{CardId, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable comment identifier.
pub type CommentId = Uuid;

/// Persisted comment on one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "id")]
    pub comment_uuid: CommentId,
    #[serde(rename = "cardId")]
    pub card_uuid: CardId,
    #[serde(rename = "authorId")]
    pub author_uuid: UserId,
    pub content: String,
    /// Epoch ms; assigned by the store.
    pub created_on: i64,
    /// Epoch ms of the last edit, if any.
    pub updated_on: Option<i64>,
}

/// Write model for a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub card_uuid: CardId,
    pub author_uuid: UserId,
    pub content: String,
}

impl CommentDraft {
    pub fn new(card_uuid: CardId, author_uuid: UserId, content: impl Into<String>) -> Self {
        Self {
            card_uuid,
            author_uuid,
            content: content.into(),
        }
    }

    /// Checks the draft before it reaches the store.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.content.trim().is_empty() {
            return Err(CommentValidationError::BlankContent);
        }
        if self.card_uuid.is_nil() {
            return Err(CommentValidationError::MissingCard);
        }
        if self.author_uuid.is_nil() {
            return Err(CommentValidationError::MissingAuthor);
        }
        Ok(())
    }
}

/// Comment validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentValidationError {
    BlankContent,
    MissingCard,
    MissingAuthor,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankContent => write!(f, "comment content must not be blank"),
            Self::MissingCard => write!(f, "comment must reference a card"),
            Self::MissingAuthor => write!(f, "comment must reference an author"),
        }
    }
}

impl Error for CommentValidationError {}

#[cfg(test)]
mod tests {
    use super::{CommentDraft, CommentValidationError};
    use uuid::Uuid;

    #[test]
    fn blank_content_is_rejected() {
        let draft = CommentDraft::new(Uuid::new_v4(), Uuid::new_v4(), "  \n ");
        assert_eq!(draft.validate(), Err(CommentValidationError::BlankContent));
    }

    #[test]
    fn nil_author_is_rejected() {
        let draft = CommentDraft::new(Uuid::new_v4(), Uuid::nil(), "looks good");
        assert_eq!(draft.validate(), Err(CommentValidationError::MissingAuthor));
    }
}
