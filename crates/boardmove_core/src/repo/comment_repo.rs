//! Comment/vote repository and card badge counts.
//!
//! Comments and votes hang off cards and never take part in ordering; the
//! pipelines only read them back as badge counters for realtime payloads.

use super::sql::{ensure_connection_ready, parse_bool, parse_uuid};
use super::{RepoError, RepoResult};
use crate::model::board::{CardId, UserId};
use crate::model::comment::{Comment, CommentDraft};
use crate::model::vote::Vote;
use crate::realtime::{BadgeSource, CardBadges};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "comments",
        &["comment_uuid", "card_uuid", "author_uuid", "content"],
    ),
    (
        "votes",
        &["vote_uuid", "card_uuid", "author_uuid", "yes_or_no"],
    ),
];

/// Repository interface for card comments and votes.
pub trait CommentRepository {
    /// Validates and stores one comment.
    fn add_comment(&self, draft: &CommentDraft) -> RepoResult<Comment>;
    /// Lists a card's comments, oldest first.
    fn list_comments(&self, card_uuid: CardId) -> RepoResult<Vec<Comment>>;
    /// Stores one vote.
    fn cast_vote(&self, card_uuid: CardId, author_uuid: UserId, yes_or_no: bool)
        -> RepoResult<Vote>;
    /// Lists a card's votes, oldest first.
    fn list_votes(&self, card_uuid: CardId) -> RepoResult<Vec<Vote>>;
}

/// SQLite-backed comment/vote repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }

    fn ensure_card_exists(&self, card_uuid: CardId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cards WHERE card_uuid = ?1);",
            [card_uuid.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::CardNotFound(card_uuid));
        }
        Ok(())
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn add_comment(&self, draft: &CommentDraft) -> RepoResult<Comment> {
        draft.validate()?;
        self.ensure_card_exists(draft.card_uuid)?;

        let comment_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO comments (comment_uuid, card_uuid, author_uuid, content)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment_uuid.to_string(),
                draft.card_uuid.to_string(),
                draft.author_uuid.to_string(),
                draft.content.trim(),
            ],
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT comment_uuid, card_uuid, author_uuid, content, created_at, updated_at
             FROM comments
             WHERE comment_uuid = ?1;",
        )?;
        let mut rows = stmt.query([comment_uuid.to_string()])?;
        match rows.next()? {
            Some(row) => parse_comment_row(row),
            None => Err(RepoError::InvalidData(format!(
                "comment {comment_uuid} vanished after insert"
            ))),
        }
    }

    fn list_comments(&self, card_uuid: CardId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT comment_uuid, card_uuid, author_uuid, content, created_at, updated_at
             FROM comments
             WHERE card_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([card_uuid.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn cast_vote(
        &self,
        card_uuid: CardId,
        author_uuid: UserId,
        yes_or_no: bool,
    ) -> RepoResult<Vote> {
        self.ensure_card_exists(card_uuid)?;

        let vote_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO votes (vote_uuid, card_uuid, author_uuid, yes_or_no)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                vote_uuid.to_string(),
                card_uuid.to_string(),
                author_uuid.to_string(),
                i64::from(yes_or_no),
            ],
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT vote_uuid, card_uuid, author_uuid, yes_or_no, created_at, updated_at
             FROM votes
             WHERE vote_uuid = ?1;",
        )?;
        let mut rows = stmt.query([vote_uuid.to_string()])?;
        match rows.next()? {
            Some(row) => parse_vote_row(row),
            None => Err(RepoError::InvalidData(format!(
                "vote {vote_uuid} vanished after insert"
            ))),
        }
    }

    fn list_votes(&self, card_uuid: CardId) -> RepoResult<Vec<Vote>> {
        let mut stmt = self.conn.prepare(
            "SELECT vote_uuid, card_uuid, author_uuid, yes_or_no, created_at, updated_at
             FROM votes
             WHERE card_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([card_uuid.to_string()])?;
        let mut votes = Vec::new();
        while let Some(row) = rows.next()? {
            votes.push(parse_vote_row(row)?);
        }
        Ok(votes)
    }
}

impl BadgeSource for SqliteCommentRepository<'_> {
    fn card_badges(&self, card_uuid: CardId) -> RepoResult<CardBadges> {
        let (comments, votes_yes, votes_no, assignees): (i64, i64, i64, i64) = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM comments WHERE card_uuid = ?1),
                (SELECT COUNT(*) FROM votes WHERE card_uuid = ?1 AND yes_or_no = 1),
                (SELECT COUNT(*) FROM votes WHERE card_uuid = ?1 AND yes_or_no = 0),
                (SELECT COUNT(*) FROM card_assignees WHERE card_uuid = ?1);",
            [card_uuid.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(CardBadges {
            comments: count_to_u32(comments)?,
            votes_yes: count_to_u32(votes_yes)?,
            votes_no: count_to_u32(votes_no)?,
            assignees: count_to_u32(assignees)?,
        })
    }
}

fn count_to_u32(value: i64) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| RepoError::InvalidData(format!("invalid count `{value}`")))
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let comment_text: String = row.get("comment_uuid")?;
    let card_text: String = row.get("card_uuid")?;
    let author_text: String = row.get("author_uuid")?;
    Ok(Comment {
        comment_uuid: parse_uuid(&comment_text, "comments.comment_uuid")?,
        card_uuid: parse_uuid(&card_text, "comments.card_uuid")?,
        author_uuid: parse_uuid(&author_text, "comments.author_uuid")?,
        content: row.get("content")?,
        created_on: row.get("created_at")?,
        updated_on: row.get("updated_at")?,
    })
}

fn parse_vote_row(row: &Row<'_>) -> RepoResult<Vote> {
    let vote_text: String = row.get("vote_uuid")?;
    let card_text: String = row.get("card_uuid")?;
    let author_text: String = row.get("author_uuid")?;
    Ok(Vote {
        vote_uuid: parse_uuid(&vote_text, "votes.vote_uuid")?,
        card_uuid: parse_uuid(&card_text, "votes.card_uuid")?,
        author_uuid: parse_uuid(&author_text, "votes.author_uuid")?,
        yes_or_no: parse_bool(row.get("yes_or_no")?, "votes.yes_or_no")?,
        created_on: row.get("created_at")?,
        updated_on: row.get("updated_at")?,
    })
}
