//! Board/list/card repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the fetch/update surface used by the move pipelines.
//! - Keep list relocation and its card cascade in one transaction.
//!
//! # Invariants
//! - New lists and cards are appended `ORDER_GAP` past the current tail.
//! - `move_list_with_cards` either rewrites the list and every child card's
//!   board reference, or changes nothing.
//! - Card assignees are returned sorted by user id.

use super::sql::{ensure_connection_ready, parse_uuid};
use super::{RepoError, RepoResult};
use crate::model::board::{Board, BoardId, BoardList, Card, CardId, ListId, UserId};
use crate::order::ORDER_GAP;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    list_uuid,
    board_uuid,
    title,
    sort_order,
    created_at,
    updated_at
FROM lists";

const CARD_SELECT_SQL: &str = "SELECT
    card_uuid,
    list_uuid,
    board_uuid,
    title,
    sort_order,
    created_at,
    updated_at
FROM cards";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("boards", &["board_uuid", "title", "created_at", "updated_at"]),
    ("lists", &["list_uuid", "board_uuid", "title", "sort_order"]),
    (
        "cards",
        &["card_uuid", "list_uuid", "board_uuid", "title", "sort_order"],
    ),
    ("card_assignees", &["card_uuid", "user_uuid"]),
];

/// Result of relocating a list together with its cards.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRelocation {
    /// List state after the update.
    pub list: BoardList,
    /// Number of child cards whose board reference was rewritten.
    pub cascaded_cards: usize,
}

/// Repository interface for board hierarchy operations.
pub trait BoardRepository {
    /// Creates one empty board.
    fn create_board(&self, title: &str) -> RepoResult<Board>;
    /// Loads one board by id.
    fn get_board(&self, board_uuid: BoardId) -> RepoResult<Option<Board>>;
    /// Creates one list at the tail of `board_uuid`.
    fn create_list(&self, board_uuid: BoardId, title: &str) -> RepoResult<BoardList>;
    /// Loads one list by id.
    fn get_list(&self, list_uuid: ListId) -> RepoResult<Option<BoardList>>;
    /// Lists a board's lists in rank order.
    fn lists_in_board(&self, board_uuid: BoardId) -> RepoResult<Vec<BoardList>>;
    /// Ascending order keys of a board's lists.
    fn list_orders_in_board(&self, board_uuid: BoardId) -> RepoResult<Vec<f64>>;
    /// Creates one card at the tail of `list_uuid`, on the list's board.
    fn create_card(&self, list_uuid: ListId, title: &str) -> RepoResult<Card>;
    /// Loads one card by id, including assignees.
    fn get_card(&self, card_uuid: CardId) -> RepoResult<Option<Card>>;
    /// Lists a list's cards in rank order.
    fn cards_in_list(&self, list_uuid: ListId) -> RepoResult<Vec<Card>>;
    /// Ascending order keys of a list's cards.
    fn card_orders_in_list(&self, list_uuid: ListId) -> RepoResult<Vec<f64>>;
    /// Assigns one user to a card. Assigning twice is a no-op.
    fn add_card_assignee(&self, card_uuid: CardId, user_uuid: UserId) -> RepoResult<()>;
    /// Rewrites a card's container references and order key.
    fn update_card_placement(
        &self,
        card_uuid: CardId,
        list_uuid: ListId,
        board_uuid: BoardId,
        order: f64,
    ) -> RepoResult<Card>;
    /// Removes every assignee from a card.
    fn clear_card_assignees(&self, card_uuid: CardId) -> RepoResult<Card>;
    /// Rewrites a list's board and order key and moves its cards along.
    fn move_list_with_cards(
        &self,
        list_uuid: ListId,
        board_uuid: BoardId,
        order: f64,
    ) -> RepoResult<ListRelocation>;
    /// Counts cards of `list_uuid` whose board differs from `board_uuid`.
    fn count_cards_off_board(&self, list_uuid: ListId, board_uuid: BoardId) -> RepoResult<usize>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, title: &str) -> RepoResult<Board> {
        let board_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO boards (board_uuid, title) VALUES (?1, ?2);",
            params![board_uuid.to_string(), title],
        )?;
        self.get_board(board_uuid)?
            .ok_or(RepoError::BoardNotFound(board_uuid))
    }

    fn get_board(&self, board_uuid: BoardId) -> RepoResult<Option<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT board_uuid, title, created_at, updated_at
             FROM boards
             WHERE board_uuid = ?1;",
        )?;
        let mut rows = stmt.query([board_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            let id_text: String = row.get("board_uuid")?;
            return Ok(Some(Board {
                board_uuid: parse_uuid(&id_text, "boards.board_uuid")?,
                title: row.get("title")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            }));
        }
        Ok(None)
    }

    fn create_list(&self, board_uuid: BoardId, title: &str) -> RepoResult<BoardList> {
        if self.get_board(board_uuid)?.is_none() {
            return Err(RepoError::BoardNotFound(board_uuid));
        }

        let list_uuid = Uuid::new_v4();
        let sort_order: f64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + ?2
             FROM lists
             WHERE board_uuid = ?1;",
            params![board_uuid.to_string(), ORDER_GAP],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO lists (list_uuid, board_uuid, title, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                list_uuid.to_string(),
                board_uuid.to_string(),
                title,
                sort_order
            ],
        )?;
        load_required_list(self.conn, list_uuid)
    }

    fn get_list(&self, list_uuid: ListId) -> RepoResult<Option<BoardList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIST_SELECT_SQL} WHERE list_uuid = ?1;"))?;
        let mut rows = stmt.query([list_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    fn lists_in_board(&self, board_uuid: BoardId) -> RepoResult<Vec<BoardList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE board_uuid = ?1
             ORDER BY sort_order ASC, list_uuid ASC;"
        ))?;
        let mut rows = stmt.query([board_uuid.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }

    fn list_orders_in_board(&self, board_uuid: BoardId) -> RepoResult<Vec<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT sort_order
             FROM lists
             WHERE board_uuid = ?1
             ORDER BY sort_order ASC, list_uuid ASC;",
        )?;
        let orders = stmt
            .query_map([board_uuid.to_string()], |row| row.get::<_, f64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    fn create_card(&self, list_uuid: ListId, title: &str) -> RepoResult<Card> {
        let list = self
            .get_list(list_uuid)?
            .ok_or(RepoError::ListNotFound(list_uuid))?;

        let card_uuid = Uuid::new_v4();
        let sort_order: f64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + ?2
             FROM cards
             WHERE list_uuid = ?1;",
            params![list_uuid.to_string(), ORDER_GAP],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO cards (card_uuid, list_uuid, board_uuid, title, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                card_uuid.to_string(),
                list_uuid.to_string(),
                list.board_uuid.to_string(),
                title,
                sort_order
            ],
        )?;
        load_required_card(self.conn, card_uuid)
    }

    fn get_card(&self, card_uuid: CardId) -> RepoResult<Option<Card>> {
        load_card(self.conn, card_uuid)
    }

    fn cards_in_list(&self, list_uuid: ListId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE list_uuid = ?1
             ORDER BY sort_order ASC, card_uuid ASC;"
        ))?;
        let mut rows = stmt.query([list_uuid.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        for card in &mut cards {
            card.assignees = load_assignees(self.conn, card.card_uuid)?;
        }
        Ok(cards)
    }

    fn card_orders_in_list(&self, list_uuid: ListId) -> RepoResult<Vec<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT sort_order
             FROM cards
             WHERE list_uuid = ?1
             ORDER BY sort_order ASC, card_uuid ASC;",
        )?;
        let orders = stmt
            .query_map([list_uuid.to_string()], |row| row.get::<_, f64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    fn add_card_assignee(&self, card_uuid: CardId, user_uuid: UserId) -> RepoResult<()> {
        if load_card(self.conn, card_uuid)?.is_none() {
            return Err(RepoError::CardNotFound(card_uuid));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO card_assignees (card_uuid, user_uuid) VALUES (?1, ?2);",
            params![card_uuid.to_string(), user_uuid.to_string()],
        )?;
        Ok(())
    }

    fn update_card_placement(
        &self,
        card_uuid: CardId,
        list_uuid: ListId,
        board_uuid: BoardId,
        order: f64,
    ) -> RepoResult<Card> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET list_uuid = ?2,
                 board_uuid = ?3,
                 sort_order = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE card_uuid = ?1;",
            params![
                card_uuid.to_string(),
                list_uuid.to_string(),
                board_uuid.to_string(),
                order
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(card_uuid));
        }
        load_required_card(self.conn, card_uuid)
    }

    fn clear_card_assignees(&self, card_uuid: CardId) -> RepoResult<Card> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM card_assignees WHERE card_uuid = ?1;",
            [card_uuid.to_string()],
        )?;
        let changed = tx.execute(
            "UPDATE cards
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE card_uuid = ?1;",
            [card_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(card_uuid));
        }
        tx.commit()?;
        load_required_card(self.conn, card_uuid)
    }

    fn move_list_with_cards(
        &self,
        list_uuid: ListId,
        board_uuid: BoardId,
        order: f64,
    ) -> RepoResult<ListRelocation> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE lists
             SET board_uuid = ?2,
                 sort_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE list_uuid = ?1;",
            params![list_uuid.to_string(), board_uuid.to_string(), order],
        )?;
        if changed == 0 {
            return Err(RepoError::ListNotFound(list_uuid));
        }

        let cascaded_cards = tx.execute(
            "UPDATE cards
             SET board_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE list_uuid = ?1
               AND board_uuid <> ?2;",
            params![list_uuid.to_string(), board_uuid.to_string()],
        )?;
        tx.commit()?;

        Ok(ListRelocation {
            list: load_required_list(self.conn, list_uuid)?,
            cascaded_cards,
        })
    }

    fn count_cards_off_board(&self, list_uuid: ListId, board_uuid: BoardId) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM cards
             WHERE list_uuid = ?1
               AND board_uuid <> ?2;",
            params![list_uuid.to_string(), board_uuid.to_string()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative card count `{count}`")))
    }
}

fn load_required_list(conn: &Connection, list_uuid: ListId) -> RepoResult<BoardList> {
    let mut stmt = conn.prepare(&format!("{LIST_SELECT_SQL} WHERE list_uuid = ?1;"))?;
    let mut rows = stmt.query([list_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_list_row(row);
    }
    Err(RepoError::ListNotFound(list_uuid))
}

fn load_card(conn: &Connection, card_uuid: CardId) -> RepoResult<Option<Card>> {
    let mut stmt = conn.prepare(&format!("{CARD_SELECT_SQL} WHERE card_uuid = ?1;"))?;
    let mut rows = stmt.query([card_uuid.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut card = parse_card_row(row)?;
    card.assignees = load_assignees(conn, card_uuid)?;
    Ok(Some(card))
}

fn load_required_card(conn: &Connection, card_uuid: CardId) -> RepoResult<Card> {
    load_card(conn, card_uuid)?.ok_or(RepoError::CardNotFound(card_uuid))
}

fn load_assignees(conn: &Connection, card_uuid: CardId) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_uuid
         FROM card_assignees
         WHERE card_uuid = ?1
         ORDER BY user_uuid ASC;",
    )?;
    let mut rows = stmt.query([card_uuid.to_string()])?;
    let mut assignees = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        assignees.push(parse_uuid(&value, "card_assignees.user_uuid")?);
    }
    Ok(assignees)
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<BoardList> {
    let list_text: String = row.get("list_uuid")?;
    let board_text: String = row.get("board_uuid")?;
    Ok(BoardList {
        list_uuid: parse_uuid(&list_text, "lists.list_uuid")?,
        board_uuid: parse_uuid(&board_text, "lists.board_uuid")?,
        title: row.get("title")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let card_text: String = row.get("card_uuid")?;
    let list_text: String = row.get("list_uuid")?;
    let board_text: String = row.get("board_uuid")?;
    Ok(Card {
        card_uuid: parse_uuid(&card_text, "cards.card_uuid")?,
        list_uuid: parse_uuid(&list_text, "cards.list_uuid")?,
        board_uuid: parse_uuid(&board_text, "cards.board_uuid")?,
        title: row.get("title")?,
        order: row.get("sort_order")?,
        assignees: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
