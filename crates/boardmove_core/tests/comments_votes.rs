use boardmove_core::db::open_db_in_memory;
use boardmove_core::{
    BadgeSource, BoardRepository, Card, CardBadges, CommentDraft, CommentRepository,
    CommentValidationError, RepoError, SqliteBoardRepository, SqliteCommentRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_card(conn: &Connection) -> Card {
    let boards = SqliteBoardRepository::try_new(conn).unwrap();
    let board = boards.create_board("Board").unwrap();
    let list = boards.create_list(board.board_uuid, "List").unwrap();
    boards.create_card(list.list_uuid, "Card").unwrap()
}

#[test]
fn comments_are_trimmed_and_listed_oldest_first() {
    let conn = setup();
    let card = seed_card(&conn);
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let author = Uuid::new_v4();

    let first = repo
        .add_comment(&CommentDraft::new(card.card_uuid, author, "  first  "))
        .unwrap();
    repo.add_comment(&CommentDraft::new(card.card_uuid, author, "second"))
        .unwrap();

    assert_eq!(first.content, "first");
    assert_eq!(first.author_uuid, author);
    assert!(first.updated_on.is_none());

    let contents: Vec<String> = repo
        .list_comments(card.card_uuid)
        .unwrap()
        .into_iter()
        .map(|comment| comment.content)
        .collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[test]
fn blank_comment_is_rejected() {
    let conn = setup();
    let card = seed_card(&conn);
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();

    let err = repo
        .add_comment(&CommentDraft::new(card.card_uuid, Uuid::new_v4(), "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CommentValidationError::BlankContent)
    ));
    assert!(repo.list_comments(card.card_uuid).unwrap().is_empty());
}

#[test]
fn comment_on_missing_card_is_not_found() {
    let conn = setup();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = repo
        .add_comment(&CommentDraft::new(missing, Uuid::new_v4(), "hello"))
        .unwrap_err();
    assert!(matches!(err, RepoError::CardNotFound(id) if id == missing));

    let err = repo.cast_vote(missing, Uuid::new_v4(), true).unwrap_err();
    assert!(matches!(err, RepoError::CardNotFound(id) if id == missing));
}

#[test]
fn votes_keep_their_direction() {
    let conn = setup();
    let card = seed_card(&conn);
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();

    let yes = repo.cast_vote(card.card_uuid, Uuid::new_v4(), true).unwrap();
    let no = repo.cast_vote(card.card_uuid, Uuid::new_v4(), false).unwrap();
    assert!(yes.yes_or_no);
    assert!(!no.yes_or_no);

    let directions: Vec<bool> = repo
        .list_votes(card.card_uuid)
        .unwrap()
        .into_iter()
        .map(|vote| vote.yes_or_no)
        .collect();
    assert_eq!(directions, vec![true, false]);
}

#[test]
fn badges_count_comments_votes_and_assignees() {
    let conn = setup();
    let card = seed_card(&conn);
    let boards = SqliteBoardRepository::try_new(&conn).unwrap();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();

    assert_eq!(
        repo.card_badges(card.card_uuid).unwrap(),
        CardBadges::default()
    );

    let author = Uuid::new_v4();
    repo.add_comment(&CommentDraft::new(card.card_uuid, author, "one"))
        .unwrap();
    repo.add_comment(&CommentDraft::new(card.card_uuid, author, "two"))
        .unwrap();
    repo.cast_vote(card.card_uuid, author, true).unwrap();
    repo.cast_vote(card.card_uuid, Uuid::new_v4(), true).unwrap();
    repo.cast_vote(card.card_uuid, Uuid::new_v4(), false).unwrap();
    boards.add_card_assignee(card.card_uuid, author).unwrap();

    assert_eq!(
        repo.card_badges(card.card_uuid).unwrap(),
        CardBadges {
            comments: 2,
            votes_yes: 2,
            votes_no: 1,
            assignees: 1,
        }
    );
}
