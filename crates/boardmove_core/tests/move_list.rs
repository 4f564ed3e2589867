use boardmove_core::db::open_db_in_memory;
use boardmove_core::{
    BoardList, BoardRepository, MoveError, MoveListRequest, MoveService, SqliteBoardRepository,
    ORDER_GAP,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn set_list_order(conn: &Connection, list: &BoardList, order: f64) {
    conn.execute(
        "UPDATE lists SET sort_order = ?2 WHERE list_uuid = ?1;",
        params![list.list_uuid.to_string(), order],
    )
    .unwrap();
}

fn request(list: &BoardList, board_id: Uuid, position: i64) -> MoveListRequest {
    MoveListRequest {
        list_id: list.list_uuid,
        board_id,
        position,
    }
}

#[test]
fn cross_board_move_takes_midpoint_and_carries_cards() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();

    let origin = repo.create_board("Origin").unwrap();
    let destination = repo.create_board("Destination").unwrap();
    let first = repo.create_list(destination.board_uuid, "First").unwrap();
    let second = repo.create_list(destination.board_uuid, "Second").unwrap();
    set_list_order(&conn, &first, 50.0);
    set_list_order(&conn, &second, 150.0);

    let moving = repo.create_list(origin.board_uuid, "Moving").unwrap();
    for title in ["a", "b", "c"] {
        repo.create_card(moving.list_uuid, title).unwrap();
    }

    let moved = service
        .move_list(&request(&moving, destination.board_uuid, 2))
        .unwrap();

    assert_eq!(moved.updated.order, 100.0);
    assert_eq!(moved.updated.board_uuid, destination.board_uuid);
    assert_eq!(moved.cascaded_cards, 3);
    assert!(moved.crossed_board());

    let cards = repo.cards_in_list(moving.list_uuid).unwrap();
    assert_eq!(cards.len(), 3);
    assert!(cards
        .iter()
        .all(|card| card.board_uuid == destination.board_uuid));

    let titles: Vec<String> = repo
        .lists_in_board(destination.board_uuid)
        .unwrap()
        .into_iter()
        .map(|list| list.title)
        .collect();
    assert_eq!(titles, vec!["First", "Moving", "Second"]);
    assert!(repo.lists_in_board(origin.board_uuid).unwrap().is_empty());
}

#[test]
fn same_board_reorder_leaves_cards_alone() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();

    let board = repo.create_board("Board").unwrap();
    let lists: Vec<BoardList> = ["one", "two", "three"]
        .iter()
        .zip([100.0, 200.0, 300.0])
        .map(|(title, order)| {
            let list = repo.create_list(board.board_uuid, title).unwrap();
            set_list_order(&conn, &list, order);
            list
        })
        .collect();
    repo.create_card(lists[0].list_uuid, "card").unwrap();

    let moved = service
        .move_list(&request(&lists[0], board.board_uuid, 2))
        .unwrap();

    assert_eq!(moved.updated.order, 250.0);
    assert_eq!(moved.cascaded_cards, 0);
    assert!(!moved.crossed_board());

    let titles: Vec<String> = repo
        .lists_in_board(board.board_uuid)
        .unwrap()
        .into_iter()
        .map(|list| list.title)
        .collect();
    assert_eq!(titles, vec!["two", "one", "three"]);
}

#[test]
fn move_to_empty_board_adds_gap_to_current_order() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();

    let origin = repo.create_board("Origin").unwrap();
    let empty = repo.create_board("Empty").unwrap();
    let list = repo.create_list(origin.board_uuid, "List").unwrap();

    let moved = service
        .move_list(&request(&list, empty.board_uuid, 1))
        .unwrap();

    assert_eq!(moved.updated.order, list.order + ORDER_GAP);
    assert_eq!(moved.original, list);
    assert_eq!(moved.cascaded_cards, 0);
}

#[test]
fn missing_list_is_not_found() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let board = service.repo().create_board("Board").unwrap();
    let missing = Uuid::new_v4();

    let err = service
        .move_list(&MoveListRequest {
            list_id: missing,
            board_id: board.board_uuid,
            position: 1,
        })
        .unwrap_err();
    assert!(matches!(err, MoveError::ListNotFound(id) if id == missing));
}

#[test]
fn missing_destination_board_is_not_found() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();
    let board = repo.create_board("Board").unwrap();
    let list = repo.create_list(board.board_uuid, "List").unwrap();
    let missing = Uuid::new_v4();

    let err = service.move_list(&request(&list, missing, 1)).unwrap_err();
    assert!(matches!(err, MoveError::BoardNotFound(id) if id == missing));
    assert_eq!(repo.get_list(list.list_uuid).unwrap().unwrap(), list);
}

#[test]
fn colliding_list_orders_leave_list_in_place() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();

    let origin = repo.create_board("Origin").unwrap();
    let destination = repo.create_board("Destination").unwrap();
    for title in ["left", "right"] {
        let list = repo.create_list(destination.board_uuid, title).unwrap();
        set_list_order(&conn, &list, 10.0);
    }
    let list = repo.create_list(origin.board_uuid, "List").unwrap();

    let err = service
        .move_list(&request(&list, destination.board_uuid, 2))
        .unwrap_err();
    assert!(matches!(err, MoveError::InvalidOrderingState(_)));
    assert_eq!(repo.get_list(list.list_uuid).unwrap().unwrap(), list);
}

#[test]
fn cards_left_on_old_board_are_reported() {
    let conn = setup();
    let service = MoveService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let repo = service.repo();

    let origin = repo.create_board("Origin").unwrap();
    let destination = repo.create_board("Destination").unwrap();
    let list = repo.create_list(origin.board_uuid, "List").unwrap();
    repo.create_card(list.list_uuid, "stuck").unwrap();
    repo.create_card(list.list_uuid, "also stuck").unwrap();

    conn.execute_batch(
        "CREATE TRIGGER pin_card_board
         AFTER UPDATE OF board_uuid ON cards
         BEGIN
             UPDATE cards SET board_uuid = OLD.board_uuid WHERE card_uuid = NEW.card_uuid;
         END;",
    )
    .unwrap();

    let err = service
        .move_list(&request(&list, destination.board_uuid, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        MoveError::PartialCascadeFailure { stray_cards: 2, .. }
    ));
    assert_eq!(err.code(), "partial_cascade_failure");
}
