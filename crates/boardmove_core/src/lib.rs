//! Core domain logic for board/list/card moves.
//! This crate owns the order-key allocation rules and the move pipelines.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod order;
pub mod realtime;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use gateway::{GatewayReply, MoveGateway, MOVE_CARD_OPERATION, MOVE_LIST_OPERATION};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::board::{Board, BoardId, BoardList, Card, CardId, ListId, UserId};
pub use model::comment::{Comment, CommentDraft, CommentValidationError};
pub use model::vote::Vote;
pub use order::{allocate, AllocationError, ORDER_GAP};
pub use realtime::{
    board_room, BadgeSource, CardBadges, EventScope, MoveEvent, Notifier, RecordingNotifier,
};
pub use repo::board_repo::{BoardRepository, ListRelocation, SqliteBoardRepository};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::{RepoError, RepoResult};
pub use service::move_service::{
    AssigneePolicy, CardMove, ListMove, MoveCardRequest, MoveError, MoveListRequest, MoveService,
};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
