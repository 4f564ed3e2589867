//! Board domain model.
//!
//! # Responsibility
//! - Define boards, lists and cards plus the comment/vote records hung off cards.
//! - Keep identity types explicit in signatures.
//!
//! # Invariants
//! - A card's `board_uuid` always equals its owning list's `board_uuid`.
//! - Within one container, members are ranked by ascending `order`.

pub mod board;
pub mod comment;
pub mod vote;
