//! Inbound move operations from connected board sessions.
//!
//! # Responsibility
//! - Decode `move-card` / `move-list` payloads.
//! - Run the matching pipeline and publish its events.
//!
//! # Invariants
//! - No event is published unless the pipeline succeeded.
//! - Replies never carry internal error detail; failures are logged instead.

use crate::model::board::CardId;
use crate::realtime::{
    plan_card_events, plan_list_events, BadgeSource, CardBadges, MoveEvent, Notifier,
};
use crate::repo::board_repo::BoardRepository;
use crate::service::move_service::{MoveCardRequest, MoveError, MoveListRequest, MoveService};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MOVE_CARD_OPERATION: &str = "move-card";
pub const MOVE_LIST_OPERATION: &str = "move-list";

/// Message returned to clients for any failed operation.
pub const OPERATION_FAILED: &str = "operation failed";

/// Reply sent back to the requesting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GatewayReply {
    fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed() -> Self {
        Self {
            ok: false,
            error: Some(OPERATION_FAILED.to_string()),
        }
    }
}

/// Internal dispatch failures. Only logged, never sent to clients.
#[derive(Debug)]
pub enum GatewayError {
    UnknownOperation(String),
    MalformedPayload(serde_json::Error),
    Move(MoveError),
    Encode(serde_json::Error),
}

impl GatewayError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "unknown_operation",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::Move(err) => err.code(),
            Self::Encode(_) => "encode_failed",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOperation(name) => write!(f, "unknown operation `{name}`"),
            Self::MalformedPayload(err) => write!(f, "malformed payload: {err}"),
            Self::Move(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode event payload: {err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownOperation(_) => None,
            Self::MalformedPayload(err) => Some(err),
            Self::Move(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<MoveError> for GatewayError {
    fn from(value: MoveError) -> Self {
        Self::Move(value)
    }
}

/// Session-facing entry point for move operations.
pub struct MoveGateway<R: BoardRepository, B: BadgeSource, N: Notifier> {
    service: MoveService<R>,
    badges: B,
    notifier: N,
}

impl<R: BoardRepository, B: BadgeSource, N: Notifier> MoveGateway<R, B, N> {
    pub fn new(service: MoveService<R>, badges: B, notifier: N) -> Self {
        Self {
            service,
            badges,
            notifier,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn service(&self) -> &MoveService<R> {
        &self.service
    }

    /// Handles one inbound operation with an already-decoded JSON payload.
    pub fn handle(&self, operation: &str, payload: Value) -> GatewayReply {
        match self.dispatch(operation, payload) {
            Ok(events) => {
                for event in &events {
                    self.notifier.publish(event);
                }
                info!(
                    "event=gateway_dispatch module=gateway status=ok operation={} published={}",
                    operation,
                    events.len()
                );
                GatewayReply::success()
            }
            Err(err) => {
                error!(
                    "event=gateway_dispatch module=gateway status=error operation={} error_code={} error={}",
                    operation,
                    err.code(),
                    err
                );
                GatewayReply::failed()
            }
        }
    }

    /// Handles one inbound operation with a raw JSON payload.
    pub fn handle_json(&self, operation: &str, payload: &str) -> GatewayReply {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => self.handle(operation, value),
            Err(err) => {
                error!(
                    "event=gateway_dispatch module=gateway status=error operation={} error_code=malformed_payload error={}",
                    operation, err
                );
                GatewayReply::failed()
            }
        }
    }

    fn dispatch(&self, operation: &str, payload: Value) -> Result<Vec<MoveEvent>, GatewayError> {
        match operation {
            MOVE_CARD_OPERATION => {
                let request: MoveCardRequest =
                    serde_json::from_value(payload).map_err(GatewayError::MalformedPayload)?;
                let moved = self.service.move_card(&request)?;
                let badges = self.badges_for(moved.updated.card_uuid);
                plan_card_events(&moved, &badges).map_err(GatewayError::Encode)
            }
            MOVE_LIST_OPERATION => {
                let request: MoveListRequest =
                    serde_json::from_value(payload).map_err(GatewayError::MalformedPayload)?;
                let moved = self.service.move_list(&request)?;
                plan_list_events(&moved).map_err(GatewayError::Encode)
            }
            other => Err(GatewayError::UnknownOperation(other.to_string())),
        }
    }

    fn badges_for(&self, card_uuid: CardId) -> CardBadges {
        match self.badges.card_badges(card_uuid) {
            Ok(badges) => badges,
            Err(err) => {
                // The move is already committed; ship the event without counters.
                warn!(
                    "event=card_badges module=gateway status=error card={} error={}",
                    card_uuid, err
                );
                CardBadges::default()
            }
        }
    }
}
