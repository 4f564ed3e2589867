//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the card/list move pipelines.
//! - Keep transport layers decoupled from storage details.

pub mod move_service;
