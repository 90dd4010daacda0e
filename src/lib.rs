//! Console chat client for the Acme Tech Solutions RAG backend.
//!
//! The core is the conversation state machine: an append-only
//! [`conversation::Conversation`] log and an
//! [`coordinator::ExchangeCoordinator`] that turns each submitted
//! question into exactly one request/response exchange and exactly one
//! outcome entry. The [`console`] module is a thin renderer over that
//! core; [`backend`] owns the HTTP/JSON wire format.

pub mod backend;
pub mod config;
pub mod console;
pub mod conversation;
pub mod coordinator;
pub mod demo;
pub mod error;
pub mod logger;
