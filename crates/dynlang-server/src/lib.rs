//! HTTP/JSON editing server for dynamic diagram languages.
//!
//! Clients open a session per diagram, load a language and a source model
//! through the configured collaborators, then send one operation per request
//! and get the re-rendered visual tree back. This crate contains the session
//! registry, the shared language cache, API schema types, error handling and
//! route definitions.

pub mod cache;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod session;
pub mod state;
