//! API schema types for request/response definitions.
//!
//! Each sub-module defines the request and response types for one API area.
//! Field names are camelCase on the wire.

pub mod language;
pub mod model;
pub mod render;
pub mod sessions;
