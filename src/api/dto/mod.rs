//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire.

pub mod canvas_dto;
pub mod placement_dto;
pub mod snapshot_dto;

pub use canvas_dto::*;
pub use placement_dto::*;
pub use snapshot_dto::*;
