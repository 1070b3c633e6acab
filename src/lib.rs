//! # pixel-canvas
//!
//! A collaborative pixel canvas: a fixed-size grid that many users paint
//! concurrently, one pixel per user per cooldown interval.
//!
//! The server side owns the authoritative grid, per-user cooldowns, the
//! placement log and a weekly snapshot archive, and exposes them over a
//! REST API. The client side provides the viewport engine, a placement
//! session and a polling sync loop.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP polling)          client/ (viewport, session, sync)
//!     │                                 │
//!     ├── REST Handlers (api/)  ◄───────┘ HttpCanvasApi
//!     │
//!     ├── PlacementService (service/)    only writer of the grid
//!     ├── SnapshotScheduler (service/)   one snapshot per ISO week
//!     │
//!     ├── Grid, CooldownGate (domain/)
//!     │
//!     └── CanvasStore (persistence/)     memory, JSON files or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
