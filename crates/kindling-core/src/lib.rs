//! Core utilities shared across the Kindling widget toolkit.
//!
//! This crate carries the pieces every other crate leans on: geometry value
//! types, colors, optimized hash collections, logging setup, and the
//! main-thread dispatch queue used to marshal background work onto the UI
//! thread.

pub mod alloc;
pub mod color;
pub mod dispatch;
pub mod geometry;
pub mod logging;

pub use color::Color;
pub use dispatch::{DispatchHandle, MainDispatcher};
pub use geometry::{Pos, Rect, Size};
