//! Headless testing support: Harness, scripted collaborators, fixtures.
//!
//! Use the [`Harness`] to drive an [`App`](crate::app::App) without a real
//! toolkit. [`ScriptedEngine`] answers queries from a script (including held
//! queries that resolve on demand) and [`RecordingRenderer`] captures what
//! cards were asked to draw.

pub mod fixtures;
pub mod harness;
pub mod scripted;

pub use harness::{local, Harness};
pub use scripted::{Gate, RecordingRenderer, ScriptedEngine};
