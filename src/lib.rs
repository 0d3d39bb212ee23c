//! # gilt-compose
//!
//! A declarative, data-driven module composition engine.
//!
//! An application is described as a tree of typed modules (controllers,
//! windows, layouts, content groups, arrangements, cards, selections, filters
//! and orders) loaded from a JSON descriptor. The factory validates the tree
//! against each module type's declared slots and references, builds it
//! children-first, and hands every module the same [`AppContext`](module::AppContext).
//! Selections then page through an asynchronous content engine, refreshing
//! themselves when navigation history or filter state changes.
//!
//! ## Core Systems
//!
//! - **[`module`]**: descriptors, module classes, the warehouse, the factory and the module tree
//! - **[`selection`]**: the paginated, multi-query selection state machine and its async loader
//! - **[`filter`]** / **[`order`]**: record predicates and comparators with query pushdown
//! - **[`history`]**: the navigation history store and controller policies
//! - **[`event`]**: emitters, the action vocabulary and the FIFO dispatcher
//! - **[`content`]**: records, queries, the content engine and reading history collaborators
//! - **[`components`]**: presentation-facing modules
//! - **[`app`]**: application struct tying everything together
//! - **[`testing`]**: headless harness and scripted collaborators

extern crate self as gilt_compose;

// Foundation
pub mod config;
pub mod error;
pub mod telemetry;

// Content and events
pub mod content;
pub mod event;
pub mod history;

// Modules
pub mod components;
pub mod filter;
pub mod module;
pub mod order;
pub mod selection;

// Application
pub mod app;
pub mod testing;

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use gilt_compose_macros::descriptor;
