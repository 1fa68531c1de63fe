//! # Core Browser Logic
//!
//! This module contains Burrow's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • TreeMirror (data)    │
//!                    │  • Navigator (cursor)   │
//!                    │  • Edit engine          │
//!                    │  • handle_key (reducer) │
//!                    └───────────┬─────────────┘
//!                                │ Store traits
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │ RedbStore  │      │  MemStore  │
//!     │  Adapter   │      │  (files)   │      │  (tests,   │
//!     │ (ratatui)  │      │            │      │   errors)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tree`]: lazily loaded mirror of the bucket hierarchy
//! - [`view`]: flattens the expanded mirror into display rows
//! - [`navigator`]: cursor, scroll and expansion
//! - [`edit`]: create/rename/delete/edit-value against the store
//! - [`state`]: the `Browser` struct, all session state in one place
//! - [`action`]: logical keys and the `handle_key` reducer
//! - [`export`]: value and JSON subtree export
//! - [`config`]: settings with defaults → file → env → CLI resolution

pub mod action;
pub mod config;
pub mod edit;
pub mod export;
pub mod navigator;
pub mod state;
pub mod tree;
pub mod view;

pub use action::{Action, UiState};
pub use state::Browser;
