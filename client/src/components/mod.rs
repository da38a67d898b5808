//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read shared state from Leptos context providers installed by
//! `app.rs`; none of them writes session state directly.

pub mod nav;
pub mod route_guard;
