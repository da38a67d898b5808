//! Reactive UI state shared through Leptos context.

pub mod auth;
