//! # client
//!
//! Browser front-end for formbase, built with Leptos.
//!
//! SYSTEM CONTEXT
//! ==============
//! All session behavior lives in the `session` crate. This crate supplies
//! the browser pieces it needs (a `localStorage` token store and a
//! `gloo-net` transport), mirrors session transitions into a reactive
//! signal, and renders the pages.
//!
//! The `csr` feature enables the WASM entry point and every browser API
//! call; without it the crate builds natively so pure helpers can be
//! unit-tested.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install logging and mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(app::App);
}
