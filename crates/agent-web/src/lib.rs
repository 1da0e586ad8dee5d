//! stripe-agent Web Frontend
//!
//! Leptos WASM chat page: one text box per turn, replies rendered in order,
//! and a QR code under any reply that carries a checkout link.

mod api;
mod app;
mod components;
mod pages;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
