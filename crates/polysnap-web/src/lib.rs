//! PolySnap for the Waze Map Editor
//!
//! WebAssembly shell around `polysnap-core`: a host adapter over the
//! editor's page objects, timers and notification hooks, the on/off
//! button, and bootstrap against page load.

mod style;

pub use style::{BUTTON_ID, ToggleStyle, toggle_style};

/// Product name shown in the button title and log lines.
pub const SCRIPT_NAME: &str = "WME Polygon Snap";

#[cfg(target_arch = "wasm32")]
mod button;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod js;
#[cfg(target_arch = "wasm32")]
mod runtime;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use host::{JsBehavior, JsHost, JsLayer};
#[cfg(target_arch = "wasm32")]
pub use web::start;
