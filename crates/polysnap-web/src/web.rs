//! WebAssembly entry point and bootstrap against page load.

use crate::host::JsHost;
use crate::{SCRIPT_NAME, button, js, runtime};
use polysnap_core::{Retry, RetryDecision, SnapConfig, SnapEngine};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Page-level property holding an optional configuration override.
const CONFIG_GLOBAL: &str = "polygonSnapConfig";

/// Run `f` once after `delay`.
pub fn set_timeout(delay: Duration, f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        log::warn!("No window object, cannot schedule timer");
        return;
    };
    let callback = Closure::once_into_js(f);
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
    {
        log::warn!("setTimeout failed: {:?}", e);
    }
}

/// Read the override object if the page defines one.
fn load_config() -> SnapConfig {
    let global: JsValue = js_sys::global().into();
    let Some(value) = js::get(&global, CONFIG_GLOBAL) else {
        return SnapConfig::default();
    };
    let parsed = serde_wasm_bindgen::from_value::<SnapConfig>(value)
        .map_err(|e| e.to_string())
        .and_then(|config| config.validate().map(|_| config).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => {
            log::info!("Using configuration from {}", CONFIG_GLOBAL);
            config
        }
        Err(e) => {
            log::warn!("Ignoring {}: {}", CONFIG_GLOBAL, e);
            SnapConfig::default()
        }
    }
}

fn wait_for_editor(config: SnapConfig, mut retry: Retry) {
    match JsHost::connect() {
        Ok(host) => {
            log::info!("[{}] v{} editor loaded, initializing", SCRIPT_NAME, env!("CARGO_PKG_VERSION"));
            let retry = Retry::new(Duration::from_millis(config.map_retry_ms), config.bootstrap_max_attempts);
            wait_for_map(host, config, retry);
        }
        Err(e) => match retry.failed() {
            RetryDecision::RetryAfter(delay) => {
                log::debug!("Editor not ready ({}), retry {}", e, retry.attempts());
                set_timeout(delay, move || wait_for_editor(config, retry));
            }
            RetryDecision::GiveUp => {
                log::warn!("[{}] Editor never became ready ({}), giving up", SCRIPT_NAME, e);
            }
        },
    }
}

fn wait_for_map(host: JsHost, config: SnapConfig, mut retry: Retry) {
    if host.ol_map().is_none() {
        match retry.failed() {
            RetryDecision::RetryAfter(delay) => {
                log::warn!("[{}] Map not accessible, retrying in {:?}", SCRIPT_NAME, delay);
                set_timeout(delay, move || wait_for_map(host, config, retry));
            }
            RetryDecision::GiveUp => {
                log::warn!("[{}] Map never became accessible, giving up", SCRIPT_NAME);
            }
        }
        return;
    }

    log::info!("[{}] Map ready, {} layers", SCRIPT_NAME, host.layer_count());
    let engine = runtime::install(SnapEngine::new(host, config));

    match web_sys::window().and_then(|window| window.document()) {
        Some(document) => {
            if let Err(e) = button::install(&document, &engine) {
                log::warn!("Failed to create toggle button: {:?}", e);
            }
        }
        None => log::warn!("No document, toggle button unavailable"),
    }

    log::info!("[{}] Ready", SCRIPT_NAME);
}

/// Initialize and start waiting for the editor.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger init failed: {}", e)));
    }

    log::info!("[{}] Waiting for editor", SCRIPT_NAME);

    let config = load_config();
    let retry = Retry::new(
        Duration::from_millis(config.bootstrap_retry_ms),
        config.bootstrap_max_attempts,
    );
    wait_for_editor(config, retry);
}
