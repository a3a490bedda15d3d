//! Timer and notification wiring around the engine.

use crate::host::JsHost;
use crate::web::set_timeout;
use polysnap_core::{SnapEngine, Transition};
use std::cell::RefCell;
use std::rc::Rc;
use js_sys::Function;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_time::{Duration, Instant};

const BUSY_RETRY: Duration = Duration::from_millis(10);

/// The engine shared by timers, hooks and the toggle button.
pub type SharedEngine = Rc<RefCell<SnapEngine<JsHost>>>;

fn log_transitions(transitions: &[Transition]) {
    for transition in transitions {
        log::debug!("{:?}", transition);
    }
}

/// Run a pass if one is due. A firing that lands while another callback
/// holds the engine is skipped; the schedule still has it pending.
fn pump(engine: &SharedEngine) {
    let Ok(mut engine) = engine.try_borrow_mut() else {
        log::debug!("Reconciliation in progress, skipping timer");
        return;
    };
    if let Some((trigger, transitions)) = engine.pump(Instant::now()) {
        if !transitions.is_empty() {
            log::debug!("{:?} pass", trigger);
        }
        log_transitions(&transitions);
    }
}

/// Poll loop: pump, then sleep until the schedule's next deadline.
fn poll_loop(engine: SharedEngine) {
    pump(&engine);
    let delay = engine
        .try_borrow()
        .map(|engine| engine.next_wake(Instant::now()))
        .unwrap_or(BUSY_RETRY);
    set_timeout(delay, move || poll_loop(engine));
}

/// Host notification: record it, then pump once the settle delay passes.
fn on_host_change(engine: &SharedEngine) {
    let debounce = {
        let Ok(mut guard) = engine.try_borrow_mut() else {
            log::debug!("Reconciliation in progress, dropping notification");
            return;
        };
        guard.notify(Instant::now());
        guard.config().debounce()
    };
    let engine = engine.clone();
    set_timeout(debounce, move || pump(&engine));
}

/// Create the engine and start the poll loop and notification hooks.
pub fn install(engine: SnapEngine<JsHost>) -> SharedEngine {
    let engine: SharedEngine = Rc::new(RefCell::new(engine));

    let on_change = {
        let engine = engine.clone();
        Closure::wrap(Box::new(move || on_host_change(&engine)) as Box<dyn Fn()>)
    };
    {
        let guard = engine.borrow();
        let callback: &Function = on_change.as_ref().unchecked_ref();
        if !guard.host().on_selection_changed(callback) {
            log::debug!("Selection change hook unavailable, polling only");
        }
        if !guard.host().on_editing_changed(callback) {
            log::debug!("Editing change hook unavailable, polling only");
        }
    }
    // Hooks stay registered for the page lifetime.
    on_change.forget();

    poll_loop(engine.clone());
    engine
}
