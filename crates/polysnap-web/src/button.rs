//! On/off toggle button.

use crate::runtime::SharedEngine;
use crate::style::{BASE_STYLE, BUTTON_GLYPH, BUTTON_ID, HOVER_STYLE, REST_STYLE, toggle_style};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

fn set_style(button: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = button.style().set_property(property, value) {
        log::debug!("Failed to set {}: {:?}", property, e);
    }
}

/// Apply the state-dependent style.
fn refresh(button: &HtmlElement, engine: &SharedEngine) {
    let Ok(engine) = engine.try_borrow() else {
        return;
    };
    let style = toggle_style(engine.toggle_state());
    set_style(button, "background", style.background);
    set_style(button, "border-color", style.border_color);
    set_style(button, "color", style.color);
    button.set_title(&style.title);
}

fn on_event(button: &HtmlElement, event: &str, handler: Box<dyn Fn()>) -> Result<(), JsValue> {
    let closure = Closure::wrap(handler);
    button.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // The button lives as long as the page.
    closure.forget();
    Ok(())
}

/// Create the toggle button unless it already exists.
pub fn install(document: &Document, engine: &SharedEngine) -> Result<(), JsValue> {
    if document.get_element_by_id(BUTTON_ID).is_some() {
        return Ok(());
    }

    let button: HtmlElement = document.create_element("button")?.dyn_into()?;
    button.set_id(BUTTON_ID);
    button.set_text_content(Some(BUTTON_GLYPH));
    for (property, value) in BASE_STYLE {
        set_style(&button, property, value);
    }

    let click = {
        let button = button.clone();
        let engine = engine.clone();
        Box::new(move || {
            match engine.try_borrow_mut() {
                Ok(mut engine) => {
                    for transition in engine.toggle() {
                        log::debug!("{:?}", transition);
                    }
                }
                Err(_) => {
                    log::debug!("Reconciliation in progress, ignoring click");
                    return;
                }
            }
            refresh(&button, &engine);
        }) as Box<dyn Fn()>
    };
    on_event(&button, "click", click)?;

    for (event, (opacity, transform)) in [("mouseenter", HOVER_STYLE), ("mouseleave", REST_STYLE)] {
        let target = button.clone();
        on_event(
            &button,
            event,
            Box::new(move || {
                set_style(&target, "opacity", opacity);
                set_style(&target, "transform", transform);
            }),
        )?;
    }

    refresh(&button, engine);
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    body.append_child(&button)?;
    Ok(())
}
