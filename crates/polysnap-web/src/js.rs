//! Small helpers for reading duck-typed page objects.

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

fn is_nullish(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// `target[key]`, or `None` when the target or the property is nullish or
/// the lookup throws.
pub fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    if is_nullish(target) {
        return None;
    }
    let value = Reflect::get(target, &JsValue::from_str(key)).ok()?;
    if is_nullish(&value) { None } else { Some(value) }
}

/// Follow a chain of properties.
pub fn get_path(target: &JsValue, path: &[&str]) -> Option<JsValue> {
    path.iter()
        .try_fold(target.clone(), |value, key| get(&value, key))
}

pub fn get_string(target: &JsValue, key: &str) -> Option<String> {
    get(target, key)?.as_string()
}

/// Truthiness of `target[key]`; missing reads as false.
pub fn get_flag(target: &JsValue, key: &str) -> bool {
    get(target, key).is_some_and(|v| v.is_truthy())
}

pub fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

/// Call `target[method](...args)` when it is a function.
///
/// `Ok(None)` means the method does not exist or returned a nullish value;
/// `Err` carries whatever the call threw.
pub fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<Option<JsValue>, JsValue> {
    let Some(func) = get(target, method) else {
        return Ok(None);
    };
    let Some(func) = func.dyn_ref::<Function>() else {
        return Ok(None);
    };
    let argv: Array = args.iter().collect();
    let result = Reflect::apply(func, target, &argv)?;
    Ok(if is_nullish(&result) { None } else { Some(result) })
}

/// Whether `target[method]` is callable.
pub fn has_method(target: &JsValue, method: &str) -> bool {
    get(target, method).is_some_and(|v| v.is_function())
}

/// Elements of an array-like value; anything else is empty.
pub fn elements(value: &JsValue) -> Vec<JsValue> {
    if Array::is_array(value) {
        Array::from(value).iter().collect()
    } else {
        Vec::new()
    }
}

/// Readable form of a thrown value.
pub fn describe(err: &JsValue) -> String {
    if let Some(message) = get_string(err, "message") {
        return message;
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
