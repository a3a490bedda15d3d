//! [`Host`] adapter over the editor's page objects.
//!
//! The editor exposes its model on `window.W` and its map library on
//! `window.OpenLayers`. Several access paths exist for the same objects
//! across editor versions; each is tried in turn and a miss is reported
//! as "not available" rather than thrown.

use crate::js;
use js_sys::{Array, Function, Object, Reflect};
use polysnap_core::{
    BehaviorSpec, ControlProbe, FeatureProbe, GeometryKind, Host, HostError, HostResult,
    LayerCategory, LayerHandle, LayerId, LayerProbe,
};
use std::cell::RefCell;
use wasm_bindgen::{JsCast, JsValue};

const VECTOR_LAYER_CLASS: &str = "OpenLayers.Layer.Vector";

/// A raw map layer.
#[derive(Debug, Clone)]
pub struct JsLayer {
    id: LayerId,
    raw: JsValue,
}

impl JsLayer {
    fn from_raw(raw: JsValue) -> Self {
        let id = js::get_string(&raw, "name")
            .or_else(|| js::get_string(&raw, "id"))
            .unwrap_or_else(|| "unnamed".to_string());
        Self {
            id: LayerId::new(id),
            raw,
        }
    }

    pub fn raw(&self) -> &JsValue {
        &self.raw
    }
}

impl LayerHandle for JsLayer {
    fn layer_id(&self) -> LayerId {
        self.id.clone()
    }
}

/// A snapping control instance.
#[derive(Debug)]
pub struct JsBehavior {
    control: JsValue,
}

/// The editor's feature mappers wrap map layers; the raw layer carries a
/// `CLASS_NAME` and may sit at `wrapper.layer`.
fn raw_layer(obj: &JsValue) -> Option<JsValue> {
    if js::get(obj, "CLASS_NAME").is_some() {
        return Some(obj.clone());
    }
    let inner = js::get(obj, "layer")?;
    js::get(&inner, "CLASS_NAME").map(|_| inner)
}

fn probe(raw: JsValue) -> LayerProbe<JsLayer> {
    LayerProbe {
        vector: js::get_string(&raw, "CLASS_NAME").as_deref() == Some(VECTOR_LAYER_CLASS),
        visible: js::get_flag(&raw, "visibility"),
        base: js::get_flag(&raw, "isBaseLayer"),
        has_features: js::get(&raw, "features").is_some(),
        layer: JsLayer::from_raw(raw),
    }
}

fn feature_id(feature: &JsValue, index: usize) -> String {
    let id = js::call(feature, "getID", &[])
        .ok()
        .flatten()
        .or_else(|| js::get_path(feature, &["attributes", "id"]))
        .or_else(|| js::get(feature, "id"));
    match id {
        Some(id) => id
            .as_string()
            .or_else(|| id.as_f64().map(|n| n.to_string()))
            .unwrap_or_else(|| format!("#{}", index)),
        None => format!("#{}", index),
    }
}

fn feature_probe(feature: &JsValue, index: usize) -> FeatureProbe {
    let type_tag = js::call(feature, "getType", &[])
        .ok()
        .flatten()
        .and_then(|v| v.as_string());
    let geometry = js::call(feature, "getGeometry", &[])
        .ok()
        .flatten()
        .or_else(|| js::get(feature, "geometry"));
    let geometry_kind = geometry
        .as_ref()
        .and_then(|g| js::get_string(g, "type"))
        .and_then(|name| GeometryKind::from_type_name(&name));
    let geometry_class = geometry.as_ref().and_then(|g| js::get_string(g, "CLASS_NAME"));

    FeatureProbe {
        id: feature_id(feature, index),
        type_tag,
        geometry_kind,
        geometry_class,
    }
}

fn host_error(context: &str, err: JsValue) -> HostError {
    HostError::Other(format!("{}: {}", context, js::describe(&err)))
}

fn activation_error(context: &str, err: JsValue) -> HostError {
    HostError::Activation(format!("{}: {}", context, js::describe(&err)))
}

/// Live editor page.
pub struct JsHost {
    /// `window.W`.
    w: JsValue,
    /// `window.OpenLayers`.
    ol: JsValue,
    /// Raw objects behind the last selection probe, by feature id.
    selected: RefCell<Vec<(String, JsValue)>>,
}

impl JsHost {
    /// Connect to the page once the editor has loaded.
    pub fn connect() -> HostResult<Self> {
        let global: JsValue = js_sys::global().into();
        let win = js::get(&global, "unsafeWindow").unwrap_or(global);

        let w = js::get(&win, "W").ok_or_else(|| HostError::Unavailable("W".to_string()))?;
        let ol = js::get(&win, "OpenLayers")
            .ok_or_else(|| HostError::Unavailable("OpenLayers".to_string()))?;

        let ready = js::get_path(&w, &["map"]).is_some_and(|map| js::has_method(&map, "getWazeMap"))
            && js::get(&w, "model").is_some()
            && js::get(&w, "editingMediator").is_some()
            && js::get(&w, "selectionManager").is_some()
            && js::get_path(&ol, &["Control", "Snapping"]).is_some();
        if !ready {
            return Err(HostError::Unavailable("editor object model".to_string()));
        }

        let has_map_element = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.query_selector("#WazeMap").ok().flatten())
            .is_some();
        if !has_map_element {
            return Err(HostError::Unavailable("#WazeMap".to_string()));
        }

        Ok(Self {
            w,
            ol,
            selected: RefCell::new(Vec::new()),
        })
    }

    fn map(&self) -> HostResult<JsValue> {
        js::get(&self.w, "map").ok_or_else(|| HostError::Unavailable("W.map".to_string()))
    }

    fn selection_manager(&self) -> HostResult<JsValue> {
        js::get(&self.w, "selectionManager")
            .ok_or_else(|| HostError::Unavailable("W.selectionManager".to_string()))
    }

    fn editing_mediator(&self) -> HostResult<JsValue> {
        js::get(&self.w, "editingMediator")
            .ok_or_else(|| HostError::Unavailable("W.editingMediator".to_string()))
    }

    /// The underlying OpenLayers map.
    pub fn ol_map(&self) -> Option<JsValue> {
        let map = js::get(&self.w, "map")?;
        let waze_map = js::call(&map, "getWazeMap", &[]).ok().flatten();
        if let Some(waze_map) = &waze_map {
            if let Ok(Some(ol_map)) = js::call(waze_map, "getOLMap", &[]) {
                return Some(ol_map);
            }
            if let Some(ol_map) = js::get(waze_map, "olMap") {
                return Some(ol_map);
            }
        }
        js::get_path(&map, &["wazeMap", "olMap"])
    }

    fn require_ol_map(&self) -> HostResult<JsValue> {
        self.ol_map()
            .ok_or_else(|| HostError::Unavailable("OpenLayers map".to_string()))
    }

    /// Number of layers on the map, for the startup log line.
    pub fn layer_count(&self) -> usize {
        self.ol_map()
            .and_then(|map| js::get(&map, "layers"))
            .map(|layers| js::elements(&layers).len())
            .unwrap_or(0)
    }

    /// Subscribe to selection changes. Returns false when the hook is absent.
    pub fn on_selection_changed(&self, callback: &Function) -> bool {
        let Ok(manager) = self.selection_manager() else {
            return false;
        };
        if !js::has_method(&manager, "addEventListener") {
            return false;
        }
        js::call(&manager, "addEventListener", &[JsValue::from_str("selectionchanged"), JsValue::from(callback.clone())])
            .is_ok()
    }

    /// Subscribe to editing-state changes. Returns false when the hook is absent.
    pub fn on_editing_changed(&self, callback: &Function) -> bool {
        let Ok(mediator) = self.editing_mediator() else {
            return false;
        };
        if !js::has_method(&mediator, "on") {
            return false;
        }
        js::call(&mediator, "on", &[JsValue::from_str("change"), JsValue::from(callback.clone())]).is_ok()
    }

    fn build_options(&self, spec: &BehaviorSpec<JsLayer>) -> Result<Object, JsValue> {
        let targets = Array::new();
        for target in &spec.targets {
            let entry = Object::new();
            js::set(&entry, "layer", target.layer.raw())?;
            js::set(&entry, "tolerance", &JsValue::from_f64(target.tolerance))?;
            js::set(&entry, "node", &JsValue::from_bool(target.node))?;
            js::set(&entry, "vertex", &JsValue::from_bool(target.vertex))?;
            js::set(&entry, "edge", &JsValue::from_bool(target.edge))?;
            targets.push(&entry);
        }

        let options = Object::new();
        js::set(&options, "layer", spec.editable.raw())?;
        js::set(&options, "targets", &targets)?;
        js::set(&options, "greedy", &JsValue::from_bool(spec.greedy))?;
        Ok(options)
    }
}

impl Host for JsHost {
    type Layer = JsLayer;
    type Behavior = JsBehavior;

    fn named_layer(&self, category: LayerCategory) -> HostResult<Option<LayerProbe<JsLayer>>> {
        let map = self.map()?;
        Ok(js::get(&map, category.host_property())
            .and_then(|obj| raw_layer(&obj))
            .map(probe))
    }

    fn layers(&self) -> HostResult<Vec<LayerProbe<JsLayer>>> {
        let ol_map = self.require_ol_map()?;
        let layers = js::get(&ol_map, "layers").ok_or_else(|| HostError::Missing("olMap.layers".to_string()))?;
        Ok(js::elements(&layers).into_iter().map(probe).collect())
    }

    fn sketch_layer(&self) -> HostResult<Option<JsLayer>> {
        let map = self.map()?;
        let sketch = js::call(&map, "getSketchLayer", &[])
            .map_err(|e| host_error("getSketchLayer", e))?
            .or_else(|| js::get(&map, "sketchLayer"));
        Ok(sketch.map(|obj| JsLayer::from_raw(raw_layer(&obj).unwrap_or(obj))))
    }

    fn is_drawing(&self) -> HostResult<Option<bool>> {
        let mediator = self.editing_mediator()?;
        if !js::has_method(&mediator, "isDrawing") {
            return Ok(None);
        }
        let drawing = js::call(&mediator, "isDrawing", &[]).map_err(|e| host_error("isDrawing", e))?;
        Ok(Some(drawing.is_some_and(|v| v.is_truthy())))
    }

    fn controls(&self) -> HostResult<Vec<ControlProbe>> {
        let ol_map = self.require_ol_map()?;
        let Some(controls) = js::get(&ol_map, "controls") else {
            return Ok(Vec::new());
        };
        Ok(js::elements(&controls)
            .iter()
            .map(|control| ControlProbe {
                class_name: js::get_string(control, "CLASS_NAME").unwrap_or_default(),
                active: js::get_flag(control, "active"),
            })
            .collect())
    }

    fn selection(&self) -> HostResult<Vec<FeatureProbe>> {
        let manager = self.selection_manager()?;
        let selected = match js::call(&manager, "getSelectedDataModelObjects", &[])
            .map_err(|e| host_error("getSelectedDataModelObjects", e))?
        {
            Some(selected) => selected,
            None => js::call(&manager, "getSelectedFeatures", &[])
                .map_err(|e| host_error("getSelectedFeatures", e))?
                .unwrap_or(JsValue::UNDEFINED),
        };

        let features = js::elements(&selected);
        let probes: Vec<_> = features
            .iter()
            .enumerate()
            .map(|(index, feature)| feature_probe(feature, index))
            .collect();

        *self.selected.borrow_mut() = probes
            .iter()
            .map(|p| p.id.clone())
            .zip(features)
            .collect();

        Ok(probes)
    }

    fn owning_layer(&self, feature: &FeatureProbe) -> HostResult<Option<JsLayer>> {
        let raw_feature = self
            .selected
            .borrow()
            .iter()
            .find(|(id, _)| *id == feature.id)
            .map(|(_, raw)| raw.clone())
            .ok_or_else(|| HostError::Missing(format!("selected feature {}", feature.id)))?;

        let manager = self.selection_manager()?;
        let layer = js::call(&manager, "getLayerFromModel", &[raw_feature])
            .map_err(|e| host_error("getLayerFromModel", e))?;
        Ok(layer.map(|obj| JsLayer::from_raw(raw_layer(&obj).unwrap_or(obj))))
    }

    fn create_behavior(&mut self, spec: &BehaviorSpec<JsLayer>) -> HostResult<JsBehavior> {
        let ctor = js::get_path(&self.ol, &["Control", "Snapping"])
            .and_then(|v| v.dyn_into::<Function>().ok())
            .ok_or_else(|| HostError::Missing("OpenLayers.Control.Snapping".to_string()))?;

        let options = self
            .build_options(spec)
            .map_err(|e| activation_error("snapping options", e))?;
        let control = Reflect::construct(&ctor, &Array::of1(&options))
            .map_err(|e| activation_error("new OpenLayers.Control.Snapping", e))?;

        let precedence: Array = spec
            .precedence
            .iter()
            .map(|kind| JsValue::from_str(kind.as_str()))
            .collect();
        js::set(&control, "precedence", &precedence)
            .map_err(|e| activation_error("snapping precedence", e))?;

        Ok(JsBehavior { control })
    }

    fn activate_behavior(&mut self, behavior: &JsBehavior) -> HostResult<()> {
        let ol_map = self.require_ol_map()?;
        js::call(&ol_map, "addControl", &[behavior.control.clone()])
            .map_err(|e| activation_error("addControl", e))?;
        js::call(&behavior.control, "activate", &[]).map_err(|e| activation_error("activate", e))?;
        Ok(())
    }

    fn deactivate_behavior(&mut self, behavior: &JsBehavior) -> HostResult<()> {
        js::call(&behavior.control, "deactivate", &[]).map_err(|e| host_error("deactivate", e))?;
        Ok(())
    }

    fn remove_behavior(&mut self, behavior: &JsBehavior) -> HostResult<()> {
        let ol_map = self.require_ol_map()?;
        js::call(&ol_map, "removeControl", &[behavior.control.clone()])
            .map_err(|e| host_error("removeControl", e))?;
        Ok(())
    }

    fn destroy_behavior(&mut self, behavior: JsBehavior) -> HostResult<()> {
        js::call(&behavior.control, "destroy", &[]).map_err(|e| host_error("destroy", e))?;
        Ok(())
    }
}
