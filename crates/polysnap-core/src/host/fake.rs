//! In-memory host implementation.

use super::{
    BehaviorSpec, ControlProbe, FeatureProbe, Host, HostError, HostResult, LayerId, LayerProbe,
};
use crate::config::LayerCategory;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Behavior handle handed out by [`FakeHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeBehavior {
    pub id: u64,
    pub editable: LayerId,
    pub targets: Vec<LayerId>,
}

/// Host calls recorded by [`FakeHost`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Create(u64),
    Activate(u64),
    Deactivate(u64),
    Remove(u64),
    Destroy(u64),
}

/// Scriptable host for testing and ephemeral use.
///
/// Tracks every behavior it creates so callers can check that nothing
/// stays registered or alive after it should have been released.
#[derive(Debug, Default)]
pub struct FakeHost {
    named: HashMap<LayerCategory, LayerProbe<LayerId>>,
    named_lookup_fails: bool,
    failing_categories: HashSet<LayerCategory>,
    layer_scan_fails: bool,
    layers: Vec<LayerProbe<LayerId>>,
    sketch: Option<LayerId>,
    drawing: Option<bool>,
    controls: Vec<ControlProbe>,
    selection: Vec<FeatureProbe>,
    owners: HashMap<String, LayerId>,
    selection_fails: bool,
    create_fails: bool,
    activation_fails: bool,
    next_behavior: u64,
    live: BTreeMap<u64, FakeBehavior>,
    registered: BTreeSet<u64>,
    active: BTreeSet<u64>,
    calls: Vec<HostCall>,
}

impl FakeHost {
    /// Create an empty host: no layers, no selection, not drawing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with a sketch layer and one named venue layer, the minimum for
    /// both binding kinds to attach.
    pub fn with_venues() -> Self {
        let mut host = Self::new();
        host.set_sketch_layer(Some("sketch"));
        host.set_named_layer(LayerCategory::Venues, LayerProbe::vector(LayerId::from("venues")));
        host
    }

    pub fn set_named_layer(&mut self, category: LayerCategory, probe: LayerProbe<LayerId>) {
        self.named.insert(category, probe);
    }

    /// Make every named-layer lookup return an error.
    pub fn fail_named_lookups(&mut self, fail: bool) {
        self.named_lookup_fails = fail;
    }

    /// Make the lookup for one category return an error.
    pub fn fail_named_lookup(&mut self, category: LayerCategory) {
        self.failing_categories.insert(category);
    }

    /// Make the generic layer list return an error.
    pub fn fail_layer_scan(&mut self, fail: bool) {
        self.layer_scan_fails = fail;
    }

    /// Add a layer to the map's generic layer list.
    pub fn add_layer(&mut self, probe: LayerProbe<LayerId>) {
        self.layers.push(probe);
    }

    pub fn set_sketch_layer(&mut self, id: Option<&str>) {
        self.sketch = id.map(LayerId::from);
    }

    /// Set the direct drawing capability; `None` removes it.
    pub fn set_drawing(&mut self, drawing: Option<bool>) {
        self.drawing = drawing;
    }

    pub fn add_control(&mut self, class_name: &str, active: bool) {
        self.controls.push(ControlProbe {
            class_name: class_name.to_string(),
            active,
        });
    }

    /// Replace the selection.
    pub fn select(&mut self, features: Vec<FeatureProbe>) {
        self.selection = features;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn fail_selection(&mut self, fail: bool) {
        self.selection_fails = fail;
    }

    /// Record which layer owns a feature.
    pub fn set_owner(&mut self, feature_id: &str, layer: &str) {
        self.owners.insert(feature_id.to_string(), LayerId::from(layer));
    }

    pub fn fail_create(&mut self, fail: bool) {
        self.create_fails = fail;
    }

    pub fn fail_activation(&mut self, fail: bool) {
        self.activation_fails = fail;
    }

    /// Behaviors created and not yet destroyed.
    pub fn live_behaviors(&self) -> usize {
        self.live.len()
    }

    /// Behaviors currently in the host control list.
    pub fn registered_behaviors(&self) -> usize {
        self.registered.len()
    }

    /// Behaviors currently active, in creation order.
    pub fn active_behaviors(&self) -> Vec<&FakeBehavior> {
        self.active.iter().filter_map(|id| self.live.get(id)).collect()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Host for FakeHost {
    type Layer = LayerId;
    type Behavior = FakeBehavior;

    fn named_layer(&self, category: LayerCategory) -> HostResult<Option<LayerProbe<LayerId>>> {
        if self.named_lookup_fails || self.failing_categories.contains(&category) {
            return Err(HostError::Missing(category.host_property().to_string()));
        }
        Ok(self.named.get(&category).cloned())
    }

    fn layers(&self) -> HostResult<Vec<LayerProbe<LayerId>>> {
        if self.layer_scan_fails {
            return Err(HostError::Other("map layer list unavailable".to_string()));
        }
        Ok(self.layers.clone())
    }

    fn sketch_layer(&self) -> HostResult<Option<LayerId>> {
        Ok(self.sketch.clone())
    }

    fn is_drawing(&self) -> HostResult<Option<bool>> {
        Ok(self.drawing)
    }

    fn controls(&self) -> HostResult<Vec<ControlProbe>> {
        Ok(self.controls.clone())
    }

    fn selection(&self) -> HostResult<Vec<FeatureProbe>> {
        if self.selection_fails {
            return Err(HostError::Other("selection manager threw".to_string()));
        }
        Ok(self.selection.clone())
    }

    fn owning_layer(&self, feature: &FeatureProbe) -> HostResult<Option<LayerId>> {
        Ok(self.owners.get(&feature.id).cloned())
    }

    fn create_behavior(&mut self, spec: &BehaviorSpec<LayerId>) -> HostResult<FakeBehavior> {
        if self.create_fails {
            return Err(HostError::Activation("snapping control unavailable".to_string()));
        }
        self.next_behavior += 1;
        let behavior = FakeBehavior {
            id: self.next_behavior,
            editable: spec.editable.clone(),
            targets: spec.targets.iter().map(|t| t.layer.clone()).collect(),
        };
        self.live.insert(behavior.id, behavior.clone());
        self.calls.push(HostCall::Create(behavior.id));
        Ok(behavior)
    }

    fn activate_behavior(&mut self, behavior: &FakeBehavior) -> HostResult<()> {
        self.calls.push(HostCall::Activate(behavior.id));
        if self.activation_fails {
            return Err(HostError::Activation("addControl threw".to_string()));
        }
        self.registered.insert(behavior.id);
        self.active.insert(behavior.id);
        Ok(())
    }

    fn deactivate_behavior(&mut self, behavior: &FakeBehavior) -> HostResult<()> {
        self.calls.push(HostCall::Deactivate(behavior.id));
        self.active.remove(&behavior.id);
        Ok(())
    }

    fn remove_behavior(&mut self, behavior: &FakeBehavior) -> HostResult<()> {
        self.calls.push(HostCall::Remove(behavior.id));
        self.registered.remove(&behavior.id);
        Ok(())
    }

    fn destroy_behavior(&mut self, behavior: FakeBehavior) -> HostResult<()> {
        self.calls.push(HostCall::Destroy(behavior.id));
        self.live.remove(&behavior.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SNAP_PRECEDENCE, SnapTargetSpec};

    fn spec(editable: &str, target: &str) -> BehaviorSpec<LayerId> {
        BehaviorSpec {
            editable: LayerId::from(editable),
            targets: vec![SnapTargetSpec {
                layer: LayerId::from(target),
                tolerance: 12.0,
                node: true,
                vertex: true,
                edge: true,
            }],
            precedence: SNAP_PRECEDENCE,
            greedy: false,
        }
    }

    #[test]
    fn test_behavior_lifecycle_tracking() {
        let mut host = FakeHost::new();
        let behavior = host.create_behavior(&spec("sketch", "venues")).unwrap();
        assert_eq!(host.live_behaviors(), 1);
        assert_eq!(host.registered_behaviors(), 0);

        host.activate_behavior(&behavior).unwrap();
        assert_eq!(host.active_behaviors().len(), 1);
        assert_eq!(host.registered_behaviors(), 1);

        host.deactivate_behavior(&behavior).unwrap();
        host.remove_behavior(&behavior).unwrap();
        let id = behavior.id;
        host.destroy_behavior(behavior).unwrap();

        assert_eq!(host.live_behaviors(), 0);
        assert_eq!(host.registered_behaviors(), 0);
        assert_eq!(
            host.calls(),
            &[
                HostCall::Create(id),
                HostCall::Activate(id),
                HostCall::Deactivate(id),
                HostCall::Remove(id),
                HostCall::Destroy(id),
            ]
        );
    }

    #[test]
    fn test_failure_injection() {
        let mut host = FakeHost::with_venues();
        host.fail_named_lookup(LayerCategory::MapComments);
        assert!(host.named_layer(LayerCategory::Venues).is_ok());
        assert!(host.named_layer(LayerCategory::MapComments).is_err());

        host.fail_named_lookups(true);
        assert!(host.named_layer(LayerCategory::Venues).is_err());

        host.fail_layer_scan(true);
        assert!(host.layers().is_err());

        host.fail_activation(true);
        let behavior = host.create_behavior(&spec("sketch", "venues")).unwrap();
        assert!(matches!(host.activate_behavior(&behavior), Err(HostError::Activation(_))));
        assert_eq!(host.registered_behaviors(), 0);
    }
}
