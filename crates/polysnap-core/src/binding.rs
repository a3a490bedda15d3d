//! Snap binding slots.
//!
//! A binding ties one snapping behavior to one editable layer. There is
//! one slot per [`BindingKind`], so at most one draw binding and at most
//! one modify binding can be alive. Only [`BindingManager`] creates or
//! releases behaviors.

use crate::host::{BehaviorSpec, Host, LayerHandle, LayerId, SNAP_PRECEDENCE, SnapTargetSpec};
use std::fmt;

/// The two binding slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Snapping while drawing a new polygon on the sketch layer.
    Draw,
    /// Snapping while dragging vertices of a selected polygon.
    Modify,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Draw => f.write_str("draw"),
            BindingKind::Modify => f.write_str("modify"),
        }
    }
}

/// An active attachment of a snapping behavior to an editable layer.
pub struct SnapBinding<H: Host> {
    kind: BindingKind,
    layer: H::Layer,
    behavior: H::Behavior,
}

impl<H: Host> SnapBinding<H> {
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn layer_id(&self) -> LayerId {
        self.layer.layer_id()
    }

    pub fn behavior(&self) -> &H::Behavior {
        &self.behavior
    }
}

impl<H: Host> fmt::Debug for SnapBinding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapBinding")
            .field("kind", &self.kind)
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

/// Committed binding state, as seen by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingState {
    /// Layer of the draw binding, if attached.
    pub draw: Option<LayerId>,
    /// Layer of the modify binding, if attached.
    pub modify: Option<LayerId>,
}

/// Owns the draw and modify binding slots.
pub struct BindingManager<H: Host> {
    draw: Option<SnapBinding<H>>,
    modify: Option<SnapBinding<H>>,
}

impl<H: Host> Default for BindingManager<H> {
    fn default() -> Self {
        Self {
            draw: None,
            modify: None,
        }
    }
}

impl<H: Host> fmt::Debug for BindingManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingManager")
            .field("draw", &self.draw)
            .field("modify", &self.modify)
            .finish()
    }
}

impl<H: Host> BindingManager<H> {
    /// Create a manager with both slots empty.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: BindingKind) -> &Option<SnapBinding<H>> {
        match kind {
            BindingKind::Draw => &self.draw,
            BindingKind::Modify => &self.modify,
        }
    }

    fn slot_mut(&mut self, kind: BindingKind) -> &mut Option<SnapBinding<H>> {
        match kind {
            BindingKind::Draw => &mut self.draw,
            BindingKind::Modify => &mut self.modify,
        }
    }

    /// Get the binding of a kind, if attached.
    pub fn get(&self, kind: BindingKind) -> Option<&SnapBinding<H>> {
        self.slot(kind).as_ref()
    }

    pub fn is_attached(&self, kind: BindingKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Identity of the layer a binding is attached to.
    pub fn bound_layer(&self, kind: BindingKind) -> Option<LayerId> {
        self.get(kind).map(SnapBinding::layer_id)
    }

    /// Number of live bindings (0, 1 or 2).
    pub fn live_count(&self) -> usize {
        usize::from(self.draw.is_some()) + usize::from(self.modify.is_some())
    }

    pub fn state(&self) -> BindingState {
        BindingState {
            draw: self.bound_layer(BindingKind::Draw),
            modify: self.bound_layer(BindingKind::Modify),
        }
    }

    /// Attach a snapping behavior to `editable`.
    ///
    /// Returns the existing binding unchanged when the slot is occupied.
    /// Returns `None`, after logging a warning, when `targets` is empty or
    /// the host fails to build or activate the behavior.
    pub fn attach(
        &mut self,
        host: &mut H,
        kind: BindingKind,
        editable: H::Layer,
        targets: Vec<SnapTargetSpec<H::Layer>>,
    ) -> Option<&SnapBinding<H>> {
        if self.slot(kind).is_some() {
            return self.slot(kind).as_ref();
        }

        if targets.is_empty() {
            log::warn!("No target layers found for {} snapping", kind);
            return None;
        }

        let spec = BehaviorSpec {
            editable,
            targets,
            precedence: SNAP_PRECEDENCE,
            greedy: false,
        };

        let behavior = match host.create_behavior(&spec) {
            Ok(behavior) => behavior,
            Err(e) => {
                log::warn!("Failed to create {} snapping control: {}", kind, e);
                return None;
            }
        };

        if let Err(e) = host.activate_behavior(&behavior) {
            log::warn!("Failed to activate {} snapping control: {}", kind, e);
            release(host, kind, behavior);
            return None;
        }

        let binding = SnapBinding {
            kind,
            layer: spec.editable,
            behavior,
        };
        log::info!(
            "{} snapping activated on {} ({} targets)",
            kind,
            binding.layer_id(),
            spec.targets.len()
        );

        *self.slot_mut(kind) = Some(binding);
        self.slot(kind).as_ref()
    }

    /// Release the binding of a kind. Safe to call when none exists.
    ///
    /// Returns the layer the released binding was attached to.
    pub fn detach(&mut self, host: &mut H, kind: BindingKind) -> Option<LayerId> {
        let binding = self.slot_mut(kind).take()?;
        let layer = binding.layer_id();
        release(host, kind, binding.behavior);
        log::info!("{} snapping deactivated on {}", kind, layer);
        Some(layer)
    }

    /// Detach, then attach to a new editable layer.
    pub fn rebind(
        &mut self,
        host: &mut H,
        kind: BindingKind,
        editable: H::Layer,
        targets: Vec<SnapTargetSpec<H::Layer>>,
    ) -> Option<&SnapBinding<H>> {
        self.detach(host, kind);
        self.attach(host, kind, editable, targets)
    }

    /// Release both bindings.
    pub fn detach_all(&mut self, host: &mut H) {
        self.detach(host, BindingKind::Draw);
        self.detach(host, BindingKind::Modify);
    }
}

/// Deactivate, deregister and destroy a behavior. Each step is attempted
/// even if an earlier one fails.
fn release<H: Host>(host: &mut H, kind: BindingKind, behavior: H::Behavior) {
    if let Err(e) = host.deactivate_behavior(&behavior) {
        log::debug!("Deactivating {} snapping control: {}", kind, e);
    }
    if let Err(e) = host.remove_behavior(&behavior) {
        log::debug!("Removing {} snapping control: {}", kind, e);
    }
    if let Err(e) = host.destroy_behavior(behavior) {
        log::debug!("Destroying {} snapping control: {}", kind, e);
    }
}
