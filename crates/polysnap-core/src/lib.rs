//! PolySnap Core Library
//!
//! Keeps snapping behaviors bound to the right editable layer while a map
//! editor's user draws new polygons or edits existing ones. The map editor
//! is reached only through the [`Host`] trait.

pub mod binding;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod host;
pub mod mode;
pub mod reconcile;
pub mod resolver;
pub mod schedule;
pub mod toggle;

pub use binding::{BindingKind, BindingManager, BindingState, SnapBinding};
pub use bootstrap::{Retry, RetryDecision};
pub use config::{ConfigError, LayerCategory, LayerCategoryConfig, SnapConfig};
pub use engine::SnapEngine;
pub use host::{
    BehaviorSpec, ControlProbe, FakeHost, FeatureProbe, GeometryKind, Host, HostError, HostResult,
    LayerHandle, LayerId, LayerProbe, SNAP_PRECEDENCE, SnapKind, SnapTargetSpec,
};
pub use mode::{Mode, detect_mode};
pub use reconcile::{Plan, Step, Transition, plan};
pub use resolver::resolve_targets;
pub use schedule::{Schedule, Trigger};
pub use toggle::EnableToggle;
