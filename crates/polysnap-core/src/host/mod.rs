//! Host capability abstraction.
//!
//! The reconciliation core never talks to the map editor directly. It sees
//! the editor only through [`Host`]: layer queries, selection queries,
//! editing-state queries and snapping behavior lifecycle. One adapter
//! implements it against the live page; [`FakeHost`] implements it in
//! memory for tests.

mod fake;

pub use fake::{FakeHost, FakeBehavior, HostCall};

use crate::config::LayerCategory;
use std::fmt;
use thiserror::Error;

/// Host errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// Required host objects are not present yet.
    #[error("Host unavailable: {0}")]
    Unavailable(String),
    /// A named layer, property or capability does not exist.
    #[error("Missing: {0}")]
    Missing(String),
    /// Building or activating a snapping behavior failed.
    #[error("Activation failed: {0}")]
    Activation(String),
    #[error("Host error: {0}")]
    Other(String),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Stable identity of a host layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque handle to a host geometry layer, compared by identity only.
pub trait LayerHandle: Clone + fmt::Debug {
    fn layer_id(&self) -> LayerId;
}

impl LayerHandle for LayerId {
    fn layer_id(&self) -> LayerId {
        self.clone()
    }
}

/// A layer together with the attributes the resolver filters on.
#[derive(Debug, Clone)]
pub struct LayerProbe<L> {
    pub layer: L,
    /// Vector-capable (can hold snap geometry).
    pub vector: bool,
    pub visible: bool,
    /// Base (background tile) layer.
    pub base: bool,
    /// Has a feature set.
    pub has_features: bool,
}

impl<L> LayerProbe<L> {
    /// A visible, non-base vector layer with features.
    pub fn vector(layer: L) -> Self {
        Self {
            layer,
            vector: true,
            visible: true,
            base: false,
            has_features: true,
        }
    }
}

/// An interaction control registered with the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlProbe {
    pub class_name: String,
    pub active: bool,
}

/// Kind of geometry a feature reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
    Other,
}

impl GeometryKind {
    pub fn is_polygon(self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }

    /// Parse a geometry type name such as "Polygon" or "multipolygon".
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let kind = match name.as_str() {
            "" => return None,
            "point" | "multipoint" => GeometryKind::Point,
            "linestring" | "multilinestring" | "linearring" => GeometryKind::LineString,
            "polygon" => GeometryKind::Polygon,
            "multipolygon" => GeometryKind::MultiPolygon,
            other if other.contains("polygon") => GeometryKind::Polygon,
            _ => GeometryKind::Other,
        };
        Some(kind)
    }
}

/// A selected feature as far as the mode detector can see it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureProbe {
    /// Feature id, used for owning-layer lookups.
    pub id: String,
    /// Explicit type tag (e.g. "venue"), when the host provides one.
    pub type_tag: Option<String>,
    pub geometry_kind: Option<GeometryKind>,
    /// Geometry class name (e.g. "OpenLayers.Geometry.Polygon").
    pub geometry_class: Option<String>,
}

impl FeatureProbe {
    pub fn tagged(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: Some(tag.into()),
            ..Default::default()
        }
    }
}

/// Geometry kinds a snapping behavior can snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapKind {
    Node,
    Vertex,
    Edge,
}

impl SnapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapKind::Node => "node",
            SnapKind::Vertex => "vertex",
            SnapKind::Edge => "edge",
        }
    }
}

/// Tie-break order when the cursor is within tolerance of several kinds.
/// Corners beat mid-edge positions.
pub const SNAP_PRECEDENCE: [SnapKind; 3] = [SnapKind::Node, SnapKind::Vertex, SnapKind::Edge];

/// One snap target: a layer plus tolerance and eligible geometry kinds.
#[derive(Debug, Clone)]
pub struct SnapTargetSpec<L> {
    pub layer: L,
    /// Tolerance in pixels.
    pub tolerance: f64,
    pub node: bool,
    pub vertex: bool,
    pub edge: bool,
}

/// Everything the host needs to build a snapping behavior.
#[derive(Debug, Clone)]
pub struct BehaviorSpec<L> {
    pub editable: L,
    pub targets: Vec<SnapTargetSpec<L>>,
    pub precedence: [SnapKind; 3],
    /// Snap to the first candidate found rather than the closest.
    pub greedy: bool,
}

/// Capabilities the reconciliation core consumes from the map editor.
///
/// Query methods report failure through [`HostResult`]; callers treat any
/// error as "that path does not apply". Release methods are best-effort
/// and are always called in order deactivate, remove, destroy.
pub trait Host {
    type Layer: LayerHandle;
    type Behavior;

    /// Look up the named layer for a category.
    fn named_layer(&self, category: LayerCategory) -> HostResult<Option<LayerProbe<Self::Layer>>>;

    /// Every layer currently on the map.
    fn layers(&self) -> HostResult<Vec<LayerProbe<Self::Layer>>>;

    /// The layer receiving new-feature drawing.
    fn sketch_layer(&self) -> HostResult<Option<Self::Layer>>;

    /// Direct "is a draw interaction active" capability. `None` when the
    /// host does not provide it.
    fn is_drawing(&self) -> HostResult<Option<bool>>;

    /// Interaction controls registered with the map.
    fn controls(&self) -> HostResult<Vec<ControlProbe>>;

    /// Currently selected features.
    fn selection(&self) -> HostResult<Vec<FeatureProbe>>;

    /// The layer a selected feature belongs to.
    fn owning_layer(&self, feature: &FeatureProbe) -> HostResult<Option<Self::Layer>>;

    fn create_behavior(&mut self, spec: &BehaviorSpec<Self::Layer>) -> HostResult<Self::Behavior>;

    /// Register the behavior with the host control list and activate it.
    fn activate_behavior(&mut self, behavior: &Self::Behavior) -> HostResult<()>;

    fn deactivate_behavior(&mut self, behavior: &Self::Behavior) -> HostResult<()>;

    /// Deregister the behavior from the host control list.
    fn remove_behavior(&mut self, behavior: &Self::Behavior) -> HostResult<()>;

    fn destroy_behavior(&mut self, behavior: Self::Behavior) -> HostResult<()>;
}
