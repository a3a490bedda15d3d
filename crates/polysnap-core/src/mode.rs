//! Editing mode detection.

use crate::config::LayerCategory;
use crate::host::{FeatureProbe, Host, LayerHandle, LayerId};

/// Class-name fragment identifying an active draw-new-feature control.
pub const DRAW_CONTROL_MARKER: &str = "DrawFeature";

/// The editor's interaction state as inferred from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode<L> {
    Idle,
    /// A new polygon is being drawn.
    Drawing,
    /// A single polygon is selected; `L` is its owning layer.
    Modifying(L),
}

impl<L: LayerHandle> Mode<L> {
    /// The modify layer's identity, if modifying.
    pub fn modify_layer_id(&self) -> Option<LayerId> {
        match self {
            Mode::Modifying(layer) => Some(layer.layer_id()),
            _ => None,
        }
    }
}

/// Decide whether a feature is a polygon.
///
/// An explicit type tag wins. Without one, the geometry kind decides, and
/// without that the geometry class name must mention "polygon".
pub fn is_polygon_feature(feature: &FeatureProbe) -> bool {
    if let Some(tag) = feature.type_tag.as_deref() {
        if !tag.is_empty() {
            return LayerCategory::from_feature_type(tag).is_some();
        }
    }
    if let Some(kind) = feature.geometry_kind {
        return kind.is_polygon();
    }
    feature
        .geometry_class
        .as_deref()
        .is_some_and(|class| class.to_lowercase().contains("polygon"))
}

/// Check whether a draw-new-feature interaction is active.
pub fn is_drawing<H: Host>(host: &H) -> bool {
    if let Ok(Some(true)) = host.is_drawing() {
        return true;
    }
    match host.controls() {
        Ok(controls) => controls
            .iter()
            .any(|c| c.active && c.class_name.contains(DRAW_CONTROL_MARKER)),
        Err(_) => false,
    }
}

/// The owning layer of the single selected polygon, if there is one.
pub fn selected_polygon_layer<H: Host>(host: &H) -> Option<H::Layer> {
    let selection = host.selection().ok()?;
    let [feature] = selection.as_slice() else {
        return None;
    };
    if !is_polygon_feature(feature) {
        return None;
    }
    host.owning_layer(feature).ok().flatten()
}

/// Sample the current mode. Never fails; uncertainty reads as Idle.
pub fn detect_mode<H: Host>(host: &H) -> Mode<H::Layer> {
    if is_drawing(host) {
        return Mode::Drawing;
    }
    match selected_polygon_layer(host) {
        Some(layer) => Mode::Modifying(layer),
        None => Mode::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FakeHost, GeometryKind};

    fn polygon(id: &str) -> FeatureProbe {
        FeatureProbe::tagged(id, "venue")
    }

    #[test]
    fn test_idle_by_default() {
        let host = FakeHost::new();
        assert_eq!(detect_mode(&host), Mode::Idle);
    }

    #[test]
    fn test_direct_drawing_capability() {
        let mut host = FakeHost::new();
        host.set_drawing(Some(true));
        assert_eq!(detect_mode(&host), Mode::Drawing);
    }

    #[test]
    fn test_drawing_from_active_controls() {
        let mut host = FakeHost::new();
        host.set_drawing(Some(false));
        host.add_control("OpenLayers.Control.DrawFeature", false);
        assert_eq!(detect_mode(&host), Mode::Idle);

        host.add_control("OpenLayers.Control.DrawFeature", true);
        assert_eq!(detect_mode(&host), Mode::Drawing);
    }

    #[test]
    fn test_drawing_wins_over_selection() {
        let mut host = FakeHost::new();
        host.select(vec![polygon("v1")]);
        host.set_owner("v1", "venues");
        host.set_drawing(Some(true));
        assert_eq!(detect_mode(&host), Mode::Drawing);
    }

    #[test]
    fn test_single_polygon_selection() {
        let mut host = FakeHost::new();
        host.select(vec![polygon("v1")]);
        host.set_owner("v1", "venues");
        assert_eq!(detect_mode(&host), Mode::Modifying(LayerId::from("venues")));
        assert_eq!(
            detect_mode(&host).modify_layer_id(),
            Some(LayerId::from("venues"))
        );
    }

    #[test]
    fn test_multi_selection_is_idle() {
        let mut host = FakeHost::new();
        host.select(vec![polygon("v1"), polygon("v2")]);
        host.set_owner("v1", "venues");
        host.set_owner("v2", "venues");
        assert_eq!(detect_mode(&host), Mode::Idle);
    }

    #[test]
    fn test_non_polygon_selection_is_idle() {
        let mut host = FakeHost::new();
        host.select(vec![FeatureProbe::tagged("s1", "segment")]);
        host.set_owner("s1", "roads");
        assert_eq!(detect_mode(&host), Mode::Idle);
    }

    #[test]
    fn test_missing_owner_is_idle() {
        let mut host = FakeHost::new();
        host.select(vec![polygon("v1")]);
        assert_eq!(detect_mode(&host), Mode::Idle);
    }

    #[test]
    fn test_selection_failure_is_idle() {
        let mut host = FakeHost::new();
        host.select(vec![polygon("v1")]);
        host.set_owner("v1", "venues");
        host.fail_selection(true);
        assert_eq!(detect_mode(&host), Mode::Idle);
    }

    #[test]
    fn test_polygon_classification() {
        assert!(is_polygon_feature(&FeatureProbe::tagged("a", "mapComment")));
        assert!(!is_polygon_feature(&FeatureProbe::tagged("a", "node")));

        let by_kind = FeatureProbe {
            id: "b".into(),
            geometry_kind: Some(GeometryKind::MultiPolygon),
            ..Default::default()
        };
        assert!(is_polygon_feature(&by_kind));

        let line = FeatureProbe {
            id: "c".into(),
            geometry_kind: Some(GeometryKind::LineString),
            geometry_class: Some("OpenLayers.Geometry.Polygon".into()),
            ..Default::default()
        };
        assert!(!is_polygon_feature(&line));

        let by_class = FeatureProbe {
            id: "d".into(),
            geometry_class: Some("OpenLayers.Geometry.Polygon".into()),
            ..Default::default()
        };
        assert!(is_polygon_feature(&by_class));

        assert!(!is_polygon_feature(&FeatureProbe::default()));
    }
}
