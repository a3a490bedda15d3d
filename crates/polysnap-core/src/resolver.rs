//! Snap target discovery.

use crate::config::SnapConfig;
use crate::host::{Host, LayerHandle, LayerId, LayerProbe, SnapTargetSpec};

fn target_spec<L>(layer: L, config: &SnapConfig) -> SnapTargetSpec<L> {
    SnapTargetSpec {
        layer,
        tolerance: config.tolerance,
        node: config.snap_to_nodes,
        vertex: config.snap_to_vertices,
        edge: config.snap_to_edges,
    }
}

fn is_excluded<L: LayerHandle>(layer: &L, exclude: Option<&LayerId>) -> bool {
    exclude.is_some_and(|id| layer.layer_id() == *id)
}

/// Whether a generic map layer qualifies for the fallback scan.
fn is_fallback_candidate<L: LayerHandle>(probe: &LayerProbe<L>, exclude: Option<&LayerId>) -> bool {
    probe.vector
        && probe.has_features
        && probe.visible
        && !probe.base
        && !is_excluded(&probe.layer, exclude)
}

/// Resolve the current snap targets.
///
/// Each enabled category's named layer is used when it exists, has a
/// feature set and is not `exclude`. A failed lookup only drops that
/// category. When no named layer resolves at all, every visible, non-base
/// vector layer on the map (except `exclude`) becomes a target, ignoring
/// the category flags.
pub fn resolve_targets<H: Host>(
    host: &H,
    config: &SnapConfig,
    exclude: Option<&LayerId>,
) -> Vec<SnapTargetSpec<H::Layer>> {
    let mut targets = Vec::new();

    for category in config.layers.enabled() {
        match host.named_layer(category) {
            Ok(Some(probe)) => {
                if probe.has_features && !is_excluded(&probe.layer, exclude) {
                    targets.push(target_spec(probe.layer, config));
                }
            }
            Ok(None) => {
                log::debug!("No {} layer on the map", category.config_key());
            }
            Err(e) => {
                log::debug!("Skipping {} layer: {}", category.config_key(), e);
            }
        }
    }

    if !targets.is_empty() {
        return targets;
    }

    let layers = match host.layers() {
        Ok(layers) => layers,
        Err(e) => {
            log::debug!("Layer scan failed: {}", e);
            return targets;
        }
    };

    targets.extend(
        layers
            .into_iter()
            .filter(|probe| is_fallback_candidate(probe, exclude))
            .map(|probe| target_spec(probe.layer, config)),
    );

    if !targets.is_empty() {
        log::info!("Using fallback layer scan, found {} vector layers", targets.len());
    }

    targets
}
